//! Per-table repositories.
//!
//! Each repository borrows the service's pool (and, for accounts, the PII
//! cipher) and owns the SQL for one table. Cross-aggregate mutations do not
//! live here - those belong to [`crate::engine`].

pub mod accounts;
pub mod products;
pub mod reviews;

pub use accounts::AccountRepository;
pub use products::ProductRepository;
pub use reviews::ReviewRepository;
