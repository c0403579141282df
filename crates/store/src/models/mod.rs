//! Domain types for the shared store.
//!
//! These are validated domain objects, separate from database row types;
//! the repositories translate between the two (decrypting PII on the way
//! out, encrypting on the way in).

pub mod account;
pub mod product;
pub mod review;

pub use account::{Account, AccountUpdate, NewAccount};
pub use product::{NewProduct, Product, ProductUpdate};
pub use review::{NewReview, Review, ReviewDetails, ReviewUpdate};
