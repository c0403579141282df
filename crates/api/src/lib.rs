//! Sugarcane API - Shared HTTP layer.
//!
//! The four service binaries (identity, catalog, commerce, engagement) are
//! thin: each contributes its routes and a main; everything they have in
//! common lives here.
//!
//! # Modules
//!
//! - [`error`] - The unified [`ApiError`] taxonomy and response mapping
//! - [`extract`] - Basic-auth credential extraction
//! - [`audit`] - The audit-interceptor middleware wrapped around every route
//! - [`state`] - Shared per-service state (config, pool, cipher, audit sink)
//! - [`health`] - Liveness/readiness endpoints
//! - [`serve`] - Tracing/Sentry bootstrap, router assembly, graceful shutdown

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod audit;
pub mod error;
pub mod extract;
pub mod health;
pub mod serve;
pub mod state;

pub use error::ApiError;
pub use extract::BasicAuth;
pub use state::ServiceState;
