//! Sugarcane Identity - Account service.
//!
//! Owns account registration, profile management, and wallet credit/debit
//! against the shared store. Serves on port 5000 by default.
//!
//! # Security
//!
//! PII fields (fullname, address) never touch the store in plaintext; the
//! repository encrypts on write and decrypts on read. Secrets are hashed
//! with Argon2id before they leave the handler.

#![cfg_attr(not(test), forbid(unsafe_code))]

mod routes;

use sugarcane_api::{ServiceState, serve};
use sugarcane_store::config::ServiceConfig;
use sugarcane_store::db;

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config =
        ServiceConfig::from_env("IDENTITY", 5000).expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = serve::init_sentry(&config);

    serve::init_tracing("sugarcane_identity=info,tower_http=debug");

    // Initialize database connection pool
    let pool = db::create_pool(&config.store.database_url)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    // NOTE: Migrations are NOT run automatically on startup.
    // Run them explicitly via: cargo run -p sugarcane-cli -- migrate

    let state = ServiceState::new(config.clone(), pool)
        .await
        .expect("Failed to initialize application state");

    let app = serve::build_router(state, routes::routes());

    serve::serve(app, &config).await.expect("Server error");
}
