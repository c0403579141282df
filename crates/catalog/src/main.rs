//! Sugarcane Catalog - Inventory service.
//!
//! Owns the product catalog: adding, updating, and stocking products.
//! All mutations are admin-gated; reads are public. Serves on port 5001
//! by default.

#![cfg_attr(not(test), forbid(unsafe_code))]

mod routes;

use sugarcane_api::{ServiceState, serve};
use sugarcane_store::config::ServiceConfig;
use sugarcane_store::db;

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = ServiceConfig::from_env("CATALOG", 5001).expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = serve::init_sentry(&config);

    serve::init_tracing("sugarcane_catalog=info,tower_http=debug");

    // Initialize database connection pool
    let pool = db::create_pool(&config.store.database_url)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    let state = ServiceState::new(config.clone(), pool)
        .await
        .expect("Failed to initialize application state");

    let app = serve::build_router(state, routes::routes());

    serve::serve(app, &config).await.expect("Server error");
}
