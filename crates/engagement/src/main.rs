//! Sugarcane Engagement - Reviews service.
//!
//! Owns product reviews: submission, owner-only edits, admin moderation.
//! Serves on port 5003 by default.
//!
//! # Authorization
//!
//! Review submission requires authentication; edits and deletes are gated
//! on ownership; moderation is gated on the admin role. The guard order is
//! fixed: authenticate, then the predicate, then the mutation.

#![cfg_attr(not(test), forbid(unsafe_code))]

mod routes;

use sugarcane_api::{ServiceState, serve};
use sugarcane_store::config::ServiceConfig;
use sugarcane_store::db;

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = ServiceConfig::from_env("ENGAGEMENT", 5003).expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = serve::init_sentry(&config);

    serve::init_tracing("sugarcane_engagement=info,tower_http=debug");

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
