//! Shared helpers for Sugarcane integration tests.
//!
//! The tests in `tests/` drive the real services over HTTP. They require:
//! - A running `PostgreSQL` database with migrations applied
//!   (`sc-cli migrate`)
//! - All four services running (identity 5000, catalog 5001, commerce 5002,
//!   engagement 5003)
//!
//! Every test creates its own uniquely-named accounts and products, so the
//! suite can run repeatedly against the same database.

#![allow(clippy::missing_panics_doc)]

use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use uuid::Uuid;

/// Password used for every test account.
pub const TEST_PASSWORD: &str = "integration-pw-1";

/// Base URL for the identity service (configurable via environment).
#[must_use]
pub fn identity_base_url() -> String {
    std::env::var("IDENTITY_BASE_URL").unwrap_or_else(|_| "http://localhost:5000".to_string())
}

/// Base URL for the catalog service.
#[must_use]
pub fn catalog_base_url() -> String {
    std::env::var("CATALOG_BASE_URL").unwrap_or_else(|_| "http://localhost:5001".to_string())
}

/// Base URL for the commerce service.
#[must_use]
pub fn commerce_base_url() -> String {
    std::env::var("COMMERCE_BASE_URL").unwrap_or_else(|_| "http://localhost:5002".to_string())
}

/// Base URL for the engagement service.
#[must_use]
pub fn engagement_base_url() -> String {
    std::env::var("ENGAGEMENT_BASE_URL").unwrap_or_else(|_| "http://localhost:5003".to_string())
}

/// Create an HTTP client.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .build()
        .expect("Failed to create HTTP client")
}

/// A username no other test run will have used.
#[must_use]
pub fn unique_username(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::new_v4().simple())
}

/// Register an account with standard profile fields and return its JSON.
pub async fn register_account(http: &Client, username: &str, role: &str) -> Value {
    let response = http
        .post(format!("{}/accounts/register", identity_base_url()))
        .json(&json!({
            "fullname": "Integration Tester",
            "username": username,
            "password": TEST_PASSWORD,
            "age": 30,
            "address": "1 Test Lane",
            "gender": "other",
            "marital_status": "single",
            "role": role,
        }))
        .send()
        .await
        .expect("register request failed");

    assert_eq!(response.status().as_u16(), 201, "registration should succeed");
    response.json().await.expect("register response not JSON")
}

/// Credit an account's wallet; asserts success and returns the new balance.
pub async fn credit_account(http: &Client, username: &str, amount: &str) -> Decimal {
    let response = http
        .post(format!(
            "{}/accounts/{username}/credit",
            identity_base_url()
        ))
        .json(&json!({ "amount": amount }))
        .send()
        .await
        .expect("credit request failed");

    assert_eq!(response.status().as_u16(), 200, "credit should succeed");
    let body: Value = response.json().await.expect("credit response not JSON");
    decimal(&body["balance"])
}

/// Create a product as the given admin; asserts success and returns it.
pub async fn create_product(
    http: &Client,
    admin_username: &str,
    name: &str,
    price: &str,
    stock: i32,
) -> Value {
    let response = http
        .post(format!("{}/products", catalog_base_url()))
        .basic_auth(admin_username, Some(TEST_PASSWORD))
        .json(&json!({
            "name": name,
            "category": "test goods",
            "price": price,
            "description": "integration test product",
            "stock": stock,
        }))
        .send()
        .await
        .expect("create product request failed");

    assert_eq!(
        response.status().as_u16(),
        201,
        "product creation should succeed"
    );
    response.json().await.expect("product response not JSON")
}

/// Parse a decimal out of its string JSON encoding.
///
/// Compare decimals as [`Decimal`], never as strings: the store reports
/// `50` back as `50.00`.
#[must_use]
pub fn decimal(value: &Value) -> Decimal {
    value
        .as_str()
        .expect("expected a decimal encoded as string")
        .parse()
        .expect("invalid decimal string")
}

/// Shorthand for building an expected decimal.
#[must_use]
pub fn dec(s: &str) -> Decimal {
    s.parse().expect("invalid decimal literal")
}

/// The machine-readable error kind of an error response body.
#[must_use]
pub fn error_kind(body: &Value) -> &str {
    body["error"]["kind"]
        .as_str()
        .expect("expected error.kind in response body")
}
