//! HTTP route handlers for the identity service.
//!
//! # Route Structure
//!
//! ```text
//! POST   /accounts/register          - Register a new account
//! GET    /accounts                   - List all accounts (PII decrypted)
//! GET    /accounts/{username}        - Get one account
//! PUT    /accounts/{username}        - Partial profile update
//! DELETE /accounts/{username}        - Delete an account
//! POST   /accounts/{username}/credit - Add funds to the wallet
//! POST   /accounts/{username}/debit  - Remove funds from the wallet
//! ```

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use sugarcane_api::{ApiError, ServiceState};
use sugarcane_core::{Role, Username};
use sugarcane_store::access;
use sugarcane_store::db::RepositoryError;
use sugarcane_store::engine::TransactionEngine;
use sugarcane_store::models::{Account, AccountUpdate, NewAccount};
use sugarcane_store::repo::AccountRepository;

pub fn routes() -> Router<ServiceState> {
    Router::new()
        .route("/accounts/register", post(register))
        .route("/accounts", get(list_accounts))
        .route(
            "/accounts/{username}",
            get(get_account).put(update_account).delete(delete_account),
        )
        .route("/accounts/{username}/credit", post(credit))
        .route("/accounts/{username}/debit", post(debit))
}

/// Registration payload.
#[derive(Debug, Deserialize)]
struct RegisterRequest {
    fullname: String,
    username: String,
    password: String,
    age: i32,
    address: String,
    gender: String,
    marital_status: String,
    #[serde(default)]
    role: Role,
}

/// Wallet mutation payload.
#[derive(Debug, Deserialize)]
struct AmountRequest {
    amount: Decimal,
}

/// Wallet mutation result.
#[derive(Debug, Serialize)]
struct BalanceResponse {
    balance: Decimal,
}

/// Register a new account.
///
/// POST /accounts/register
async fn register(
    State(state): State<ServiceState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Account>), ApiError> {
    let username = Username::parse(&request.username).map_err(ApiError::validation)?;
    if request.age < 0 {
        return Err(ApiError::Validation("age must not be negative".to_owned()));
    }

    access::validate_password(&request.password)?;
    let password_hash = access::hash_password(&request.password)?;

    let account = AccountRepository::new(state.pool(), state.cipher())
        .create(&NewAccount {
            fullname: request.fullname,
            username,
            password_hash,
            age: request.age,
            address: request.address,
            gender: request.gender,
            marital_status: request.marital_status,
            role: request.role,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(account)))
}

/// List all accounts, PII decrypted.
///
/// GET /accounts
async fn list_accounts(State(state): State<ServiceState>) -> Result<Json<Vec<Account>>, ApiError> {
    let accounts = AccountRepository::new(state.pool(), state.cipher())
        .list()
        .await?;

    Ok(Json(accounts))
}

/// Get one account by username.
///
/// GET /accounts/{username}
async fn get_account(
    State(state): State<ServiceState>,
    Path(username): Path<String>,
) -> Result<Json<Account>, ApiError> {
    let username = parse_username(&username)?;

    let account = AccountRepository::new(state.pool(), state.cipher())
        .get_by_username(&username)
        .await?
        .ok_or_else(|| ApiError::not_found("account"))?;

    Ok(Json(account))
}

/// Apply a partial profile update.
///
/// PUT /accounts/{username}
async fn update_account(
    State(state): State<ServiceState>,
    Path(username): Path<String>,
    Json(update): Json<AccountUpdate>,
) -> Result<Json<Account>, ApiError> {
    let username = parse_username(&username)?;

    if update.age.is_some_and(|age| age < 0) {
        return Err(ApiError::Validation("age must not be negative".to_owned()));
    }

    let account = AccountRepository::new(state.pool(), state.cipher())
        .update(&username, &update)
        .await
        .map_err(|err| match err {
            RepositoryError::NotFound => ApiError::not_found("account"),
            other => other.into(),
        })?;

    Ok(Json(account))
}

/// Delete an account.
///
/// DELETE /accounts/{username}
async fn delete_account(
    State(state): State<ServiceState>,
    Path(username): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let username = parse_username(&username)?;

    AccountRepository::new(state.pool(), state.cipher())
        .delete(&username)
        .await
        .map_err(|err| match err {
            RepositoryError::NotFound => ApiError::not_found("account"),
            other => other.into(),
        })?;

    Ok(Json(json!({ "message": "account deleted" })))
}

/// Add funds to the wallet.
///
/// POST /accounts/{username}/credit
async fn credit(
    State(state): State<ServiceState>,
    Path(username): Path<String>,
    Json(request): Json<AmountRequest>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let username = parse_username(&username)?;

    let balance = TransactionEngine::new(state.pool())
        .credit(&username, request.amount)
        .await?;

    Ok(Json(BalanceResponse { balance }))
}

/// Remove funds from the wallet.
///
/// POST /accounts/{username}/debit
async fn debit(
    State(state): State<ServiceState>,
    Path(username): Path<String>,
    Json(request): Json<AmountRequest>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let username = parse_username(&username)?;

    let balance = TransactionEngine::new(state.pool())
        .debit(&username, request.amount)
        .await?;

    Ok(Json(BalanceResponse { balance }))
}

fn parse_username(raw: &str) -> Result<Username, ApiError> {
    Username::parse(raw).map_err(ApiError::validation)
}
