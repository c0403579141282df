//! HTTP route handlers for the commerce service.
//!
//! # Route Structure
//!
//! ```text
//! GET  /sales/display             - Products available for sale
//! GET  /sales/products/{id}       - Product details
//! POST /sales/purchase            - Purchase (atomic debit + consume)
//! GET  /sales/history/{username}  - Account snapshot
//! ```

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use sugarcane_api::{ApiError, ServiceState};
use sugarcane_core::{ProductId, Username};
use sugarcane_store::engine::{Receipt, TransactionEngine};
use sugarcane_store::models::Product;
use sugarcane_store::repo::{AccountRepository, ProductRepository};

pub fn routes() -> Router<ServiceState> {
    Router::new()
        .route("/sales/display", get(display))
        .route("/sales/products/{id}", get(product_details))
        .route("/sales/purchase", post(purchase))
        .route("/sales/history/{username}", get(history))
}

/// One line of the sales display: name and price only.
#[derive(Debug, Serialize)]
struct Listing {
    name: String,
    price: Decimal,
}

impl From<Product> for Listing {
    fn from(product: Product) -> Self {
        Self {
            name: product.name,
            price: product.price,
        }
    }
}

/// Purchase payload.
#[derive(Debug, Deserialize)]
struct PurchaseRequest {
    username: String,
    product_id: ProductId,
    quantity: i32,
}

/// List products with stock available for sale.
///
/// GET /sales/display
async fn display(State(state): State<ServiceState>) -> Result<Json<Vec<Listing>>, ApiError> {
    let products = ProductRepository::new(state.pool()).list_in_stock().await?;

    Ok(Json(products.into_iter().map(Listing::from).collect()))
}

/// Get full details for one product.
///
/// GET /sales/products/{id}
async fn product_details(
    State(state): State<ServiceState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>, ApiError> {
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("product"))?;

    Ok(Json(product))
}

/// Purchase a quantity of a product on an account's wallet.
///
/// POST /sales/purchase
///
/// Validation, the balance debit, and the stock consumption all happen
/// inside one store transaction; there is no partially-applied outcome.
/// Repeating an identical request applies it again - purchases carry no
/// idempotency key.
async fn purchase(
    State(state): State<ServiceState>,
    Json(request): Json<PurchaseRequest>,
) -> Result<Json<Receipt>, ApiError> {
    let username = Username::parse(&request.username).map_err(ApiError::validation)?;

    let receipt = TransactionEngine::new(state.pool())
        .purchase(&username, request.product_id, request.quantity)
        .await?;

    Ok(Json(receipt))
}

/// Account snapshot standing in for purchase history.
///
/// GET /sales/history/{username}
///
/// There is no ledger in this system (by design); the history view is the
/// account's current state.
async fn history(
    State(state): State<ServiceState>,
    Path(username): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let username = Username::parse(&username).map_err(ApiError::validation)?;

    let account = AccountRepository::new(state.pool(), state.cipher())
        .get_by_username(&username)
        .await?
        .ok_or_else(|| ApiError::not_found("account"))?;

    Ok(Json(json!({
        "message": format!("showing purchase history for {username}"),
        "account": account,
    })))
}
