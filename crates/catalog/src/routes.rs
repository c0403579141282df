//! HTTP route handlers for the catalog service.
//!
//! # Route Structure
//!
//! ```text
//! POST /products                 - Add a product (admin)
//! GET  /products                 - List the catalog
//! GET  /products/{id}            - Get one product
//! PUT  /products/{id}            - Partial product update (admin)
//! POST /products/{id}/consume    - Deduct stock (admin)
//! POST /products/{id}/restock    - Add stock (admin)
//! GET  /products/by-name/{name}  - Get one product by exact name
//! ```
//!
//! Guard order on every mutation: authenticate, then the admin role check,
//! then the mutation itself.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::Deserialize;

use sugarcane_api::{ApiError, BasicAuth, ServiceState};
use sugarcane_core::{ProductId, Role};
use sugarcane_store::access::{AccessControl, Credentials};
use sugarcane_store::db::RepositoryError;
use sugarcane_store::engine::TransactionEngine;
use sugarcane_store::models::{NewProduct, Product, ProductUpdate};
use sugarcane_store::repo::ProductRepository;

pub fn routes() -> Router<ServiceState> {
    Router::new()
        .route("/products", post(add_product).get(list_products))
        .route("/products/{id}", get(get_product).put(update_product))
        .route("/products/{id}/consume", post(consume_stock))
        .route("/products/{id}/restock", post(restock))
        .route("/products/by-name/{name}", get(get_product_by_name))
}

/// Stock mutation payload.
#[derive(Debug, Deserialize)]
struct QuantityRequest {
    quantity: i32,
}

/// Add a product to the catalog.
///
/// POST /products (admin)
async fn add_product(
    State(state): State<ServiceState>,
    BasicAuth(credentials): BasicAuth,
    Json(new): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    require_admin(&state, &credentials).await?;

    if new.name.trim().is_empty() {
        return Err(ApiError::Validation("name is required".to_owned()));
    }
    validate_price(new.price)?;
    validate_stock(new.stock)?;

    let product = ProductRepository::new(state.pool()).create(&new).await?;

    Ok((StatusCode::CREATED, Json(product)))
}

/// List the whole catalog.
///
/// GET /products
async fn list_products(State(state): State<ServiceState>) -> Result<Json<Vec<Product>>, ApiError> {
    let products = ProductRepository::new(state.pool()).list().await?;
    Ok(Json(products))
}

/// Get one product by ID.
///
/// GET /products/{id}
async fn get_product(
    State(state): State<ServiceState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>, ApiError> {
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("product"))?;

    Ok(Json(product))
}

/// Get one product by exact name.
///
/// GET /products/by-name/{name}
async fn get_product_by_name(
    State(state): State<ServiceState>,
    Path(name): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let product = ProductRepository::new(state.pool())
        .get_by_name(&name)
        .await?
        .ok_or_else(|| ApiError::not_found("product"))?;

    Ok(Json(product))
}

/// Apply a partial update to a product.
///
/// PUT /products/{id} (admin)
async fn update_product(
    State(state): State<ServiceState>,
    Path(id): Path<ProductId>,
    BasicAuth(credentials): BasicAuth,
    Json(update): Json<ProductUpdate>,
) -> Result<Json<Product>, ApiError> {
    require_admin(&state, &credentials).await?;

    if let Some(price) = update.price {
        validate_price(price)?;
    }
    if let Some(stock) = update.stock {
        validate_stock(stock)?;
    }

    let product = ProductRepository::new(state.pool())
        .update(id, &update)
        .await
        .map_err(|err| match err {
            RepositoryError::NotFound => ApiError::not_found("product"),
            other => other.into(),
        })?;

    Ok(Json(product))
}

/// Deduct stock from a product.
///
/// POST /products/{id}/consume (admin)
async fn consume_stock(
    State(state): State<ServiceState>,
    Path(id): Path<ProductId>,
    BasicAuth(credentials): BasicAuth,
    Json(request): Json<QuantityRequest>,
) -> Result<Json<Product>, ApiError> {
    require_admin(&state, &credentials).await?;

    let product = TransactionEngine::new(state.pool())
        .consume(id, request.quantity)
        .await?;

    Ok(Json(product))
}

/// Add stock to a product.
///
/// POST /products/{id}/restock (admin)
async fn restock(
    State(state): State<ServiceState>,
    Path(id): Path<ProductId>,
    BasicAuth(credentials): BasicAuth,
    Json(request): Json<QuantityRequest>,
) -> Result<Json<Product>, ApiError> {
    require_admin(&state, &credentials).await?;

    let product = TransactionEngine::new(state.pool())
        .restock(id, request.quantity)
        .await?;

    Ok(Json(product))
}

/// Authenticate and require the admin role, in that order.
async fn require_admin(state: &ServiceState, credentials: &Credentials) -> Result<(), ApiError> {
    let caller = state.access().authenticate(credentials).await?;
    AccessControl::require_role(&caller, Role::Admin)?;
    Ok(())
}

fn validate_price(price: Decimal) -> Result<(), ApiError> {
    if price.is_sign_negative() {
        return Err(ApiError::Validation("price must not be negative".to_owned()));
    }
    Ok(())
}

fn validate_stock(stock: i32) -> Result<(), ApiError> {
    if stock < 0 {
        return Err(ApiError::Validation("stock must not be negative".to_owned()));
    }
    Ok(())
}
