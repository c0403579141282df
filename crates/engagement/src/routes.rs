//! HTTP route handlers for the engagement service.
//!
//! # Route Structure
//!
//! ```text
//! POST   /reviews                       - Submit a review (auth)
//! PUT    /reviews/{id}                  - Update rating/comment (owner)
//! DELETE /reviews/{id}                  - Delete a review (owner)
//! POST   /reviews/{id}/moderate         - Flag as moderated (admin)
//! GET    /reviews/{id}/details          - Review + reviewer + product name
//! GET    /reviews/product/{product_id}  - All reviews for a product
//! GET    /reviews/account/{username}    - All reviews by an account
//! ```

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use serde::Deserialize;
use serde_json::{Value, json};

use sugarcane_api::{ApiError, BasicAuth, ServiceState};
use sugarcane_core::{ProductId, Rating, ReviewId, Role, Username};
use sugarcane_store::access::AccessControl;
use sugarcane_store::db::RepositoryError;
use sugarcane_store::models::{NewReview, Review, ReviewDetails, ReviewUpdate};
use sugarcane_store::repo::{AccountRepository, ProductRepository, ReviewRepository};
use sugarcane_store::sanitize::clean_comment;

pub fn routes() -> Router<ServiceState> {
    Router::new()
        .route("/reviews", post(submit_review))
        .route("/reviews/{id}", put(update_review).delete(delete_review))
        .route("/reviews/{id}/moderate", post(moderate_review))
        .route("/reviews/{id}/details", get(review_details))
        .route("/reviews/product/{product_id}", get(reviews_by_product))
        .route("/reviews/account/{username}", get(reviews_by_account))
}

/// Review submission payload.
///
/// The reviewer is the authenticated caller; it is not (and cannot be)
/// supplied in the body.
#[derive(Debug, Deserialize)]
struct SubmitRequest {
    product_id: ProductId,
    rating: i16,
    #[serde(default)]
    comment: Option<String>,
}

/// Review update payload. Raw integers so range failures surface as our
/// validation errors rather than a deserialization rejection.
#[derive(Debug, Deserialize)]
struct UpdateRequest {
    #[serde(default)]
    rating: Option<i16>,
    #[serde(default)]
    comment: Option<String>,
}

/// Submit a review for a product.
///
/// POST /reviews (auth)
async fn submit_review(
    State(state): State<ServiceState>,
    BasicAuth(credentials): BasicAuth,
    Json(request): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    let caller = state.access().authenticate(&credentials).await?;

    let rating = Rating::new(request.rating).map_err(ApiError::validation)?;
    let comment = clean_comment(request.comment.as_deref().unwrap_or_default());

    // The FK would catch this too, but a clean 404 beats a constraint error.
    ProductRepository::new(state.pool())
        .get(request.product_id)
        .await?
        .ok_or_else(|| ApiError::not_found("product"))?;

    let review = ReviewRepository::new(state.pool())
        .create(&NewReview {
            product_id: request.product_id,
            account_id: caller.id,
            rating,
            comment,
        })
        .await
        .map_err(|err| match err {
            RepositoryError::NotFound => ApiError::not_found("product"),
            other => other.into(),
        })?;

    Ok((StatusCode::CREATED, Json(review)))
}

/// Update a review's rating and/or comment.
///
/// PUT /reviews/{id} (owner only)
async fn update_review(
    State(state): State<ServiceState>,
    Path(id): Path<ReviewId>,
    BasicAuth(credentials): BasicAuth,
    Json(request): Json<UpdateRequest>,
) -> Result<Json<Review>, ApiError> {
    let caller = state.access().authenticate(&credentials).await?;

    let reviews = ReviewRepository::new(state.pool());
    let review = reviews
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("review"))?;

    AccessControl::authorize_owner(&caller, review.account_id)?;

    let rating = request
        .rating
        .map(Rating::new)
        .transpose()
        .map_err(ApiError::validation)?;
    let comment = request.comment.as_deref().map(clean_comment);

    let review = reviews
        .update(id, &ReviewUpdate { rating, comment })
        .await
        .map_err(|err| match err {
            RepositoryError::NotFound => ApiError::not_found("review"),
            other => other.into(),
        })?;

    Ok(Json(review))
}

/// Delete a review.
///
/// DELETE /reviews/{id} (owner only)
async fn delete_review(
    State(state): State<ServiceState>,
    Path(id): Path<ReviewId>,
    BasicAuth(credentials): BasicAuth,
) -> Result<Json<Value>, ApiError> {
    let caller = state.access().authenticate(&credentials).await?;

    let reviews = ReviewRepository::new(state.pool());
    let review = reviews
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("review"))?;

    AccessControl::authorize_owner(&caller, review.account_id)?;

    reviews.delete(id).await.map_err(|err| match err {
        RepositoryError::NotFound => ApiError::not_found("review"),
        other => other.into(),
    })?;

    Ok(Json(json!({ "message": "review deleted" })))
}

/// Flag a review as moderated.
///
/// POST /reviews/{id}/moderate (admin; ownership irrelevant)
async fn moderate_review(
    State(state): State<ServiceState>,
    Path(id): Path<ReviewId>,
    BasicAuth(credentials): BasicAuth,
) -> Result<Json<Review>, ApiError> {
    let caller = state.access().authenticate(&credentials).await?;
    AccessControl::require_role(&caller, Role::Admin)?;

    let review = ReviewRepository::new(state.pool())
        .moderate(id)
        .await
        .map_err(|err| match err {
            RepositoryError::NotFound => ApiError::not_found("review"),
            other => other.into(),
        })?;

    Ok(Json(review))
}

/// Get a review with its reviewer's username and product name resolved.
///
/// GET /reviews/{id}/details
async fn review_details(
    State(state): State<ServiceState>,
    Path(id): Path<ReviewId>,
) -> Result<Json<ReviewDetails>, ApiError> {
    let details = ReviewRepository::new(state.pool())
        .get_details(id)
        .await?
        .ok_or_else(|| ApiError::not_found("review"))?;

    Ok(Json(details))
}

/// List all reviews for a product.
///
/// GET /reviews/product/{product_id}
async fn reviews_by_product(
    State(state): State<ServiceState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Vec<Review>>, ApiError> {
    let reviews = ReviewRepository::new(state.pool())
        .list_by_product(product_id)
        .await?;

    Ok(Json(reviews))
}

/// List all reviews submitted by an account.
///
/// GET /reviews/account/{username}
async fn reviews_by_account(
    State(state): State<ServiceState>,
    Path(username): Path<String>,
) -> Result<Json<Vec<Review>>, ApiError> {
    let username = Username::parse(&username).map_err(ApiError::validation)?;

    let account = AccountRepository::new(state.pool(), state.cipher())
        .get_by_username(&username)
        .await?
        .ok_or_else(|| ApiError::not_found("account"))?;

    let reviews = ReviewRepository::new(state.pool())
        .list_by_account(account.id)
        .await?;

    Ok(Json(reviews))
}
