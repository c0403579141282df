//! Review domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use sugarcane_core::{AccountId, ProductId, Rating, ReviewId, Username};

/// A product review.
///
/// The owning account is fixed at creation; no operation reassigns it.
/// `moderated` only ever moves false -> true, and only through the
/// admin-gated moderation path.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub account_id: AccountId,
    pub rating: Rating,
    /// Sanitized plain text; HTML is stripped before persistence.
    pub comment: String,
    pub moderated: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to submit a review.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub product_id: ProductId,
    pub account_id: AccountId,
    pub rating: Rating,
    /// Already sanitized by the caller.
    pub comment: String,
}

/// Partial review update; only rating and comment are owner-mutable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewUpdate {
    pub rating: Option<Rating>,
    pub comment: Option<String>,
}

/// A review joined with its reviewer's username and product name.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReviewDetails {
    pub id: ReviewId,
    pub rating: Rating,
    pub comment: String,
    pub moderated: bool,
    pub reviewer: Username,
    pub product_name: String,
}
