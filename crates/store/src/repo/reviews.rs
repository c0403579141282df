//! Review repository for database operations.
//!
//! Ownership and role checks happen in the access layer before any mutation
//! here; this module only enforces referential integrity (via the store's
//! foreign keys) and the monotonic moderation flag.

use sqlx::PgPool;

use sugarcane_core::{AccountId, ProductId, ReviewId};

use crate::db::RepositoryError;
use crate::models::{NewReview, Review, ReviewDetails, ReviewUpdate};

const REVIEW_COLUMNS: &str =
    "id, product_id, account_id, rating, comment, moderated, created_at, updated_at";

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Submit a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the referenced product or
    /// account no longer exists (foreign key violation).
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new: &NewReview) -> Result<Review, RepositoryError> {
        let sql = format!(
            "INSERT INTO review (id, product_id, account_id, rating, comment) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {REVIEW_COLUMNS}"
        );

        sqlx::query_as::<_, Review>(&sql)
            .bind(ReviewId::generate())
            .bind(new.product_id)
            .bind(new.account_id)
            .bind(new.rating)
            .bind(&new.comment)
            .fetch_one(self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return RepositoryError::NotFound;
                }
                RepositoryError::Database(e)
            })
    }

    /// Get a review by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError> {
        let sql = format!("SELECT {REVIEW_COLUMNS} FROM review WHERE id = $1");

        let review = sqlx::query_as::<_, Review>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(review)
    }

    /// List all reviews for a product, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Review>, RepositoryError> {
        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM review \
             WHERE product_id = $1 ORDER BY created_at ASC"
        );

        let reviews = sqlx::query_as::<_, Review>(&sql)
            .bind(product_id)
            .fetch_all(self.pool)
            .await?;

        Ok(reviews)
    }

    /// List all reviews submitted by an account, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Review>, RepositoryError> {
        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM review \
             WHERE account_id = $1 ORDER BY created_at ASC"
        );

        let reviews = sqlx::query_as::<_, Review>(&sql)
            .bind(account_id)
            .fetch_all(self.pool)
            .await?;

        Ok(reviews)
    }

    /// Update a review's rating and/or comment.
    ///
    /// The owning account is never touched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: ReviewId,
        update: &ReviewUpdate,
    ) -> Result<Review, RepositoryError> {
        let sql = format!(
            "UPDATE review SET \
                 rating = COALESCE($2, rating), \
                 comment = COALESCE($3, comment), \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING {REVIEW_COLUMNS}"
        );

        sqlx::query_as::<_, Review>(&sql)
            .bind(id)
            .bind(update.rating)
            .bind(update.comment.as_deref())
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Delete a review by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&self, id: ReviewId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM review WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Flag a review as moderated.
    ///
    /// Monotonic: there is no path back to unmoderated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn moderate(&self, id: ReviewId) -> Result<Review, RepositoryError> {
        let sql = format!(
            "UPDATE review SET moderated = TRUE, updated_at = now() \
             WHERE id = $1 \
             RETURNING {REVIEW_COLUMNS}"
        );

        sqlx::query_as::<_, Review>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Get a review joined with its reviewer's username and product name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_details(
        &self,
        id: ReviewId,
    ) -> Result<Option<ReviewDetails>, RepositoryError> {
        let details = sqlx::query_as::<_, ReviewDetails>(
            "SELECT r.id, r.rating, r.comment, r.moderated, \
                    a.username AS reviewer, p.name AS product_name \
             FROM review r \
             JOIN account a ON a.id = r.account_id \
             JOIN product p ON p.id = r.product_id \
             WHERE r.id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(details)
    }
}
