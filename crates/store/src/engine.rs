//! The transaction engine for wallet and stock mutations.
//!
//! Balance and stock are mutated by independently-deployed services sharing
//! one store, so nothing here validates against a read taken outside the
//! transaction that commits the mutation:
//!
//! - `credit`/`debit`/`restock`/`consume` are single guarded `UPDATE`s -
//!   the precondition (`balance >= amount`, `stock >= quantity`) is part of
//!   the statement's WHERE clause, so check and mutation are atomic and
//!   conflict-free under row locking.
//! - `purchase` debits the buyer and consumes stock as one transaction,
//!   holding `FOR UPDATE` locks on both rows. Locks are always taken in the
//!   same order (account, then product) so concurrent purchases serialize
//!   instead of deadlocking. Transient aborts (SQLSTATE 40001/40P01) are
//!   retried a bounded number of times, then surfaced as [`EngineError::Conflict`].
//!
//! There is no partial-commit state observable to callers: every early
//! return before `commit` rolls the whole transaction back.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;

use sugarcane_core::{ProductId, Username};

use crate::models::Product;

/// Attempts per composite mutation before giving up with `Conflict`.
const MAX_ATTEMPTS: u32 = 3;

/// Failure kinds for engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Amount was zero or negative.
    #[error("amount must be greater than zero")]
    InvalidAmount,

    /// Quantity was zero or negative.
    #[error("quantity must be greater than zero")]
    InvalidQuantity,

    /// The account does not exist.
    #[error("account not found")]
    AccountNotFound,

    /// The product does not exist.
    #[error("product not found")]
    ProductNotFound,

    /// The account balance does not cover the debit.
    #[error("insufficient funds")]
    InsufficientFunds,

    /// The product stock does not cover the consumption.
    #[error("not enough stock available")]
    InsufficientStock,

    /// Concurrent updates kept aborting the transaction; retries exhausted.
    #[error("transaction conflicted with concurrent updates, try again")]
    Conflict,

    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result of a successful purchase: both sides of the composite mutation.
#[derive(Debug, Clone, Serialize)]
pub struct Receipt {
    /// Buyer's balance after the debit.
    pub balance: Decimal,
    /// Product after the stock consumption.
    pub product: Product,
}

/// Atomic wallet/stock mutations against the shared store.
pub struct TransactionEngine<'a> {
    pool: &'a PgPool,
}

impl<'a> TransactionEngine<'a> {
    /// Create a new transaction engine.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Add funds to an account's wallet. Returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` for non-positive amounts and
    /// `AccountNotFound` if the account doesn't exist.
    pub async fn credit(
        &self,
        username: &Username,
        amount: Decimal,
    ) -> Result<Decimal, EngineError> {
        validate_amount(amount)?;

        let row: Option<(Decimal,)> = sqlx::query_as(
            "UPDATE account SET balance = balance + $2, updated_at = now() \
             WHERE username = $1 \
             RETURNING balance",
        )
        .bind(username.as_str())
        .bind(amount)
        .fetch_optional(self.pool)
        .await?;

        row.map(|(balance,)| balance)
            .ok_or(EngineError::AccountNotFound)
    }

    /// Remove funds from an account's wallet. Returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` for non-positive amounts, `AccountNotFound`
    /// if the account doesn't exist, and `InsufficientFunds` if the balance
    /// doesn't cover the amount.
    pub async fn debit(&self, username: &Username, amount: Decimal) -> Result<Decimal, EngineError> {
        validate_amount(amount)?;

        // The balance check is inside the statement; a concurrent debit
        // cannot sneak between check and write.
        let row: Option<(Decimal,)> = sqlx::query_as(
            "UPDATE account SET balance = balance - $2, updated_at = now() \
             WHERE username = $1 AND balance >= $2 \
             RETURNING balance",
        )
        .bind(username.as_str())
        .bind(amount)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some((balance,)) => Ok(balance),
            None => Err(self.classify_debit_failure(username).await?),
        }
    }

    /// Add stock to a product. Returns the updated product.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantity` for non-positive quantities and
    /// `ProductNotFound` if the product doesn't exist.
    pub async fn restock(
        &self,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<Product, EngineError> {
        validate_quantity(quantity)?;

        let product = sqlx::query_as::<_, Product>(
            "UPDATE product SET stock = stock + $2, updated_at = now() \
             WHERE id = $1 \
             RETURNING id, name, category, price, description, stock, created_at, updated_at",
        )
        .bind(product_id)
        .bind(quantity)
        .fetch_optional(self.pool)
        .await?;

        product.ok_or(EngineError::ProductNotFound)
    }

    /// Remove stock from a product. Returns the updated product.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantity` for non-positive quantities,
    /// `ProductNotFound` if the product doesn't exist, and
    /// `InsufficientStock` if fewer than `quantity` units remain.
    pub async fn consume(
        &self,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<Product, EngineError> {
        validate_quantity(quantity)?;

        let product = sqlx::query_as::<_, Product>(
            "UPDATE product SET stock = stock - $2, updated_at = now() \
             WHERE id = $1 AND stock >= $2 \
             RETURNING id, name, category, price, description, stock, created_at, updated_at",
        )
        .bind(product_id)
        .bind(quantity)
        .fetch_optional(self.pool)
        .await?;

        match product {
            Some(product) => Ok(product),
            None => Err(self.classify_consume_failure(product_id).await?),
        }
    }

    /// Purchase `quantity` units of a product on an account's wallet.
    ///
    /// Debit and stock consumption commit together or not at all. Returns
    /// the updated balance and product.
    ///
    /// # Errors
    ///
    /// Returns the validation/lookup failures of `debit` and `consume`,
    /// plus `Conflict` once bounded retries are exhausted.
    pub async fn purchase(
        &self,
        username: &Username,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<Receipt, EngineError> {
        validate_quantity(quantity)?;

        let mut attempt = 1;
        loop {
            match self.try_purchase(username, product_id, quantity).await {
                Err(EngineError::Database(err)) if is_retryable(&err) => {
                    if attempt >= MAX_ATTEMPTS {
                        return Err(EngineError::Conflict);
                    }
                    tracing::warn!(
                        attempt,
                        username = %username,
                        product_id = %product_id,
                        error = %err,
                        "purchase aborted by concurrent update, retrying"
                    );
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn try_purchase(
        &self,
        username: &Username,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<Receipt, EngineError> {
        let mut tx = self.pool.begin().await?;

        // Fixed lock order: account row first, then product row.
        let account: Option<(Decimal,)> =
            sqlx::query_as("SELECT balance FROM account WHERE username = $1 FOR UPDATE")
                .bind(username.as_str())
                .fetch_optional(&mut *tx)
                .await?;
        let Some((balance,)) = account else {
            return Err(EngineError::AccountNotFound);
        };

        let product: Option<(Decimal, i32)> =
            sqlx::query_as("SELECT price, stock FROM product WHERE id = $1 FOR UPDATE")
                .bind(product_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((price, stock)) = product else {
            return Err(EngineError::ProductNotFound);
        };

        if stock < quantity {
            return Err(EngineError::InsufficientStock);
        }

        let total = total_cost(price, quantity);
        if balance < total {
            return Err(EngineError::InsufficientFunds);
        }

        let (new_balance,): (Decimal,) = sqlx::query_as(
            "UPDATE account SET balance = balance - $2, updated_at = now() \
             WHERE username = $1 \
             RETURNING balance",
        )
        .bind(username.as_str())
        .bind(total)
        .fetch_one(&mut *tx)
        .await?;

        let product = sqlx::query_as::<_, Product>(
            "UPDATE product SET stock = stock - $2, updated_at = now() \
             WHERE id = $1 \
             RETURNING id, name, category, price, description, stock, created_at, updated_at",
        )
        .bind(product_id)
        .bind(quantity)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Receipt {
            balance: new_balance,
            product,
        })
    }

    /// A guarded debit matched no row: missing account or short balance?
    async fn classify_debit_failure(&self, username: &Username) -> Result<EngineError, sqlx::Error> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM account WHERE username = $1)")
                .bind(username.as_str())
                .fetch_one(self.pool)
                .await?;

        Ok(if exists {
            EngineError::InsufficientFunds
        } else {
            EngineError::AccountNotFound
        })
    }

    /// A guarded consume matched no row: missing product or short stock?
    async fn classify_consume_failure(
        &self,
        product_id: ProductId,
    ) -> Result<EngineError, sqlx::Error> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM product WHERE id = $1)")
                .bind(product_id)
                .fetch_one(self.pool)
                .await?;

        Ok(if exists {
            EngineError::InsufficientStock
        } else {
            EngineError::ProductNotFound
        })
    }
}

/// Reject non-positive amounts before any statement runs.
fn validate_amount(amount: Decimal) -> Result<(), EngineError> {
    if amount.is_sign_negative() || amount.is_zero() {
        return Err(EngineError::InvalidAmount);
    }
    Ok(())
}

/// Reject non-positive quantities before any statement runs.
const fn validate_quantity(quantity: i32) -> Result<(), EngineError> {
    if quantity <= 0 {
        return Err(EngineError::InvalidQuantity);
    }
    Ok(())
}

/// Price times quantity, in exact decimal arithmetic.
fn total_cost(price: Decimal, quantity: i32) -> Decimal {
    price * Decimal::from(quantity)
}

/// Serialization failures and deadlocks are worth retrying; everything
/// else is a real error.
fn is_retryable(err: &sqlx::Error) -> bool {
    let sqlx::Error::Database(db_err) = err else {
        return false;
    };
    matches!(db_err.code().as_deref(), Some("40001" | "40P01"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_validate_amount_rejects_zero_and_negative() {
        assert!(matches!(
            validate_amount(Decimal::ZERO),
            Err(EngineError::InvalidAmount)
        ));
        assert!(matches!(
            validate_amount(dec("-5")),
            Err(EngineError::InvalidAmount)
        ));
    }

    #[test]
    fn test_validate_amount_accepts_positive() {
        assert!(validate_amount(dec("0.01")).is_ok());
        assert!(validate_amount(dec("100")).is_ok());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(matches!(
            validate_quantity(0),
            Err(EngineError::InvalidQuantity)
        ));
        assert!(matches!(
            validate_quantity(-3),
            Err(EngineError::InvalidQuantity)
        ));
        assert!(validate_quantity(1).is_ok());
    }

    #[test]
    fn test_total_cost() {
        assert_eq!(total_cost(dec("10"), 30), dec("300"));
        assert_eq!(total_cost(dec("19.99"), 3), dec("59.97"));
        assert_eq!(total_cost(dec("0.10"), 7), dec("0.70"));
    }

    #[test]
    fn test_is_retryable_ignores_non_database_errors() {
        assert!(!is_retryable(&sqlx::Error::RowNotFound));
    }
}
