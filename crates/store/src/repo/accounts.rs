//! Account repository for database operations.
//!
//! PII fields (`fullname`, `address`) cross this boundary in both
//! directions: encrypted on every write, decrypted on every read. A token
//! that no longer decrypts surfaces as `DataCorruption`, never as garbage
//! plaintext.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use sugarcane_core::{AccountId, Role, Username};

use crate::db::RepositoryError;
use crate::models::{Account, AccountUpdate, NewAccount};
use crate::pii::PiiCipher;

const ACCOUNT_COLUMNS: &str = "id, fullname, username, password_hash, age, address, \
     gender, marital_status, balance, role, created_at, updated_at";

/// Raw account row; PII columns still encrypted.
#[derive(FromRow)]
struct AccountRow {
    id: AccountId,
    fullname: String,
    username: String,
    password_hash: String,
    age: i32,
    address: String,
    gender: String,
    marital_status: String,
    balance: Decimal,
    role: Role,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AccountRow {
    fn into_account(self, cipher: &PiiCipher) -> Result<Account, RepositoryError> {
        let fullname = cipher.decrypt(&self.fullname).map_err(|e| {
            RepositoryError::DataCorruption(format!("undecryptable fullname: {e}"))
        })?;
        let address = cipher
            .decrypt(&self.address)
            .map_err(|e| RepositoryError::DataCorruption(format!("undecryptable address: {e}")))?;
        let username = Username::parse(&self.username).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid username in database: {e}"))
        })?;

        Ok(Account {
            id: self.id,
            fullname,
            username,
            password_hash: self.password_hash,
            age: self.age,
            address,
            gender: self.gender,
            marital_status: self.marital_status,
            balance: self.balance,
            role: self.role,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Repository for account database operations.
pub struct AccountRepository<'a> {
    pool: &'a PgPool,
    cipher: &'a PiiCipher,
}

impl<'a> AccountRepository<'a> {
    /// Create a new account repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool, cipher: &'a PiiCipher) -> Self {
        Self { pool, cipher }
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new: &NewAccount) -> Result<Account, RepositoryError> {
        let sql = format!(
            "INSERT INTO account \
                 (id, fullname, username, password_hash, age, address, gender, marital_status, role) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {ACCOUNT_COLUMNS}"
        );

        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(AccountId::generate())
            .bind(self.cipher.encrypt(&new.fullname))
            .bind(new.username.as_str())
            .bind(&new.password_hash)
            .bind(new.age)
            .bind(self.cipher.encrypt(&new.address))
            .bind(&new.gender)
            .bind(&new.marital_status)
            .bind(new.role)
            .fetch_one(self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return RepositoryError::Conflict("username taken".to_owned());
                }
                RepositoryError::Database(e)
            })?;

        row.into_account(self.cipher)
    }

    /// Get an account by username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored PII cannot be decrypted.
    pub async fn get_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<Account>, RepositoryError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM account WHERE username = $1");

        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(username.as_str())
            .fetch_optional(self.pool)
            .await?;

        row.map(|r| r.into_account(self.cipher)).transpose()
    }

    /// List all accounts, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored PII cannot be decrypted.
    pub async fn list(&self) -> Result<Vec<Account>, RepositoryError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM account ORDER BY created_at ASC");

        let rows = sqlx::query_as::<_, AccountRow>(&sql)
            .fetch_all(self.pool)
            .await?;

        let mut accounts = Vec::with_capacity(rows.len());
        for row in rows {
            accounts.push(row.into_account(self.cipher)?);
        }

        Ok(accounts)
    }

    /// Apply a partial update to an account.
    ///
    /// Absent fields are left untouched; PII fields are re-encrypted when
    /// present.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        username: &Username,
        update: &AccountUpdate,
    ) -> Result<Account, RepositoryError> {
        let fullname = update.fullname.as_deref().map(|v| self.cipher.encrypt(v));
        let address = update.address.as_deref().map(|v| self.cipher.encrypt(v));

        let sql = format!(
            "UPDATE account SET \
                 fullname = COALESCE($2, fullname), \
                 age = COALESCE($3, age), \
                 address = COALESCE($4, address), \
                 gender = COALESCE($5, gender), \
                 marital_status = COALESCE($6, marital_status), \
                 updated_at = now() \
             WHERE username = $1 \
             RETURNING {ACCOUNT_COLUMNS}"
        );

        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(username.as_str())
            .bind(fullname)
            .bind(update.age)
            .bind(address)
            .bind(update.gender.as_deref())
            .bind(update.marital_status.as_deref())
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        row.into_account(self.cipher)
    }

    /// Delete an account by username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&self, username: &Username) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM account WHERE username = $1")
            .bind(username.as_str())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
