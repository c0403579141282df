//! Account domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use sugarcane_core::{AccountId, Role, Username};

/// A customer account (domain type).
///
/// `fullname` and `address` are plaintext here; they only exist encrypted
/// inside the store. The credential hash never serializes.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    /// Unique account ID.
    pub id: AccountId,
    /// Display name (PII; encrypted at rest).
    pub fullname: String,
    /// Unique, case-sensitive username.
    pub username: Username,
    /// Argon2id PHC hash of the account secret.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Age in years.
    pub age: i32,
    /// Postal address (PII; encrypted at rest).
    pub address: String,
    /// Self-reported gender.
    pub gender: String,
    /// Self-reported marital status.
    pub marital_status: String,
    /// Wallet balance; never negative.
    pub balance: Decimal,
    /// Permission role.
    pub role: Role,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Fields required to register an account.
///
/// The password is hashed before it gets here; repositories never see a
/// plaintext secret.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub fullname: String,
    pub username: Username,
    pub password_hash: String,
    pub age: i32,
    pub address: String,
    pub gender: String,
    pub marital_status: String,
    pub role: Role,
}

/// Partial account update; absent fields are left untouched.
///
/// Username, balance, and role are deliberately not updatable here:
/// balance moves only through the transaction engine, the others are
/// immutable after registration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountUpdate {
    pub fullname: Option<String>,
    pub age: Option<i32>,
    pub address: Option<String>,
    pub gender: Option<String>,
    pub marital_status: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_never_serializes() {
        let account = Account {
            id: AccountId::generate(),
            fullname: "Maya Quintero".to_owned(),
            username: Username::parse("maya").unwrap(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$abc$def".to_owned(),
            age: 34,
            address: "12 Rue des Lilas".to_owned(),
            gender: "female".to_owned(),
            marital_status: "single".to_owned(),
            balance: Decimal::ZERO,
            role: Role::Standard,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&account).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("password_hash"));
        assert!(json.contains("\"maya\""));
    }
}
