//! Authentication and authorization guards.
//!
//! Three composable guards, evaluated in a fixed order on every protected
//! operation: `authenticate` first, then a role or ownership predicate,
//! then business logic. A request with missing or malformed credentials is
//! rejected by the HTTP extractor before `authenticate` ever runs, so the
//! role/ownership predicates only ever see a resolved [`Account`].
//!
//! The predicates are pure functions of (caller, target, requirement); the
//! only I/O in this module is the account lookup inside `authenticate`.

mod error;

pub use error::AccessError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;

use sugarcane_core::{AccountId, Role, Username};

use crate::models::Account;
use crate::pii::PiiCipher;
use crate::repo::AccountRepository;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Credentials presented by a caller (from HTTP Basic auth).
#[derive(Clone)]
pub struct Credentials {
    /// Claimed username, unvalidated.
    pub username: String,
    /// Plaintext secret; never logged, never stored.
    pub password: SecretString,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Access control guards over the identity store.
pub struct AccessControl<'a> {
    accounts: AccountRepository<'a>,
}

impl<'a> AccessControl<'a> {
    /// Create a new access control layer.
    #[must_use]
    pub const fn new(pool: &'a PgPool, cipher: &'a PiiCipher) -> Self {
        Self {
            accounts: AccountRepository::new(pool, cipher),
        }
    }

    /// Resolve and verify a caller's credentials.
    ///
    /// The stored Argon2id hash is verified in constant time; unknown
    /// usernames and wrong passwords are indistinguishable to the caller.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::InvalidCredentials` if the account does not
    /// exist or the secret does not match.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<Account, AccessError> {
        let username = Username::parse(&credentials.username)
            .map_err(|_| AccessError::InvalidCredentials)?;

        let account = self
            .accounts
            .get_by_username(&username)
            .await?
            .ok_or(AccessError::InvalidCredentials)?;

        verify_password(
            credentials.password.expose_secret(),
            &account.password_hash,
        )?;

        Ok(account)
    }

    /// Pass only if the caller holds `role`.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::RoleRequired` on mismatch.
    pub fn require_role(account: &Account, role: Role) -> Result<(), AccessError> {
        if account.role == role {
            Ok(())
        } else {
            Err(AccessError::RoleRequired(role))
        }
    }

    /// Pass only if the caller owns the resource.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::NotOwner` on mismatch.
    pub fn authorize_owner(account: &Account, owner: AccountId) -> Result<(), AccessError> {
        if account.id == owner {
            Ok(())
        } else {
            Err(AccessError::NotOwner)
        }
    }
}

/// Validate password meets requirements.
///
/// # Errors
///
/// Returns `AccessError::WeakPassword` if the password is too short.
pub fn validate_password(password: &str) -> Result<(), AccessError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AccessError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AccessError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AccessError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AccessError::PasswordHash)
}

/// Verify a password against a stored hash.
///
/// # Errors
///
/// Returns `AccessError::InvalidCredentials` if the hash is unparseable or
/// the password does not match.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AccessError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AccessError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AccessError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn account_with_role(role: Role) -> Account {
        Account {
            id: AccountId::generate(),
            fullname: "Test Account".to_owned(),
            username: Username::parse("tester").unwrap(),
            password_hash: String::new(),
            age: 30,
            address: "nowhere".to_owned(),
            gender: "other".to_owned(),
            marital_status: "single".to_owned(),
            balance: Decimal::ZERO,
            role,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong password", &hash),
            Err(AccessError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AccessError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long enough").is_ok());
    }

    #[test]
    fn test_require_role() {
        let admin = account_with_role(Role::Admin);
        let standard = account_with_role(Role::Standard);

        assert!(AccessControl::require_role(&admin, Role::Admin).is_ok());
        assert!(matches!(
            AccessControl::require_role(&standard, Role::Admin),
            Err(AccessError::RoleRequired(Role::Admin))
        ));
        assert!(AccessControl::require_role(&standard, Role::Standard).is_ok());
        // An admin is not implicitly a standard account; roles are exact.
        assert!(AccessControl::require_role(&admin, Role::Standard).is_err());
    }

    #[test]
    fn test_authorize_owner() {
        let account = account_with_role(Role::Standard);
        assert!(AccessControl::authorize_owner(&account, account.id).is_ok());
        assert!(matches!(
            AccessControl::authorize_owner(&account, AccountId::generate()),
            Err(AccessError::NotOwner)
        ));
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let credentials = Credentials {
            username: "maya".to_owned(),
            password: SecretString::from("hunter2".to_owned()),
        };
        let debug_output = format!("{credentials:?}");
        assert!(debug_output.contains("maya"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("hunter2"));
    }
}
