//! Admin account management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create an admin with a generated password (printed once)
//! sc-cli account create-admin -u root_admin -f "Store Admin"
//!
//! # Create an admin with an explicit password
//! sc-cli account create-admin -u root_admin -f "Store Admin" -p 'a long passphrase'
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `PII_KEYS` - PII keyring (the admin's name/address are encrypted like
//!   any other account's)

use rand::Rng;
use rand::distr::Alphanumeric;
use thiserror::Error;

use sugarcane_core::{Role, Username, UsernameError};
use sugarcane_store::access::{self, AccessError};
use sugarcane_store::config::{ConfigError, StoreConfig};
use sugarcane_store::db::{self, RepositoryError};
use sugarcane_store::models::NewAccount;
use sugarcane_store::pii::{PiiCipher, PiiError};
use sugarcane_store::repo::AccountRepository;

/// Generated password length.
const GENERATED_PASSWORD_LENGTH: usize = 24;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Invalid username.
    #[error("invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),

    /// PII keyring problem.
    #[error("pii error: {0}")]
    Pii(#[from] PiiError),

    /// Password hashing or validation failed.
    #[error("access error: {0}")]
    Access(#[from] AccessError),

    /// Database connection error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Account creation failed (e.g. username taken).
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Create a new admin account.
///
/// If no password is supplied one is generated and printed exactly once.
///
/// # Errors
///
/// Returns `AdminError` if configuration, hashing, or the insert fails.
pub async fn create_admin(
    username: &str,
    fullname: &str,
    password: Option<&str>,
) -> Result<(), AdminError> {
    dotenvy::dotenv().ok();

    let config = StoreConfig::from_env()?;
    let username = Username::parse(username)?;

    let (password, generated) = match password {
        Some(password) => (password.to_owned(), false),
        None => (generate_password(), true),
    };
    access::validate_password(&password)?;
    let password_hash = access::hash_password(&password)?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url).await?;
    let cipher = PiiCipher::from_config(&config.pii_keys)?;

    tracing::info!("Creating admin account: {}", username);
    let account = AccountRepository::new(&pool, &cipher)
        .create(&NewAccount {
            fullname: fullname.to_owned(),
            username,
            password_hash,
            age: 0,
            address: String::new(),
            gender: "unspecified".to_owned(),
            marital_status: "unspecified".to_owned(),
            role: Role::Admin,
        })
        .await?;

    tracing::info!("Admin account created with id {}", account.id);

    if generated {
        // The generated secret is shown exactly once, on purpose.
        #[allow(clippy::print_stdout)]
        {
            println!("generated password for {}: {password}", account.username);
        }
    }

    Ok(())
}

/// Random alphanumeric password for bootstrap admins.
fn generate_password() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(GENERATED_PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_password_length_and_charset() {
        let password = generate_password();
        assert_eq!(password.len(), GENERATED_PASSWORD_LENGTH);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generated_passwords_differ() {
        assert_ne!(generate_password(), generate_password());
    }
}
