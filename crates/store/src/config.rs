//! Service configuration loaded from environment variables.
//!
//! All four services share one `PostgreSQL` store and one PII keyring; each
//! service additionally has its own bind address. Per the deployment layout
//! there is no ambient global configuration - every component receives an
//! explicit handle built from these values.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string (shared by all services)
//! - `PII_KEYS` - PII keyring: comma-separated `id=key` pairs of url-safe
//!   base64 Fernet keys, primary first (e.g. `k2=abc...,k1=def...`)
//!
//! ## Optional
//! - `AUDIT_LOG_PATH` - Append-only audit log file (audit still goes to
//!   tracing when unset)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `{SERVICE}_HOST` - Bind address (default: 127.0.0.1)
//! - `{SERVICE}_PORT` - Listen port (default: per service, 5000-5003)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Configuration shared by everything that touches the store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// PII keyring, primary key first.
    pub pii_keys: Vec<PiiKeyConfig>,
    /// Append-only audit log file, if file-backed auditing is enabled.
    pub audit_log_path: Option<PathBuf>,
}

/// A single provisioned PII key.
///
/// The id is stored alongside each ciphertext token, so keys can be rotated
/// without re-encrypting existing rows.
#[derive(Clone)]
pub struct PiiKeyConfig {
    /// Short key identifier (e.g. `k1`).
    pub id: String,
    /// Url-safe base64 Fernet key.
    pub key: SecretString,
}

impl std::fmt::Debug for PiiKeyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PiiKeyConfig")
            .field("id", &self.id)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Per-service configuration: a bind address plus the shared store config.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Name of the service (used in logs).
    pub service: String,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Shared store configuration.
    pub store: StoreConfig,
}

impl StoreConfig {
    /// Load store configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_required_secret("DATABASE_URL")?;
        let pii_keys = parse_pii_keys(&get_required_env("PII_KEYS")?)?;
        let audit_log_path = get_optional_env("AUDIT_LOG_PATH").map(PathBuf::from);

        Ok(Self {
            database_url,
            pii_keys,
            audit_log_path,
        })
    }
}

impl ServiceConfig {
    /// Load a service's configuration from environment variables.
    ///
    /// `prefix` selects the per-service variables (`IDENTITY_PORT`, ...);
    /// the store variables are shared across services.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env(prefix: &str, default_port: u16) -> Result<Self, ConfigError> {
        let store = StoreConfig::from_env()?;

        let host_var = format!("{prefix}_HOST");
        let host = get_env_or_default(&host_var, "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar(host_var, e.to_string()))?;

        let port_var = format!("{prefix}_PORT");
        let port = get_env_or_default(&port_var, &default_port.to_string())
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar(port_var, e.to_string()))?;

        Ok(Self {
            service: prefix.to_lowercase(),
            host,
            port,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            store,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Parse the `PII_KEYS` keyring value (`id=key,id=key,...`, primary first).
fn parse_pii_keys(raw: &str) -> Result<Vec<PiiKeyConfig>, ConfigError> {
    let mut keys = Vec::new();

    for entry in raw.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }

        let Some((id, key)) = entry.split_once('=') else {
            return Err(ConfigError::InvalidEnvVar(
                "PII_KEYS".to_owned(),
                format!("expected `id=key`, got `{entry}`"),
            ));
        };

        if id.is_empty() || id.contains(':') {
            return Err(ConfigError::InvalidEnvVar(
                "PII_KEYS".to_owned(),
                format!("invalid key id `{id}`"),
            ));
        }

        validate_secret_strength(key, "PII_KEYS")?;

        keys.push(PiiKeyConfig {
            id: id.to_owned(),
            key: SecretString::from(key.to_owned()),
        });
    }

    if keys.is_empty() {
        return Err(ConfigError::InvalidEnvVar(
            "PII_KEYS".to_owned(),
            "at least one key is required".to_owned(),
        ));
    }

    Ok(keys)
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real keys are randomly generated and score high)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated key."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    // A throwaway Fernet-shaped key for tests (random url-safe base64).
    const TEST_KEY: &str = "pZ3a8kQ1vR7mW2xC9dT4bN6hJ0fL5sY8uE3gK7iA1oM=";

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-pii-key-here", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength(TEST_KEY, "TEST_VAR").is_ok());
    }

    #[test]
    fn test_parse_pii_keys_single() {
        let keys = parse_pii_keys(&format!("k1={TEST_KEY}")).unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].id, "k1");
        assert_eq!(keys[0].key.expose_secret(), TEST_KEY);
    }

    #[test]
    fn test_parse_pii_keys_primary_first() {
        let keys = parse_pii_keys(&format!("k2={TEST_KEY},k1={TEST_KEY}")).unwrap();
        assert_eq!(keys[0].id, "k2");
        assert_eq!(keys[1].id, "k1");
    }

    #[test]
    fn test_parse_pii_keys_rejects_missing_separator() {
        assert!(parse_pii_keys(TEST_KEY).is_err());
    }

    #[test]
    fn test_parse_pii_keys_rejects_colon_in_id() {
        assert!(parse_pii_keys(&format!("k:1={TEST_KEY}")).is_err());
    }

    #[test]
    fn test_parse_pii_keys_rejects_empty() {
        assert!(parse_pii_keys("").is_err());
        assert!(parse_pii_keys(" , ,").is_err());
    }

    #[test]
    fn test_debug_redacts_key() {
        let keys = parse_pii_keys(&format!("k1={TEST_KEY}")).unwrap();
        let debug_output = format!("{:?}", keys[0]);
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains(TEST_KEY));
    }
}
