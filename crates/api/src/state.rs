//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use sugarcane_store::access::AccessControl;
use sugarcane_store::audit::AuditLog;
use sugarcane_store::config::ServiceConfig;
use sugarcane_store::pii::{PiiCipher, PiiError};

/// Error building the service state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("pii cipher: {0}")]
    Pii(#[from] PiiError),
    #[error("audit log: {0}")]
    Audit(#[from] std::io::Error),
}

/// Application state shared across all handlers of one service.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the database pool, the PII cipher, and the audit
/// sink. There is deliberately no global: every service process builds its
/// own state from configuration and passes it down explicitly.
#[derive(Clone)]
pub struct ServiceState {
    inner: Arc<ServiceStateInner>,
}

struct ServiceStateInner {
    config: ServiceConfig,
    pool: PgPool,
    cipher: PiiCipher,
    audit: AuditLog,
}

impl ServiceState {
    /// Create a new service state.
    ///
    /// # Errors
    ///
    /// Returns an error if the PII keyring is invalid or the audit log file
    /// cannot be opened.
    pub async fn new(config: ServiceConfig, pool: PgPool) -> Result<Self, StateError> {
        let cipher = PiiCipher::from_config(&config.store.pii_keys)?;
        let audit = AuditLog::from_config(config.store.audit_log_path.as_deref()).await?;

        Ok(Self {
            inner: Arc::new(ServiceStateInner {
                config,
                pool,
                cipher,
                audit,
            }),
        })
    }

    /// Get a reference to the service configuration.
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the PII cipher.
    #[must_use]
    pub fn cipher(&self) -> &PiiCipher {
        &self.inner.cipher
    }

    /// Get a reference to the audit log sink.
    #[must_use]
    pub fn audit(&self) -> &AuditLog {
        &self.inner.audit
    }

    /// Build an access control layer over this state's pool.
    #[must_use]
    pub fn access(&self) -> AccessControl<'_> {
        AccessControl::new(self.pool(), self.cipher())
    }
}
