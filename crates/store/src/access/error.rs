//! Access control error types.

use thiserror::Error;

use sugarcane_core::Role;

use crate::db::RepositoryError;

/// Errors that can occur during authentication and authorization.
#[derive(Debug, Error)]
pub enum AccessError {
    /// Invalid credentials (wrong password or unknown username).
    ///
    /// One variant for both on purpose: the caller learns nothing about
    /// whether the username exists.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The caller is authenticated but lacks the required role.
    #[error("requires {0} role")]
    RoleRequired(Role),

    /// The caller is authenticated but does not own the resource.
    #[error("not the owner of this resource")]
    NotOwner,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
