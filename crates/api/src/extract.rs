//! Basic-auth credential extraction.
//!
//! Protected handlers take a [`BasicAuth`] argument; a request with a
//! missing or malformed `Authorization` header is rejected with 401 before
//! the handler body - and therefore before any role or ownership predicate
//! - ever runs.

use axum::http::{HeaderMap, header, request::Parts};
use axum::extract::FromRequestParts;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use secrecy::SecretString;

use sugarcane_store::access::Credentials;

use crate::error::ApiError;

/// Extractor that requires HTTP Basic credentials.
///
/// The credentials are only parsed here, not verified; verification is the
/// access layer's `authenticate` guard.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     State(state): State<ServiceState>,
///     BasicAuth(credentials): BasicAuth,
/// ) -> Result<Json<Thing>, ApiError> {
///     let caller = state.access().authenticate(&credentials).await?;
///     // ...
/// }
/// ```
pub struct BasicAuth(pub Credentials);

impl<S> FromRequestParts<S> for BasicAuth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| ApiError::Unauthorized("authentication required".to_owned()))?;

        let credentials = header
            .to_str()
            .ok()
            .and_then(parse_basic)
            .ok_or_else(|| ApiError::Unauthorized("invalid authorization header".to_owned()))?;

        Ok(Self(credentials))
    }
}

/// Parse an `Authorization: Basic ...` header value.
fn parse_basic(value: &str) -> Option<Credentials> {
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = BASE64.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;

    Some(Credentials {
        username: username.to_owned(),
        password: SecretString::from(password.to_owned()),
    })
}

/// Best-effort caller identity for audit records.
///
/// Decodes the username half of the Basic header without verifying
/// anything; the audit log labels this "caller if known", not
/// "authenticated caller".
#[must_use]
pub fn caller_hint(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_basic)
        .map(|credentials| credentials.username)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    // base64("maya:hunter2")
    const MAYA_HUNTER2: &str = "Basic bWF5YTpodW50ZXIy";

    #[test]
    fn test_parse_basic_valid() {
        let credentials = parse_basic(MAYA_HUNTER2).unwrap();
        assert_eq!(credentials.username, "maya");
        assert_eq!(credentials.password.expose_secret(), "hunter2");
    }

    #[test]
    fn test_parse_basic_password_may_contain_colon() {
        // base64("maya:pass:word") - everything after the first colon is secret
        let encoded = BASE64.encode("maya:pass:word");
        let credentials = parse_basic(&format!("Basic {encoded}")).unwrap();
        assert_eq!(credentials.username, "maya");
        assert_eq!(credentials.password.expose_secret(), "pass:word");
    }

    #[test]
    fn test_parse_basic_rejects_other_schemes() {
        assert!(parse_basic("Bearer some.jwt.token").is_none());
    }

    #[test]
    fn test_parse_basic_rejects_bad_base64() {
        assert!(parse_basic("Basic !!!not-base64!!!").is_none());
    }

    #[test]
    fn test_parse_basic_rejects_missing_colon() {
        let encoded = BASE64.encode("no-colon-here");
        assert!(parse_basic(&format!("Basic {encoded}")).is_none());
    }

    #[test]
    fn test_caller_hint() {
        let mut headers = HeaderMap::new();
        assert_eq!(caller_hint(&headers), None);

        headers.insert(header::AUTHORIZATION, MAYA_HUNTER2.parse().unwrap());
        assert_eq!(caller_hint(&headers).as_deref(), Some("maya"));
    }
}
