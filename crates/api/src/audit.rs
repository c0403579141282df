//! Audit-interceptor middleware.
//!
//! Layered around every route of every service, outside authentication, so
//! rejected calls are observed too. Each request produces two records: the
//! redacted input before dispatch and the outcome after. Recording is
//! best-effort; the sink never fails the request.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use sugarcane_store::audit::AuditEvent;

use crate::extract::caller_hint;
use crate::state::ServiceState;

/// Request bodies larger than this are rejected rather than audited
/// half-blind. Far above any legitimate payload in this API.
const AUDIT_BODY_LIMIT: usize = 256 * 1024;

/// Record every operation's input and outcome to the audit log.
pub async fn audit_mw(State(state): State<ServiceState>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let operation = format!("{} {}", parts.method, parts.uri.path());
    let caller = caller_hint(&parts.headers);

    let bytes = match axum::body::to_bytes(body, AUDIT_BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return (StatusCode::PAYLOAD_TOO_LARGE, "request body too large").into_response();
        }
    };

    // Non-JSON bodies audit as null; redaction happens inside the event
    // constructor.
    let input = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    state
        .audit()
        .record(&AuditEvent::request(&operation, caller.as_deref(), input))
        .await;

    let request = Request::from_parts(parts, Body::from(bytes));
    let response = next.run(request).await;

    // Buffer the response just long enough to recover the failure kind we
    // told the caller. Success bodies are not reproduced in the log (they
    // may carry decrypted PII).
    let status = response.status().as_u16();
    let (parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();

    let failure = serde_json::from_slice::<Value>(&bytes)
        .ok()
        .and_then(|body| body["error"]["kind"].as_str().map(ToOwned::to_owned));

    state
        .audit()
        .record(&AuditEvent::response(
            &operation,
            caller.as_deref(),
            status,
            failure.as_deref(),
        ))
        .await;

    Response::from_parts(parts, Body::from(bytes))
}
