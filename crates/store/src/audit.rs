//! Append-only audit log sink.
//!
//! Every operation on every service is observed twice: once before dispatch
//! (operation name, caller if known, redacted input) and once after
//! (outcome classification). Records always go to `tracing` under the
//! `audit` target; when `AUDIT_LOG_PATH` is set they are additionally
//! appended to a JSONL file.
//!
//! Auditing is best-effort by contract: a sink failure is logged at `warn`
//! and swallowed, it never fails the operation being audited.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Keys whose values are never reproduced in the audit log.
const SENSITIVE_KEYS: &[&str] = &["password", "secret", "credential", "authorization", "token"];

/// Replacement for redacted values.
const REDACTED: &str = "[REDACTED]";

/// One audit record, serialized as a JSON line.
#[derive(Debug, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum AuditEvent<'a> {
    /// Recorded before the operation is dispatched.
    Request {
        at: DateTime<Utc>,
        operation: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        caller: Option<&'a str>,
        input: Value,
    },
    /// Recorded after the operation completes.
    Response {
        at: DateTime<Utc>,
        operation: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        caller: Option<&'a str>,
        status: u16,
        outcome: Outcome,
        /// Machine-readable failure kind, when the operation failed.
        #[serde(skip_serializing_if = "Option::is_none")]
        failure: Option<&'a str>,
    },
}

impl<'a> AuditEvent<'a> {
    /// Build a request record; the input is redacted in place.
    #[must_use]
    pub fn request(operation: &'a str, caller: Option<&'a str>, mut input: Value) -> Self {
        redact(&mut input);
        Self::Request {
            at: Utc::now(),
            operation,
            caller,
            input,
        }
    }

    /// Build a response record from an HTTP status code and, for failures,
    /// the error kind the caller was given.
    #[must_use]
    pub fn response(
        operation: &'a str,
        caller: Option<&'a str>,
        status: u16,
        failure: Option<&'a str>,
    ) -> Self {
        Self::Response {
            at: Utc::now(),
            operation,
            caller,
            status,
            outcome: Outcome::classify(status),
            failure,
        }
    }
}

/// Coarse outcome classification stored with every response record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Rejected,
    Failed,
}

impl Outcome {
    /// Classify an HTTP status: 2xx/3xx succeeded, 4xx was rejected by a
    /// guard or validation, 5xx failed inside the system.
    #[must_use]
    pub const fn classify(status: u16) -> Self {
        match status {
            0..400 => Self::Success,
            400..500 => Self::Rejected,
            _ => Self::Failed,
        }
    }
}

/// Recursively replace credential-ish values so plaintext secrets never
/// reach the log.
pub fn redact(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, entry) in map.iter_mut() {
                let lower = key.to_lowercase();
                if SENSITIVE_KEYS.iter().any(|k| lower.contains(k)) {
                    *entry = Value::String(REDACTED.to_owned());
                } else {
                    redact(entry);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                redact(item);
            }
        }
        _ => {}
    }
}

/// Cloneable handle to the audit sink.
#[derive(Clone)]
pub struct AuditLog {
    file: Option<Arc<Mutex<tokio::fs::File>>>,
}

impl AuditLog {
    /// An audit log that only emits tracing events (no file sink).
    #[must_use]
    pub const fn tracing_only() -> Self {
        Self { file: None }
    }

    /// Open (or create) the append-only file sink at `path`.
    ///
    /// # Errors
    ///
    /// Returns `std::io::Error` if the file cannot be opened for append.
    pub async fn open(path: &Path) -> std::io::Result<Self> {
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;

        Ok(Self {
            file: Some(Arc::new(Mutex::new(file))),
        })
    }

    /// Build the sink from configuration: file-backed when a path is set,
    /// tracing-only otherwise.
    ///
    /// # Errors
    ///
    /// Returns `std::io::Error` if the configured file cannot be opened.
    pub async fn from_config(path: Option<&Path>) -> std::io::Result<Self> {
        match path {
            Some(path) => Self::open(path).await,
            None => Ok(Self::tracing_only()),
        }
    }

    /// Append one record.
    ///
    /// Never returns an error: serialization or write failures are logged
    /// at `warn` and dropped so the audited operation is unaffected.
    pub async fn record(&self, event: &AuditEvent<'_>) {
        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(err) => {
                tracing::warn!(target: "audit", error = %err, "failed to serialize audit record");
                return;
            }
        };

        tracing::info!(target: "audit", record = %line);

        if let Some(file) = &self.file {
            let mut file = file.lock().await;
            let write = async {
                file.write_all(line.as_bytes()).await?;
                file.write_all(b"\n").await
            };
            if let Err(err) = write.await {
                tracing::warn!(target: "audit", error = %err, "failed to append audit record");
            }
        }
    }
}

impl std::fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLog")
            .field("file_backed", &self.file.is_some())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_redact_top_level_password() {
        let mut value = json!({"username": "maya", "password": "hunter2"});
        redact(&mut value);
        assert_eq!(value["username"], "maya");
        assert_eq!(value["password"], REDACTED);
    }

    #[test]
    fn test_redact_nested_and_arrays() {
        let mut value = json!({
            "accounts": [
                {"name": "a", "api_token": "t1"},
                {"name": "b", "client_secret": "s1"}
            ],
            "meta": {"Authorization": "Basic abc"}
        });
        redact(&mut value);
        assert_eq!(value["accounts"][0]["api_token"], REDACTED);
        assert_eq!(value["accounts"][1]["client_secret"], REDACTED);
        assert_eq!(value["meta"]["Authorization"], REDACTED);
        assert_eq!(value["accounts"][0]["name"], "a");
    }

    #[test]
    fn test_redact_leaves_scalars_alone() {
        let mut value = json!("just a string");
        redact(&mut value);
        assert_eq!(value, "just a string");
    }

    #[test]
    fn test_outcome_classification() {
        assert_eq!(Outcome::classify(200), Outcome::Success);
        assert_eq!(Outcome::classify(201), Outcome::Success);
        assert_eq!(Outcome::classify(303), Outcome::Success);
        assert_eq!(Outcome::classify(404), Outcome::Rejected);
        assert_eq!(Outcome::classify(409), Outcome::Rejected);
        assert_eq!(Outcome::classify(500), Outcome::Failed);
    }

    #[test]
    fn test_response_event_carries_failure_kind() {
        let event = AuditEvent::response("POST /sales/purchase", Some("maya"), 409, Some("conflict"));
        let line = serde_json::to_string(&event).unwrap();
        assert!(line.contains("\"outcome\":\"rejected\""));
        assert!(line.contains("\"failure\":\"conflict\""));

        let success = AuditEvent::response("GET /products", None, 200, None);
        let line = serde_json::to_string(&success).unwrap();
        assert!(!line.contains("failure"));
        assert!(!line.contains("caller"));
    }

    #[test]
    fn test_request_event_redacts_input() {
        let event = AuditEvent::request(
            "POST /accounts/register",
            None,
            json!({"username": "maya", "password": "hunter2"}),
        );
        let line = serde_json::to_string(&event).unwrap();
        assert!(line.contains("\"maya\""));
        assert!(!line.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_file_sink_appends_json_lines() {
        let path = std::env::temp_dir().join(format!("audit-{}.jsonl", uuid::Uuid::new_v4()));
        let log = AuditLog::open(&path).await.unwrap();

        log.record(&AuditEvent::request("GET /products", None, Value::Null))
            .await;
        log.record(&AuditEvent::response("GET /products", None, 200, None))
            .await;

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let parsed: Value = serde_json::from_str(line).unwrap();
            assert_eq!(parsed["operation"], "GET /products");
        }

        tokio::fs::remove_file(&path).await.unwrap();
    }
}
