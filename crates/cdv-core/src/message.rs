//! # Worker Wire Protocol
//!
//! Messages exchanged between a caller and the background validation
//! worker. Both directions use an adjacently tagged shape:
//!
//! ```text
//! request:  { "type": "validate",     "payload": { "csvData": [...], "parsedSchema": {...} } }
//! response: { "type": "resultsBatch", "payload": { "results": [...] } }      (zero or more)
//!           { "type": "complete",     "payload": { "totalErrors": n, "totalWarnings": m } }
//!        or { "type": "error",        "payload": { "message": "..." } }       (exactly one)
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::diagnostic::{RowResult, RunSummary};
use crate::row::Row;

/// A request sent to the validation worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum WorkerRequest {
    /// Validate a set of rows against a parsed schema.
    Validate(ValidatePayload),
}

impl WorkerRequest {
    /// Build a validate request.
    pub fn validate(csv_data: Vec<Row>, parsed_schema: Value) -> Self {
        Self::Validate(ValidatePayload {
            csv_data,
            parsed_schema,
        })
    }
}

/// Payload of a [`WorkerRequest::Validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatePayload {
    /// Header-keyed rows in CSV order.
    pub csv_data: Vec<Row>,
    /// The schema as a parsed JSON document (never schema text).
    pub parsed_schema: Value,
}

/// A message emitted by the validation worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum WorkerMessage {
    /// A bounded batch of row results, in input row order.
    ResultsBatch {
        /// Row results with at least one issue.
        results: Vec<RowResult>,
    },
    /// The run finished; totals of individual diagnostics.
    Complete(RunSummary),
    /// The run was abandoned.
    Error {
        /// Reason the run was abandoned.
        message: String,
    },
}

impl WorkerMessage {
    /// Build an error message.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Whether this message ends a run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete(_) | Self::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::ValidationIssue;
    use serde_json::json;

    #[test]
    fn request_parses_from_wire_shape() {
        let wire = json!({
            "type": "validate",
            "payload": {
                "csvData": [{"name": "Ann", "age": "30"}],
                "parsedSchema": {"type": "object"}
            }
        });
        let request: WorkerRequest = serde_json::from_value(wire).unwrap();
        let WorkerRequest::Validate(payload) = request;
        assert_eq!(payload.csv_data.len(), 1);
        assert_eq!(payload.csv_data[0].get("age"), Some(Some("30")));
        assert_eq!(payload.parsed_schema["type"], "object");
    }

    #[test]
    fn batch_message_wire_shape() {
        let msg = WorkerMessage::ResultsBatch {
            results: vec![RowResult {
                row: 2,
                errors: vec![ValidationIssue::new("email", "missing")],
                warnings: vec![],
            }],
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "type": "resultsBatch",
                "payload": {"results": [{
                    "row": 2,
                    "errors": [{"property": "email", "message": "missing"}],
                    "warnings": []
                }]}
            })
        );
        assert!(!msg.is_terminal());
    }

    #[test]
    fn terminal_messages_wire_shape() {
        let complete = WorkerMessage::Complete(RunSummary {
            total_errors: 4,
            total_warnings: 0,
        });
        assert_eq!(
            serde_json::to_value(&complete).unwrap(),
            json!({"type": "complete", "payload": {"totalErrors": 4, "totalWarnings": 0}})
        );
        assert!(complete.is_terminal());

        let error = WorkerMessage::error("schema did not compile");
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!({"type": "error", "payload": {"message": "schema did not compile"}})
        );
        assert!(error.is_terminal());
    }
}
