//! # Error Types
//!
//! Errors raised while preparing validator inputs. Everything that goes
//! wrong *inside* a row is a diagnostic, not an error; the types here cover
//! the cases where there is nothing to validate yet.

use thiserror::Error;

/// Top-level error type for input preparation.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Schema text could not be parsed as JSON. Callers must surface this
    /// before submitting a validation request.
    #[error("schema parse error in {source_name}: {reason}")]
    SchemaParse {
        /// Schema name or path the text came from.
        source_name: String,
        /// Parser message, including line and column.
        reason: String,
    },

    /// The parsed schema document is not a JSON object.
    #[error("schema {0} is not a JSON object")]
    SchemaNotObject(String),
}

/// Parse schema text into a JSON value, failing fast on malformed input.
///
/// `source_name` is used only for the error message.
pub fn parse_schema_text(
    source_name: &str,
    text: &str,
) -> Result<serde_json::Value, CoreError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| CoreError::SchemaParse {
            source_name: source_name.to_string(),
            reason: e.to_string(),
        })?;
    if !value.is_object() {
        return Err(CoreError::SchemaNotObject(source_name.to_string()));
    }
    Ok(value)
}
