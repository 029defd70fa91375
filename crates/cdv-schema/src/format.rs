//! # Diagnostic Formatting
//!
//! Turns [`RawViolation`]s into row-scoped [`ValidationIssue`]s whose
//! messages carry enough schema context to fix the cell: the full list of
//! required properties, the allowed enum values, the expected type, or the
//! allowed property names.
//!
//! Property names come from the violation's instance path with the leading
//! `/` removed (`/address/city` becomes `address/city`); the root is shown
//! as `(root)`. For `required` and `additionalProperties` the named
//! property is appended to the parent path.

use cdv_core::ValidationIssue;
use serde_json::Value;

use crate::node;
use crate::structural::{CheckOutcome, Keyword, RawViolation, ViolationParams};

/// Property name used when the evaluator reports failure without details.
pub const UNKNOWN_PROPERTY: &str = "Unknown";

/// Message used when the evaluator reports failure without details.
pub const UNKNOWN_FAILURE_MESSAGE: &str = "Validation failed for an unknown reason.";

/// Property name of the diagnostic emitted when a row cannot be projected.
pub const ROW_CONVERSION_PROPERTY: &str = "Row Conversion";

const ROOT_PROPERTY: &str = "(root)";

/// Formats violations against one schema.
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticFormatter<'s> {
    schema: &'s Value,
}

impl<'s> DiagnosticFormatter<'s> {
    /// Create a formatter for `schema`.
    pub fn new(schema: &'s Value) -> Self {
        Self { schema }
    }

    /// Format every violation of a check. A failed check with no
    /// violations yields a single generic diagnostic.
    pub fn format_outcome(&self, outcome: &CheckOutcome) -> Vec<ValidationIssue> {
        if outcome.valid {
            return Vec::new();
        }
        if outcome.violations.is_empty() {
            return vec![ValidationIssue::new(UNKNOWN_PROPERTY, UNKNOWN_FAILURE_MESSAGE)];
        }
        outcome.violations.iter().map(|v| self.format(v)).collect()
    }

    /// Format one violation.
    pub fn format(&self, violation: &RawViolation) -> ValidationIssue {
        match (&violation.keyword, &violation.params) {
            (Keyword::Required, ViolationParams::MissingProperty(name)) => {
                let required = self.required_list(violation);
                ValidationIssue::new(
                    child_path(&violation.instance_path, name),
                    format!(
                        "Required property '{name}' is missing. Required properties are: [{}].",
                        required.join(", ")
                    ),
                )
            }
            (Keyword::Type, ViolationParams::ExpectedTypes(types)) if !types.is_empty() => {
                let property = property_name(&violation.instance_path);
                let message = format!("{property}: must be type '{}'.", types.join(", "));
                ValidationIssue::new(property, message)
            }
            (Keyword::Enum, ViolationParams::AllowedValues(values)) => {
                let property = property_name(&violation.instance_path);
                let allowed: Vec<String> = values.iter().map(display_value).collect();
                let message = format!(
                    "{property}: must be one of the allowed values. Allowed: [{}].",
                    allowed.join(", ")
                );
                ValidationIssue::new(property, message)
            }
            (Keyword::AdditionalProperties, ViolationParams::UnexpectedProperty(name)) => {
                let allowed = self.allowed_properties(violation);
                ValidationIssue::new(
                    child_path(&violation.instance_path, name),
                    format!(
                        "Property '{name}' is not allowed. Allowed properties are: [{}].",
                        allowed.join(", ")
                    ),
                )
            }
            _ => {
                let property = property_name(&violation.instance_path);
                let message = if mentions(&violation.message, &property) {
                    violation.message.clone()
                } else {
                    format!("{property}: {}", violation.message)
                };
                ValidationIssue::new(property, message)
            }
        }
    }

    /// Diagnostic for a row that could not be projected at all.
    pub fn row_conversion(error: &dyn std::fmt::Display) -> ValidationIssue {
        ValidationIssue::new(
            ROW_CONVERSION_PROPERTY,
            format!("Failed to process row before validation: {error}"),
        )
    }

    fn required_list(&self, violation: &RawViolation) -> Vec<String> {
        node::lookup_location(self.schema, &violation.keyword_location)
            .filter(|v| v.is_array())
            .or_else(|| self.schema.get("required"))
            .and_then(Value::as_array)
            .map(|names| names.iter().map(display_value).collect())
            .unwrap_or_default()
    }

    fn allowed_properties(&self, violation: &RawViolation) -> Vec<String> {
        let parent_location = violation
            .keyword_location
            .strip_suffix("/additionalProperties")
            .unwrap_or("");
        node::lookup_location(self.schema, parent_location)
            .map(|parent| node::resolve_ref(self.schema, parent))
            .and_then(|parent| parent.get("properties"))
            .and_then(Value::as_object)
            .map(|props| props.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// Property name for an instance path.
fn property_name(instance_path: &str) -> String {
    match instance_path.strip_prefix('/').unwrap_or(instance_path) {
        "" => ROOT_PROPERTY.to_string(),
        path => path.to_string(),
    }
}

/// Name of a property under the object at `instance_path`.
fn child_path(instance_path: &str, name: &str) -> String {
    match instance_path.strip_prefix('/').unwrap_or(instance_path) {
        "" => name.to_string(),
        parent => format!("{parent}/{name}"),
    }
}

/// Whether `message` names `property` as a whole word, so `a` is not
/// found inside "characters".
fn mentions(message: &str, property: &str) -> bool {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    message.match_indices(property).any(|(start, _)| {
        let before = message[..start].chars().next_back();
        let after = message[start + property.len()..].chars().next();
        !before.is_some_and(is_word) && !after.is_some_and(is_word)
    })
}

/// Render a schema value for a message: strings without quotes, anything
/// else as JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
