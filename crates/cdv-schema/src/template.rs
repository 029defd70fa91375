//! # CSV Templates
//!
//! Generates a CSV template (header row plus one sample row) from a
//! schema, so data providers start from columns the validator understands.
//!
//! Flattening rules match what the row projector accepts:
//! - nested objects become dotted columns (`address.city`);
//! - arrays of objects expose their item properties (`images.url`);
//! - arrays of scalars stay one column, joined with their delimiter.

use serde_json::Value;
use thiserror::Error;

use crate::node;

/// Template generation failed.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// The CSV writer rejected a record.
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    /// The CSV writer could not be flushed into a string.
    #[error("CSV flush error: {0}")]
    Flush(String),
}

/// One column of a flattened schema.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateColumn {
    /// Dotted column header.
    pub header: String,
    /// Leaf schema of the column.
    pub schema: Value,
}

/// Flatten a schema into template columns, in declaration order.
pub fn flatten_schema(schema: &Value) -> Vec<TemplateColumn> {
    let mut columns = Vec::new();
    flatten_into(schema, schema, "", &mut columns);
    columns
}

fn flatten_into(root: &Value, node: &Value, prefix: &str, out: &mut Vec<TemplateColumn>) {
    let node = node::resolve_ref(root, node);
    let Some(properties) = node.get("properties").and_then(Value::as_object) else {
        return;
    };

    for (key, property) in properties {
        let property = node::resolve_ref(root, property);
        let header = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };

        if property.get("properties").is_some() {
            flatten_into(root, property, &header, out);
        } else if node::is_array_of_objects(root, property) {
            match node::items(root, property) {
                Some(items) if items.get("properties").is_some() => {
                    flatten_into(root, items, &header, out)
                }
                _ => out.push(TemplateColumn {
                    header,
                    schema: property.clone(),
                }),
            }
        } else {
            out.push(TemplateColumn {
                header,
                schema: property.clone(),
            });
        }
    }
}

/// Sample cell for a column: the first of `examples`, `default`, `enum`,
/// or `const` that is present, rendered as CSV text.
pub fn sample_value(column: &TemplateColumn) -> String {
    let schema = &column.schema;
    let sample = schema
        .get("examples")
        .and_then(Value::as_array)
        .and_then(|examples| examples.first())
        .or_else(|| schema.get("default"))
        .or_else(|| {
            schema
                .get("enum")
                .and_then(Value::as_array)
                .and_then(|values| values.first())
        })
        .or_else(|| schema.get("const"));

    match sample {
        Some(Value::Array(items)) => items
            .iter()
            .map(render_scalar)
            .collect::<Vec<_>>()
            .join(node::array_delimiter(schema)),
        Some(value) => render_scalar(value),
        None => String::new(),
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null | Value::Object(_) | Value::Array(_) => String::new(),
        other => other.to_string(),
    }
}

/// Generate a CSV template for a schema.
///
/// # Errors
///
/// Returns [`TemplateError`] if the CSV writer fails.
pub fn generate_template(schema: &Value) -> Result<String, TemplateError> {
    let columns = flatten_schema(schema);
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(columns.iter().map(|c| c.header.as_str()))?;
    writer.write_record(columns.iter().map(sample_value))?;
    let bytes = writer
        .into_inner()
        .map_err(|e| TemplateError::Flush(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| TemplateError::Flush(e.to_string()))
}
