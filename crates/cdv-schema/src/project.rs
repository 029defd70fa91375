//! # Row Projection
//!
//! Turns a flat CSV [`Row`] into the nested object the schema describes.
//! Every cell is coerced through [`CellCoercer`] using the sub-schema its
//! (possibly dotted) column name resolves to, then written at the matching
//! nested path.
//!
//! - `address.city` writes `{"address": {"city": ...}}`.
//! - When a segment is an array of objects, nested columns share its first
//!   element: `images.url` and `images.altText` write
//!   `{"images": [{"url": ..., "altText": ...}]}`.
//! - Empty-quoted cells are left out and reported as warnings.
//! - Null results are left out so the evaluator can flag them.

use cdv_core::{Row, ValidationIssue};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::coerce::{CellCoercer, Coerced};
use crate::node::{self, ResolvedSegment};
use crate::structural::{CheckOutcome, Keyword, RawViolation, ViolationParams};

/// Warning text for a cell holding the empty-quote marker.
pub const EMPTY_QUOTED_WARNING: &str = "Field contains empty quoted value.";

/// A row could not be assembled into a nested object.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProjectionError {
    /// A dotted column descends through, or overwrites, a segment that
    /// already holds an incompatible value.
    #[error("column '{column}' conflicts with the value already stored at '{segment}'")]
    PathConflict {
        /// Column being written.
        column: String,
        /// Segment where the conflict was found.
        segment: String,
    },
}

/// A projected row and the warnings collected while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedRow {
    /// Nested, type-coerced object ready for structural validation.
    pub processed: Value,
    /// Per-field warnings (empty-quoted cells).
    pub warnings: Vec<ValidationIssue>,
    /// JSON pointers of the fields left out because their cell held the
    /// empty-quote marker.
    pub empty_quoted: Vec<String>,
}

impl ProjectedRow {
    /// Whether `violation` reports a required property that is only
    /// missing because its cell held the empty-quote marker.
    pub fn omits(&self, violation: &RawViolation) -> bool {
        match (&violation.keyword, &violation.params) {
            (Keyword::Required, ViolationParams::MissingProperty(name)) => {
                let pointer = format!(
                    "{}/{}",
                    violation.instance_path,
                    node::escape_pointer_segment(name)
                );
                self.empty_quoted.contains(&pointer)
            }
            _ => false,
        }
    }

    /// Drop the `required` violations caused by empty-quoted cells. The
    /// outcome becomes valid when nothing else is left.
    pub fn settle(&self, mut outcome: CheckOutcome) -> CheckOutcome {
        if outcome.valid || self.empty_quoted.is_empty() || outcome.violations.is_empty() {
            return outcome;
        }
        outcome.violations.retain(|v| !self.omits(v));
        outcome.valid = outcome.violations.is_empty();
        outcome
    }
}

/// Projects rows onto one schema.
#[derive(Debug, Clone, Copy)]
pub struct RowProjector<'s> {
    schema: &'s Value,
    coercer: CellCoercer<'s>,
}

impl<'s> RowProjector<'s> {
    /// Create a projector for `schema`.
    pub fn new(schema: &'s Value) -> Self {
        Self {
            schema,
            coercer: CellCoercer::new(schema),
        }
    }

    /// Project one row.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::PathConflict`] when two columns of the
    /// row disagree about the shape of a nested path (e.g. `a` and `a.b`).
    pub fn project(&self, row: &Row) -> Result<ProjectedRow, ProjectionError> {
        let mut processed = Map::new();
        let mut warnings = Vec::new();
        let mut empty_quoted = Vec::new();

        for (column, raw) in row.iter() {
            let segments = node::resolve_column(self.schema, column);
            let property = segments.last().and_then(|s| s.schema);

            match self.coercer.coerce(raw, property) {
                Coerced::EmptyQuoted => {
                    warnings.push(ValidationIssue::new(column, EMPTY_QUOTED_WARNING));
                    empty_quoted.push(instance_pointer(&segments));
                }
                Coerced::Value(Value::Null) => {}
                Coerced::Value(value) => write_path(&mut processed, &segments, column, value)?,
            }
        }

        Ok(ProjectedRow {
            processed: Value::Object(processed),
            warnings,
            empty_quoted,
        })
    }
}

/// JSON pointer a column would be written at. Arrays of objects are
/// entered through their first element.
fn instance_pointer(segments: &[ResolvedSegment<'_>]) -> String {
    let mut pointer = String::new();
    let last = segments.len().saturating_sub(1);
    for (i, segment) in segments.iter().enumerate() {
        pointer.push('/');
        pointer.push_str(&node::escape_pointer_segment(segment.name));
        if i < last && segment.array_of_objects {
            pointer.push_str("/0");
        }
    }
    pointer
}

fn write_path(
    target: &mut Map<String, Value>,
    segments: &[ResolvedSegment<'_>],
    column: &str,
    value: Value,
) -> Result<(), ProjectionError> {
    let conflict = |segment: &str| ProjectionError::PathConflict {
        column: column.to_string(),
        segment: segment.to_string(),
    };

    let Some((leaf, parents)) = segments.split_last() else {
        return Ok(());
    };

    let mut current = target;
    for segment in parents {
        let slot = current
            .entry(segment.name.to_string())
            .or_insert_with(|| {
                if segment.array_of_objects {
                    Value::Array(vec![Value::Object(Map::new())])
                } else {
                    Value::Object(Map::new())
                }
            });
        current = match slot {
            Value::Object(map) => map,
            Value::Array(elements) => {
                if !segment.array_of_objects {
                    return Err(conflict(segment.name));
                }
                if elements.is_empty() {
                    elements.push(Value::Object(Map::new()));
                }
                match elements.first_mut() {
                    Some(Value::Object(map)) => map,
                    _ => return Err(conflict(segment.name)),
                }
            }
            _ => return Err(conflict(segment.name)),
        };
    }

    if current.get(leaf.name).is_some_and(Value::is_object) {
        return Err(conflict(leaf.name));
    }
    current.insert(leaf.name.to_string(), value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Value {
        json!({
            "type": "object",
            "required": ["name", "email", "age"],
            "properties": {
                "name": {"type": "string"},
                "email": {"type": "string", "format": "email"},
                "age": {"type": "integer"},
                "active": {"type": "boolean"},
                "tags": {"type": "array", "items": {"type": "string"}},
                "address": {
                    "type": "object",
                    "properties": {
                        "city": {"type": "string"},
                        "zip": {"type": "integer"}
                    }
                },
                "images": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "url": {"type": "string"},
                            "width": {"type": "integer"}
                        }
                    }
                }
            }
        })
    }

    fn row(cells: &[(&str, &str)]) -> Row {
        cells.iter().copied().collect()
    }

    #[test]
    fn coerces_top_level_fields() {
        let schema = schema();
        let projected = RowProjector::new(&schema)
            .project(&row(&[("name", "Ann"), ("age", "30"), ("active", "yes")]))
            .unwrap();
        assert_eq!(
            projected.processed,
            json!({"name": "Ann", "age": 30, "active": true})
        );
        assert!(projected.warnings.is_empty());
    }

    #[test]
    fn nests_dotted_columns() {
        let schema = schema();
        let projected = RowProjector::new(&schema)
            .project(&row(&[("address.city", "Montreal"), ("address.zip", "12345")]))
            .unwrap();
        assert_eq!(
            projected.processed,
            json!({"address": {"city": "Montreal", "zip": 12345}})
        );
    }

    #[test]
    fn array_of_object_columns_share_one_element() {
        let schema = schema();
        let projected = RowProjector::new(&schema)
            .project(&row(&[("images.url", "https://x/y.jpg"), ("images.width", "1200")]))
            .unwrap();
        assert_eq!(
            projected.processed,
            json!({"images": [{"url": "https://x/y.jpg", "width": 1200}]})
        );
    }

    #[test]
    fn empty_quoted_cell_warns_and_is_omitted() {
        let schema = schema();
        let projected = RowProjector::new(&schema)
            .project(&row(&[("name", "Ann"), ("age", "\"\"")]))
            .unwrap();
        assert_eq!(projected.processed, json!({"name": "Ann"}));
        assert_eq!(
            projected.warnings,
            vec![ValidationIssue::new("age", EMPTY_QUOTED_WARNING)]
        );
    }

    #[test]
    fn empty_quoted_required_field_is_not_missing() {
        let schema = schema();
        let projected = RowProjector::new(&schema)
            .project(&row(&[("name", "Ann"), ("age", "\"\""), ("images.url", "\"\"")]))
            .unwrap();
        assert_eq!(projected.empty_quoted, vec!["/age", "/images/0/url"]);

        let missing = |path: &str, name: &str| RawViolation {
            keyword: Keyword::Required,
            instance_path: path.to_string(),
            keyword_location: "/required".to_string(),
            params: ViolationParams::MissingProperty(name.to_string()),
            message: format!("\"{name}\" is a required property"),
        };
        assert!(projected.omits(&missing("", "age")));
        assert!(projected.omits(&missing("/images/0", "url")));
        assert!(!projected.omits(&missing("", "email")));

        let settled = projected.settle(CheckOutcome {
            valid: false,
            violations: vec![missing("", "age")],
        });
        assert_eq!(settled, CheckOutcome::valid());

        let settled = projected.settle(CheckOutcome {
            valid: false,
            violations: vec![missing("", "age"), missing("", "email")],
        });
        assert!(!settled.valid);
        assert_eq!(settled.violations, vec![missing("", "email")]);
    }

    #[test]
    fn failed_coercion_is_omitted() {
        let schema = schema();
        let projected = RowProjector::new(&schema)
            .project(&row(&[("age", "thirty"), ("active", "")]))
            .unwrap();
        assert_eq!(projected.processed, json!({}));
    }

    #[test]
    fn empty_string_kept_for_string_fields() {
        let schema = schema();
        let projected = RowProjector::new(&schema)
            .project(&row(&[("name", "")]))
            .unwrap();
        assert_eq!(projected.processed, json!({"name": ""}));
    }

    #[test]
    fn unknown_columns_pass_through_as_strings() {
        let schema = schema();
        let projected = RowProjector::new(&schema)
            .project(&row(&[("nickname", "A"), ("meta.source", "import")]))
            .unwrap();
        assert_eq!(
            projected.processed,
            json!({"nickname": "A", "meta": {"source": "import"}})
        );
    }

    #[test]
    fn conflicting_columns_fail() {
        let schema = schema();
        let err = RowProjector::new(&schema)
            .project(&row(&[("name", "Ann"), ("name.first", "A")]))
            .unwrap_err();
        assert_eq!(
            err,
            ProjectionError::PathConflict {
                column: "name.first".into(),
                segment: "name".into()
            }
        );

        let err = RowProjector::new(&schema)
            .project(&row(&[("address.city", "X"), ("address", "Y")]))
            .unwrap_err();
        assert!(matches!(err, ProjectionError::PathConflict { .. }));
    }

    #[test]
    fn null_cells_are_omitted() {
        let schema = schema();
        let mut r = Row::new();
        r.insert("age", None);
        r.insert("name", None);
        let projected = RowProjector::new(&schema).project(&r).unwrap();
        assert_eq!(projected.processed, json!({"name": ""}));
    }
}
