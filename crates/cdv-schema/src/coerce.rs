//! # Cell Type Coercion
//!
//! Converts one raw CSV cell into a value of the type its schema property
//! declares. Coercion never fails: input that cannot be converted degrades
//! to `null`, which the projector drops so the structural evaluator can
//! report it as a `required` or `type` violation.
//!
//! | declared type | conversion |
//! |---------------|------------|
//! | `string` | unchanged |
//! | `integer` | base-10 integer; a decimal such as `3.7` stays a number |
//! | `number` | integer when exact, otherwise finite float |
//! | `boolean` | `true`/`yes`/`1`, `false`/`no`/`0`, case-insensitive |
//! | `array` | split on the delimiter, trim, coerce each item |
//! | other / none | unchanged |

use cdv_core::EMPTY_QUOTED;
use serde_json::{Number, Value};

use crate::node;

/// Result of coercing one cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    /// The converted value; `Value::Null` when conversion failed.
    Value(Value),
    /// The cell held the empty-quote marker. The field is left out of the
    /// processed row and reported as a warning.
    EmptyQuoted,
}

impl Coerced {
    /// The converted value, if any.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Value(v) => Some(v),
            Self::EmptyQuoted => None,
        }
    }
}

/// Schema-directed cell coercer.
///
/// Holds the schema root so `$ref`s inside `items` can be followed.
#[derive(Debug, Clone, Copy)]
pub struct CellCoercer<'s> {
    root: &'s Value,
}

impl<'s> CellCoercer<'s> {
    /// Create a coercer for cells belonging to `root`.
    pub fn new(root: &'s Value) -> Self {
        Self { root }
    }

    /// Coerce a raw cell according to its property schema.
    ///
    /// `property` is `None` when the column does not resolve to a schema
    /// property; such cells pass through as strings.
    pub fn coerce(&self, raw: Option<&str>, property: Option<&Value>) -> Coerced {
        if raw == Some(EMPTY_QUOTED) {
            return Coerced::EmptyQuoted;
        }

        let property = property.map(|p| node::resolve_ref(self.root, p));
        let declared = property.and_then(node::declared_type);

        let raw = match raw {
            Some(raw) if !raw.is_empty() => raw,
            _ => {
                return Coerced::Value(if declared == Some("string") {
                    Value::String(String::new())
                } else {
                    Value::Null
                });
            }
        };

        let Some(property) = property else {
            return Coerced::Value(Value::String(raw.to_string()));
        };

        let value = match declared {
            Some("integer") => parse_integer(raw),
            Some("number") => parse_number(raw),
            Some("boolean") => parse_boolean(raw),
            Some("array") => self.split_array(raw, property),
            _ => Value::String(raw.to_string()),
        };
        Coerced::Value(value)
    }

    fn split_array(&self, raw: &str, property: &Value) -> Value {
        let delimiter = node::array_delimiter(property);
        let items = node::items(self.root, property);
        let items_are_strings = items.and_then(node::declared_type) == Some("string");

        let values = raw
            .split(delimiter)
            .map(str::trim)
            .filter(|segment| *segment != EMPTY_QUOTED)
            .filter(|segment| items_are_strings || !segment.is_empty())
            .filter_map(|segment| self.coerce(Some(segment), items).into_value())
            .collect();
        Value::Array(values)
    }
}

fn parse_integer(raw: &str) -> Value {
    let trimmed = raw.trim();
    if let Some(exact) = exact_integer(trimmed) {
        return exact;
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            Value::Number((f as i64).into())
        }
        Ok(f) => float_value(f),
        Err(_) => Value::Null,
    }
}

fn parse_number(raw: &str) -> Value {
    let trimmed = raw.trim();
    if let Some(exact) = exact_integer(trimmed) {
        return exact;
    }
    trimmed.parse::<f64>().map(float_value).unwrap_or(Value::Null)
}

/// Integer literals that fit `i64` or `u64`, kept without a detour
/// through `f64`.
fn exact_integer(trimmed: &str) -> Option<Value> {
    if let Ok(i) = trimmed.parse::<i64>() {
        return Some(Value::Number(i.into()));
    }
    trimmed.parse::<u64>().ok().map(|u| Value::Number(u.into()))
}

fn float_value(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

fn parse_boolean(raw: &str) -> Value {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Value::Bool(true),
        "false" | "no" | "0" => Value::Bool(false),
        _ => Value::Null,
    }
}
