//! # Structural Validation
//!
//! Runs processed rows through a JSON Schema evaluator and reports every
//! violation for a row in one pass.
//!
//! ## Design
//!
//! The evaluator is a seam: [`SchemaEvaluator`] compiles a schema into a
//! [`CompiledSchema`], which checks instances and returns
//! [`RawViolation`]s. [`JsonSchemaEvaluator`] implements it with the
//! `jsonschema` crate; any other conformant engine can be substituted.
//!
//! [`StructuralValidator`] wraps an evaluator with a single-slot compile
//! cache: re-using the same schema value skips compilation, a different
//! value replaces the cached entry.

use std::sync::Arc;

use jsonschema::error::ValidationErrorKind;
use serde_json::Value;
use thiserror::Error;

use crate::node;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// The schema itself is malformed (bad regex, unresolvable `$ref`, ...).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("schema compilation failed: {reason}")]
pub struct SchemaCompilationError {
    /// Evaluator's description of the problem.
    pub reason: String,
}

impl SchemaCompilationError {
    /// Build from any displayable reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Violation records
// ---------------------------------------------------------------------------

/// JSON Schema keyword that produced a violation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Keyword {
    Required,
    Type,
    Enum,
    Const,
    Pattern,
    Format,
    Minimum,
    Maximum,
    ExclusiveMinimum,
    ExclusiveMaximum,
    MinLength,
    MaxLength,
    MinItems,
    MaxItems,
    UniqueItems,
    AdditionalProperties,
    /// Any keyword without dedicated handling.
    Other(String),
}

impl Keyword {
    /// Map a keyword name as it appears in a schema.
    pub fn from_name(name: &str) -> Self {
        match name {
            "required" => Self::Required,
            "type" => Self::Type,
            "enum" => Self::Enum,
            "const" => Self::Const,
            "pattern" => Self::Pattern,
            "format" => Self::Format,
            "minimum" => Self::Minimum,
            "maximum" => Self::Maximum,
            "exclusiveMinimum" => Self::ExclusiveMinimum,
            "exclusiveMaximum" => Self::ExclusiveMaximum,
            "minLength" => Self::MinLength,
            "maxLength" => Self::MaxLength,
            "minItems" => Self::MinItems,
            "maxItems" => Self::MaxItems,
            "uniqueItems" => Self::UniqueItems,
            "additionalProperties" => Self::AdditionalProperties,
            other => Self::Other(other.to_string()),
        }
    }

    /// Keyword name as written in a schema.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Required => "required",
            Self::Type => "type",
            Self::Enum => "enum",
            Self::Const => "const",
            Self::Pattern => "pattern",
            Self::Format => "format",
            Self::Minimum => "minimum",
            Self::Maximum => "maximum",
            Self::ExclusiveMinimum => "exclusiveMinimum",
            Self::ExclusiveMaximum => "exclusiveMaximum",
            Self::MinLength => "minLength",
            Self::MaxLength => "maxLength",
            Self::MinItems => "minItems",
            Self::MaxItems => "maxItems",
            Self::UniqueItems => "uniqueItems",
            Self::AdditionalProperties => "additionalProperties",
            Self::Other(name) => name,
        }
    }
}

/// Keyword-specific parameters of a violation.
#[derive(Debug, Clone, PartialEq)]
pub enum ViolationParams {
    /// `required`: the property that is missing.
    MissingProperty(String),
    /// `additionalProperties`: the property that is not allowed.
    UnexpectedProperty(String),
    /// `enum` / `const`: the allowed values.
    AllowedValues(Vec<Value>),
    /// `type`: the accepted type names.
    ExpectedTypes(Vec<String>),
    /// Numeric, length, and item-count bounds.
    Limit(Value),
    /// `pattern`: the declared regular expression.
    Pattern(String),
    /// `format`: the declared format name.
    Format(String),
    /// Nothing beyond the message.
    None,
}

/// One structural violation as reported by the evaluator.
#[derive(Debug, Clone, PartialEq)]
pub struct RawViolation {
    /// Violated keyword.
    pub keyword: Keyword,
    /// JSON pointer into the processed row (empty for the root).
    pub instance_path: String,
    /// Schema location ending at the violated keyword.
    pub keyword_location: String,
    /// Keyword-specific parameters.
    pub params: ViolationParams,
    /// Evaluator's default message.
    pub message: String,
}

/// Result of checking one instance.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CheckOutcome {
    /// Whether the instance conforms.
    pub valid: bool,
    /// Every violation found; may be empty even when `valid` is false.
    pub violations: Vec<RawViolation>,
}

impl CheckOutcome {
    /// A conforming instance.
    pub fn valid() -> Self {
        Self {
            valid: true,
            violations: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluator seam
// ---------------------------------------------------------------------------

/// A schema compiled once and checked against many instances.
pub trait CompiledSchema: Send + Sync {
    /// Check an instance, collecting all violations without short-circuit.
    fn check(&self, instance: &Value) -> CheckOutcome;
}

/// A JSON Schema engine.
pub trait SchemaEvaluator: Send + Sync {
    /// The compiled form produced by this engine.
    type Compiled: CompiledSchema;

    /// Compile a schema.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaCompilationError`] if the schema itself is invalid.
    fn compile(&self, schema: &Value) -> Result<Self::Compiled, SchemaCompilationError>;
}

// ---------------------------------------------------------------------------
// jsonschema-backed evaluator
// ---------------------------------------------------------------------------

/// [`SchemaEvaluator`] backed by the `jsonschema` crate.
#[derive(Debug, Clone, Copy)]
pub struct JsonSchemaEvaluator {
    draft: Option<jsonschema::Draft>,
    validate_formats: bool,
}

impl Default for JsonSchemaEvaluator {
    fn default() -> Self {
        Self {
            draft: None,
            validate_formats: true,
        }
    }
}

impl JsonSchemaEvaluator {
    /// Evaluator that auto-detects the draft from `$schema` and asserts
    /// `format`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Force a specific draft instead of auto-detection.
    pub fn with_draft(mut self, draft: jsonschema::Draft) -> Self {
        self.draft = Some(draft);
        self
    }

    /// Enable or disable `format` assertions.
    pub fn with_format_validation(mut self, enabled: bool) -> Self {
        self.validate_formats = enabled;
        self
    }
}

impl SchemaEvaluator for JsonSchemaEvaluator {
    type Compiled = JsonSchemaCompiled;

    fn compile(&self, schema: &Value) -> Result<Self::Compiled, SchemaCompilationError> {
        let built = match self.draft {
            Some(draft) => jsonschema::options()
                .with_draft(draft)
                .should_validate_formats(self.validate_formats)
                .build(schema),
            None => jsonschema::options()
                .should_validate_formats(self.validate_formats)
                .build(schema),
        };
        let validator = built.map_err(|e| SchemaCompilationError::new(e.to_string()))?;
        Ok(JsonSchemaCompiled {
            validator,
            schema: schema.clone(),
        })
    }
}

/// A schema compiled by [`JsonSchemaEvaluator`].
pub struct JsonSchemaCompiled {
    validator: jsonschema::Validator,
    schema: Value,
}

impl std::fmt::Debug for JsonSchemaCompiled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonSchemaCompiled")
            .field("schema_id", &self.schema.get("$id"))
            .finish()
    }
}

impl CompiledSchema for JsonSchemaCompiled {
    fn check(&self, instance: &Value) -> CheckOutcome {
        if self.validator.is_valid(instance) {
            return CheckOutcome::valid();
        }
        let violations = self
            .validator
            .iter_errors(instance)
            .flat_map(|err| self.violations_from(err))
            .collect();
        CheckOutcome {
            valid: false,
            violations,
        }
    }
}

impl JsonSchemaCompiled {
    fn violations_from(&self, err: jsonschema::ValidationError<'_>) -> Vec<RawViolation> {
        let instance_path = err.instance_path.to_string();
        let (keyword_name, keyword_location) = keyword_of(&err.schema_path.to_string());
        let message = err.to_string();

        match &err.kind {
            ValidationErrorKind::Required { property } => {
                let name = property
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| property.to_string());
                vec![RawViolation {
                    keyword: Keyword::Required,
                    instance_path,
                    keyword_location,
                    params: ViolationParams::MissingProperty(name),
                    message,
                }]
            }
            ValidationErrorKind::AdditionalProperties { unexpected } => unexpected
                .iter()
                .map(|name| RawViolation {
                    keyword: Keyword::AdditionalProperties,
                    instance_path: instance_path.clone(),
                    keyword_location: keyword_location.clone(),
                    params: ViolationParams::UnexpectedProperty(name.clone()),
                    message: message.clone(),
                })
                .collect(),
            _ => {
                let keyword = Keyword::from_name(&keyword_name);
                let params = node::lookup_location(&self.schema, &keyword_location)
                    .map(|value| params_for(&keyword, value))
                    .unwrap_or(ViolationParams::None);
                vec![RawViolation {
                    keyword,
                    instance_path,
                    keyword_location,
                    params,
                    message,
                }]
            }
        }
    }
}

/// Split an evaluator schema path into the violated keyword and the
/// location ending at it. Trailing array indices are dropped.
fn keyword_of(schema_path: &str) -> (String, String) {
    let segments: Vec<&str> = schema_path.split('/').skip(1).collect();
    let Some(end) = segments
        .iter()
        .rposition(|s| !s.is_empty() && !s.bytes().all(|b| b.is_ascii_digit()))
    else {
        return (String::new(), schema_path.to_string());
    };
    let keyword = node::unescape_pointer_segment(segments[end]);
    let location = segments[..=end]
        .iter()
        .fold(String::new(), |mut acc, s| {
            acc.push('/');
            acc.push_str(s);
            acc
        });
    (keyword, location)
}

fn params_for(keyword: &Keyword, value: &Value) -> ViolationParams {
    match keyword {
        Keyword::Type => ViolationParams::ExpectedTypes(match value {
            Value::String(t) => vec![t.clone()],
            Value::Array(types) => types
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }),
        Keyword::Enum => ViolationParams::AllowedValues(
            value.as_array().cloned().unwrap_or_default(),
        ),
        Keyword::Const => ViolationParams::AllowedValues(vec![value.clone()]),
        Keyword::Pattern => value
            .as_str()
            .map(|p| ViolationParams::Pattern(p.to_string()))
            .unwrap_or(ViolationParams::None),
        Keyword::Format => value
            .as_str()
            .map(|f| ViolationParams::Format(f.to_string()))
            .unwrap_or(ViolationParams::None),
        Keyword::Minimum
        | Keyword::Maximum
        | Keyword::ExclusiveMinimum
        | Keyword::ExclusiveMaximum
        | Keyword::MinLength
        | Keyword::MaxLength
        | Keyword::MinItems
        | Keyword::MaxItems => ViolationParams::Limit(value.clone()),
        _ => ViolationParams::None,
    }
}

// ---------------------------------------------------------------------------
// StructuralValidator
// ---------------------------------------------------------------------------

struct CachedSchema<C> {
    schema: Value,
    compiled: Arc<C>,
}

/// An evaluator plus a single-slot compiled-schema cache.
pub struct StructuralValidator<E: SchemaEvaluator> {
    evaluator: E,
    cache: Option<CachedSchema<E::Compiled>>,
}

impl<E: SchemaEvaluator> std::fmt::Debug for StructuralValidator<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructuralValidator")
            .field("cached", &self.cache.is_some())
            .finish()
    }
}

impl<E: SchemaEvaluator> StructuralValidator<E> {
    /// Wrap an evaluator with an empty cache.
    pub fn new(evaluator: E) -> Self {
        Self {
            evaluator,
            cache: None,
        }
    }

    /// Compile `schema`, reusing the cached compilation when the same
    /// schema value was compiled last.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaCompilationError`] if the schema is invalid. The
    /// cache is left as it was.
    pub fn compile(&mut self, schema: &Value) -> Result<Arc<E::Compiled>, SchemaCompilationError> {
        if let Some(cached) = &self.cache {
            if cached.schema == *schema {
                tracing::debug!("schema cache hit");
                return Ok(Arc::clone(&cached.compiled));
            }
        }

        tracing::debug!("schema cache miss, compiling");
        let compiled = Arc::new(self.evaluator.compile(schema)?);
        self.cache = Some(CachedSchema {
            schema: schema.clone(),
            compiled: Arc::clone(&compiled),
        });
        Ok(compiled)
    }

    /// Whether `schema` is the currently cached schema.
    pub fn is_cached(&self, schema: &Value) -> bool {
        self.cache.as_ref().is_some_and(|c| c.schema == *schema)
    }
}
