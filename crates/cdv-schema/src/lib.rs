//! # cdv-schema: Schema-Directed Validation Core
//!
//! Everything needed to check one CSV row against a JSON Schema:
//!
//! 1. [`coerce`]: convert raw cell text into the declared property type.
//! 2. [`project`]: build the nested, typed object for a whole row.
//! 3. [`structural`]: evaluate the object with a pluggable JSON Schema
//!    engine, collecting every violation.
//! 4. [`format`]: turn violations into diagnostics with remediation context.
//!
//! Supporting modules: [`node`] (schema introspection), [`template`]
//! (CSV template generation), and [`registry`] (schema lookup by name).
//!
//! ## Crate Policy
//!
//! - Depends only on `cdv-core` internally.
//! - Malformed cells never raise; they become diagnostics.
//! - Only a malformed *schema* is an error ([`SchemaCompilationError`]).

pub mod coerce;
pub mod format;
pub mod node;
pub mod project;
pub mod registry;
pub mod structural;
pub mod template;

pub use coerce::{CellCoercer, Coerced};
pub use format::DiagnosticFormatter;
pub use project::{ProjectedRow, ProjectionError, RowProjector, EMPTY_QUOTED_WARNING};
pub use registry::{RegistryError, SchemaRegistry};
pub use structural::{
    CheckOutcome, CompiledSchema, JsonSchemaCompiled, JsonSchemaEvaluator, Keyword, RawViolation,
    SchemaCompilationError, SchemaEvaluator, StructuralValidator, ViolationParams,
};
pub use template::{flatten_schema, generate_template, TemplateColumn, TemplateError};

/// JSON Schema draft selector, re-exported from the evaluator crate.
pub use jsonschema::Draft;
