//! # cdv-cli: CSV Data Validator Command Line
//!
//! Provides the `cdv` binary.
//!
//! ## Subcommands
//!
//! - `cdv validate`: Validate a CSV file against a named or explicit schema.
//! - `cdv schemas`: List the schemas available in the schema directory.
//! - `cdv template`: Generate a CSV template (header plus sample row).
//!
//! ```bash
//! cdv validate events.csv --schema event
//! cdv validate events.csv --schema-file ./event.json --format json
//! cdv template --schema event --output event-template.csv
//! ```
//!
//! ## Exit Codes
//!
//! `0` valid (warnings allowed), `1` validation failure, `2` operational
//! error (unreadable input, unknown schema, schema that does not compile).

pub mod config;
pub mod csv_input;
pub mod report;
pub mod schemas;
pub mod template;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cdv_schema::SchemaRegistry;
use clap::Args;
use serde_json::Value;

/// Exit code for a valid input.
pub const EXIT_OK: u8 = 0;
/// Exit code for an input with validation errors.
pub const EXIT_INVALID: u8 = 1;
/// Exit code for an operational failure.
pub const EXIT_OPERATIONAL: u8 = 2;

/// Where a command gets its schema from.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct SchemaSource {
    /// Schema name, resolved as `<schema-dir>/<name>.json`.
    #[arg(long, value_name = "NAME")]
    pub schema: Option<String>,

    /// Path to a schema file, bypassing the schema directory.
    #[arg(long, value_name = "PATH")]
    pub schema_file: Option<PathBuf>,
}

impl SchemaSource {
    /// Load and parse the schema, returning a display label with it.
    ///
    /// # Errors
    ///
    /// Fails on unknown schema names, unreadable files, and invalid JSON.
    pub fn load(&self, schema_dir: &Path) -> Result<(String, Value)> {
        if let Some(path) = &self.schema_file {
            let label = path.display().to_string();
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read schema file {label}"))?;
            let schema = cdv_core::parse_schema_text(&label, &text)?;
            return Ok((label, schema));
        }

        let name = self
            .schema
            .as_deref()
            .context("one of --schema or --schema-file is required")?;
        let registry = SchemaRegistry::open(schema_dir)?;
        let schema = registry.load(name)?;
        Ok((name.to_string(), schema))
    }
}
