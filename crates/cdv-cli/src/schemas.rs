//! # Schemas Subcommand
//!
//! Lists the schema names available in the schema directory.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use cdv_schema::SchemaRegistry;
use clap::Args;

use crate::config::CliConfig;
use crate::EXIT_OK;

/// Arguments for the `cdv schemas` subcommand.
#[derive(Args, Debug)]
pub struct SchemasArgs {
    /// Directory holding `*.json` schemas.
    #[arg(long)]
    pub schema_dir: Option<PathBuf>,
}

/// Execute the schemas subcommand.
pub fn run_schemas(args: &SchemasArgs, config: &CliConfig, out: &mut dyn Write) -> Result<u8> {
    let schema_dir = config.schema_dir(args.schema_dir.as_deref());
    let registry = SchemaRegistry::open(&schema_dir)?;

    if registry.is_empty() {
        writeln!(out, "No schemas found in {}", schema_dir.display())?;
        return Ok(EXIT_OK);
    }
    for name in registry.names() {
        writeln!(out, "{name}")?;
    }
    Ok(EXIT_OK)
}
