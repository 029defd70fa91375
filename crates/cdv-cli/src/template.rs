//! # Template Subcommand
//!
//! Writes a CSV template for a schema: one header row with a column per
//! leaf property, and one sample row filled from the schema's examples,
//! defaults, enums, and constants.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use cdv_schema::generate_template;
use clap::Args;

use crate::config::CliConfig;
use crate::{SchemaSource, EXIT_OK};

/// Arguments for the `cdv template` subcommand.
#[derive(Args, Debug)]
pub struct TemplateArgs {
    #[command(flatten)]
    pub source: SchemaSource,

    /// Directory holding `*.json` schemas.
    #[arg(long)]
    pub schema_dir: Option<PathBuf>,

    /// Write the template to this file instead of standard output.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// Execute the template subcommand.
pub fn run_template(args: &TemplateArgs, config: &CliConfig, out: &mut dyn Write) -> Result<u8> {
    let schema_dir = config.schema_dir(args.schema_dir.as_deref());
    let (name, schema) = args.source.load(&schema_dir)?;
    let template = generate_template(&schema)
        .with_context(|| format!("failed to generate template for {name}"))?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &template)
                .with_context(|| format!("cannot write template to {}", path.display()))?;
            tracing::info!(schema = %name, path = %path.display(), "wrote CSV template");
        }
        None => out.write_all(template.as_bytes())?,
    }
    Ok(EXIT_OK)
}
