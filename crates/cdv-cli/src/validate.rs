//! # Validate Subcommand
//!
//! Validates one CSV file against one schema using the background
//! validation worker.
//!
//! - `--format text` (default) prints a report after the run ends.
//! - `--format json` prints every worker message as one JSON line as soon
//!   as it arrives, in the worker's wire shape.
//!
//! A schema that cannot be found, parsed, or compiled is an operational
//! error (exit 2), never a validation failure.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use cdv_core::{Outcome, Row, WorkerRequest};
use cdv_worker::{spawn_worker, RunCollector, RunEnd, ValidationReport, WorkerConfig};
use clap::{Args, ValueEnum};
use serde_json::Value;

use crate::config::CliConfig;
use crate::csv_input::read_csv_file;
use crate::report::render_text;
use crate::{SchemaSource, EXIT_INVALID, EXIT_OK, EXIT_OPERATIONAL};

/// Output format of the validate subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable report.
    Text,
    /// One JSON worker message per line.
    Json,
}

/// Arguments for the `cdv validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// CSV file to validate. The first line must be the header.
    #[arg(value_name = "CSV")]
    pub csv: PathBuf,

    #[command(flatten)]
    pub source: SchemaSource,

    /// Directory holding `*.json` schemas.
    #[arg(long)]
    pub schema_dir: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Row results per batch message.
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// CSV field delimiter.
    #[arg(long, default_value_t = ',')]
    pub delimiter: char,

    /// Worker settings file; replaces the `worker` section of `--config`.
    #[arg(long, value_name = "PATH")]
    pub worker_config: Option<PathBuf>,
}

/// Execute the validate subcommand.
///
/// Returns exit code: 0 on success, 1 on validation failure, 2 when the
/// run was abandoned.
pub fn run_validate(args: &ValidateArgs, config: &CliConfig, out: &mut dyn Write) -> Result<u8> {
    let schema_dir = config.schema_dir(args.schema_dir.as_deref());
    let (schema_name, schema) = args.source.load(&schema_dir)?;

    let rows = read_csv_file(&args.csv, args.delimiter)
        .with_context(|| format!("failed to read {}", args.csv.display()))?;
    let total_rows = rows.len();

    let mut worker_config = match &args.worker_config {
        Some(path) => WorkerConfig::load(path)?,
        None => config.worker.clone(),
    };
    if let Some(batch_size) = args.batch_size {
        worker_config.batch_size = batch_size;
    }
    worker_config.validate()?;

    tracing::info!(
        schema = %schema_name,
        csv = %args.csv.display(),
        rows = total_rows,
        "validating CSV"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let report = runtime.block_on(stream_run(&worker_config, rows, schema, args.format, out))?;

    if args.format == OutputFormat::Text {
        out.write_all(render_text(&report, total_rows).as_bytes())?;
    }
    out.flush()?;

    Ok(exit_code(&report))
}

/// Run one request on a fresh worker, echoing messages in JSON mode.
async fn stream_run(
    config: &WorkerConfig,
    rows: Vec<Row>,
    schema: Value,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<ValidationReport> {
    let mut worker = spawn_worker(config)?;
    worker.submit(WorkerRequest::validate(rows, schema)).await?;

    let mut collector = RunCollector::new();
    while !collector.is_finished() {
        let Some(message) = worker.next_message().await else {
            bail!("validation worker stopped before the run ended");
        };
        if format == OutputFormat::Json {
            serde_json::to_writer(&mut *out, &message)?;
            writeln!(out)?;
        }
        collector.push(message)?;
    }

    worker.shutdown().await?;
    Ok(collector.finish()?)
}

/// Exit code for a finished run.
pub fn exit_code(report: &ValidationReport) -> u8 {
    match &report.end {
        RunEnd::Complete { summary } => match Outcome::from_summary(summary) {
            Outcome::Failure => EXIT_INVALID,
            Outcome::Success | Outcome::SuccessWithWarnings => EXIT_OK,
        },
        RunEnd::Failed { message } => {
            tracing::error!(%message, "validation run abandoned");
            EXIT_OPERATIONAL
        }
    }
}
