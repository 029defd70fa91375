//! # cdv CLI entry point
//!
//! Parses command-line arguments, installs logging, loads the optional
//! configuration file, and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use cdv_cli::config::CliConfig;
use cdv_cli::schemas::{run_schemas, SchemasArgs};
use cdv_cli::template::{run_template, TemplateArgs};
use cdv_cli::validate::{run_validate, ValidateArgs};
use cdv_cli::EXIT_OPERATIONAL;

/// CSV Data Validator
///
/// Validates CSV files against JSON Schemas and reports row-accurate,
/// actionable diagnostics.
#[derive(Parser, Debug)]
#[command(name = "cdv", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log line format (logs go to standard error).
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a CSV file against a JSON Schema.
    Validate(ValidateArgs),

    /// List the schemas available in the schema directory.
    Schemas(SchemasArgs),

    /// Generate a CSV template from a JSON Schema.
    Template(TemplateArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    tracing::debug!("cdv CLI v{} starting", env!("CARGO_PKG_VERSION"));

    let result = CliConfig::load(cli.config.as_deref()).and_then(|config| {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        match &cli.command {
            Commands::Validate(args) => run_validate(args, &config, &mut out),
            Commands::Schemas(args) => run_schemas(args, &config, &mut out),
            Commands::Template(args) => run_template(args, &config, &mut out),
        }
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(EXIT_OPERATIONAL)
        }
    }
}

/// `RUST_LOG` wins when set; otherwise verbosity picks the level.
fn init_tracing(verbose: u8, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
