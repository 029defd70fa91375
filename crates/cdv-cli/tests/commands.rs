//! Integration tests for the `cdv` subcommand handlers, run against
//! temporary schema directories and CSV files.

use std::path::{Path, PathBuf};

use cdv_cli::config::CliConfig;
use cdv_cli::schemas::{run_schemas, SchemasArgs};
use cdv_cli::template::{run_template, TemplateArgs};
use cdv_cli::validate::{run_validate, OutputFormat, ValidateArgs};
use cdv_cli::SchemaSource;
use serde_json::Value;

const PERSON_SCHEMA: &str = r#"{
  "type": "object",
  "required": ["name", "email", "age"],
  "properties": {
    "name": {"type": "string", "examples": ["Ann"]},
    "email": {"type": "string", "format": "email"},
    "age": {"type": "integer", "default": 30},
    "status": {"enum": ["active", "inactive"]},
    "tags": {"type": "array", "items": {"type": "string"}}
  }
}"#;

struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("schemas")).unwrap();
        std::fs::write(dir.path().join("schemas/person.json"), PERSON_SCHEMA).unwrap();
        std::fs::write(dir.path().join("schemas/empty.json"), "{}").unwrap();
        Self { dir }
    }

    fn schema_dir(&self) -> PathBuf {
        self.dir.path().join("schemas")
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn validate_args(&self, csv: &Path, format: OutputFormat) -> ValidateArgs {
        ValidateArgs {
            csv: csv.to_path_buf(),
            source: by_name("person"),
            schema_dir: Some(self.schema_dir()),
            format,
            batch_size: None,
            delimiter: ',',
            worker_config: None,
        }
    }
}

fn by_name(name: &str) -> SchemaSource {
    SchemaSource {
        schema: Some(name.to_string()),
        schema_file: None,
    }
}

fn validate(args: &ValidateArgs) -> (anyhow::Result<u8>, String) {
    let mut out = Vec::new();
    let result = run_validate(args, &CliConfig::default(), &mut out);
    (result, String::from_utf8(out).unwrap())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

#[test]
fn valid_file_exits_zero() {
    let ws = Workspace::new();
    let csv = ws.write(
        "people.csv",
        "name,email,age,tags\nAnn,ann@example.com,30,\"a, b\"\n",
    );
    let (code, out) = validate(&ws.validate_args(&csv, OutputFormat::Text));
    assert_eq!(code.unwrap(), 0);
    assert!(out.contains("Total rows: 1"));
    assert!(out.contains("Outcome: success\n"));
}

#[test]
fn missing_required_field_exits_one() {
    let ws = Workspace::new();
    let csv = ws.write("people.csv", "name,age\nAnn,30\n");
    let (code, out) = validate(&ws.validate_args(&csv, OutputFormat::Text));
    assert_eq!(code.unwrap(), 1);
    assert!(out.contains("Row 2\n"));
    assert!(out.contains(
        "  error: email: Required property 'email' is missing. Required properties are: [name, email, age]."
    ));
    assert!(out.contains("Outcome: failure\n"));
}

#[test]
fn json_format_prints_wire_messages() {
    let ws = Workspace::new();
    let mut body = String::from("name,email,age,status\n");
    for _ in 0..5 {
        body.push_str("Ann,ann@example.com,30,unknown\n");
    }
    let csv = ws.write("people.csv", &body);
    let mut args = ws.validate_args(&csv, OutputFormat::Json);
    args.batch_size = Some(2);

    let (code, out) = validate(&args);
    assert_eq!(code.unwrap(), 1);

    let messages: Vec<Value> = out
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let types: Vec<&str> = messages.iter().map(|m| m["type"].as_str().unwrap()).collect();
    assert_eq!(
        types,
        vec!["resultsBatch", "resultsBatch", "resultsBatch", "complete"]
    );
    assert_eq!(messages[0]["payload"]["results"][0]["row"], 2);
    assert_eq!(messages[3]["payload"]["totalErrors"], 5);
    assert_eq!(messages[3]["payload"]["totalWarnings"], 0);
}

#[test]
fn unknown_schema_is_operational_error() {
    let ws = Workspace::new();
    let csv = ws.write("people.csv", "name\nAnn\n");
    let mut args = ws.validate_args(&csv, OutputFormat::Text);
    args.source = by_name("organization");
    let (result, _) = validate(&args);
    let err = result.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Unknown schema: organization. Available schemas: [empty, person]"
    );
}

#[test]
fn uncompilable_schema_exits_two() {
    let ws = Workspace::new();
    let schema = ws.write(
        "bad.json",
        r#"{"properties": {"code": {"type": "string", "pattern": "(unclosed"}}}"#,
    );
    let csv = ws.write("codes.csv", "code\nABC\n");
    let mut args = ws.validate_args(&csv, OutputFormat::Text);
    args.source = SchemaSource {
        schema: None,
        schema_file: Some(schema),
    };
    let (code, out) = validate(&args);
    assert_eq!(code.unwrap(), 2);
    assert!(out.contains("Outcome: aborted (schema compilation failed"));
}

#[test]
fn malformed_schema_file_fails_fast() {
    let ws = Workspace::new();
    let schema = ws.write("broken.json", "{\"type\": ");
    let csv = ws.write("people.csv", "name\nAnn\n");
    let mut args = ws.validate_args(&csv, OutputFormat::Text);
    args.source = SchemaSource {
        schema: None,
        schema_file: Some(schema),
    };
    assert!(validate(&args).0.is_err());
}

#[test]
fn ragged_csv_reports_line() {
    let ws = Workspace::new();
    let csv = ws.write("people.csv", "name,email,age\nAnn,ann@example.com,30\nBob,bob@example.com\n");
    let (result, _) = validate(&ws.validate_args(&csv, OutputFormat::Text));
    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("CSV line 3 has 2 fields but the header has 3"), "{message}");
}

#[test]
fn warnings_only_exits_zero() {
    let ws = Workspace::new();
    let csv = ws.write(
        "people.csv",
        "name,email,age,status\nAnn,ann@example.com,30,\"\"\"\"\"\"\n",
    );
    let (code, out) = validate(&ws.validate_args(&csv, OutputFormat::Text));
    assert_eq!(code.unwrap(), 0);
    assert!(out.contains("  warning: status: Field contains empty quoted value."));
    assert!(out.contains("Outcome: success with warnings\n"));
}

#[test]
fn zero_batch_size_rejected() {
    let ws = Workspace::new();
    let csv = ws.write("people.csv", "name\nAnn\n");
    let mut args = ws.validate_args(&csv, OutputFormat::Text);
    args.batch_size = Some(0);
    assert!(validate(&args).0.is_err());
}

#[test]
fn worker_config_file_sets_batch_size() {
    let ws = Workspace::new();
    let mut body = String::from("name,age\n");
    for _ in 0..3 {
        body.push_str("Ann,30\n");
    }
    let csv = ws.write("people.csv", &body);
    let mut args = ws.validate_args(&csv, OutputFormat::Json);
    args.worker_config = Some(ws.write("worker.yaml", "batch_size: 1\n"));

    let (code, out) = validate(&args);
    assert_eq!(code.unwrap(), 1);
    assert_eq!(out.lines().count(), 4, "three single-row batches and complete");
}

#[test]
fn malformed_worker_config_is_operational_error() {
    let ws = Workspace::new();
    let csv = ws.write("people.csv", "name\nAnn\n");
    let mut args = ws.validate_args(&csv, OutputFormat::Text);
    args.worker_config = Some(ws.write("worker.yaml", "batch_size: [\n"));
    let message = format!("{:#}", validate(&args).0.unwrap_err());
    assert!(message.contains("failed to load worker configuration"), "{message}");
}

// ---------------------------------------------------------------------------
// schemas and template
// ---------------------------------------------------------------------------

#[test]
fn schemas_lists_names() {
    let ws = Workspace::new();
    let mut out = Vec::new();
    let code = run_schemas(
        &SchemasArgs {
            schema_dir: Some(ws.schema_dir()),
        },
        &CliConfig::default(),
        &mut out,
    )
    .unwrap();
    assert_eq!(code, 0);
    assert_eq!(String::from_utf8(out).unwrap(), "empty\nperson\n");
}

#[test]
fn template_to_stdout_and_file() {
    let ws = Workspace::new();
    let mut out = Vec::new();
    let mut args = TemplateArgs {
        source: by_name("person"),
        schema_dir: Some(ws.schema_dir()),
        output: None,
    };
    run_template(&args, &CliConfig::default(), &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text, "name,email,age,status,tags\nAnn,,30,active,\n");

    let path = ws.dir.path().join("person-template.csv");
    args.output = Some(path.clone());
    let mut out = Vec::new();
    run_template(&args, &CliConfig::default(), &mut out).unwrap();
    assert!(out.is_empty());
    assert_eq!(std::fs::read_to_string(path).unwrap(), text);
}

#[test]
fn config_schema_dir_used_without_flag() {
    let ws = Workspace::new();
    let config = CliConfig {
        schema_dir: Some(ws.schema_dir()),
        ..CliConfig::default()
    };
    let mut out = Vec::new();
    run_schemas(&SchemasArgs { schema_dir: None }, &config, &mut out).unwrap();
    assert!(String::from_utf8(out).unwrap().contains("person"));
}
