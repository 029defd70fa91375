//! Integration tests for the channel-backed validation worker.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cdv_core::{Outcome, Row, WorkerMessage, WorkerRequest};
use cdv_schema::{
    CheckOutcome, CompiledSchema, JsonSchemaCompiled, JsonSchemaEvaluator, SchemaCompilationError,
    SchemaEvaluator,
};
use cdv_worker::{spawn_worker, spawn_worker_with, WorkerConfig, WorkerError};
use serde_json::{json, Value};

fn schema() -> Value {
    json!({
        "type": "object",
        "required": ["email"],
        "properties": {"email": {"type": "string"}, "name": {"type": "string"}}
    })
}

fn missing_email(n: usize) -> Vec<Row> {
    (0..n).map(|_| [("name", "Ann")].into_iter().collect()).collect()
}

/// Counts compilations; panics while checking any instance with a `boom`
/// property.
struct CountingEvaluator {
    compilations: Arc<AtomicUsize>,
}

struct CountingCompiled(JsonSchemaCompiled);

impl CompiledSchema for CountingCompiled {
    fn check(&self, instance: &Value) -> CheckOutcome {
        if instance.get("boom").is_some() {
            panic!("evaluator exploded");
        }
        self.0.check(instance)
    }
}

impl SchemaEvaluator for CountingEvaluator {
    type Compiled = CountingCompiled;

    fn compile(&self, schema: &Value) -> Result<Self::Compiled, SchemaCompilationError> {
        self.compilations.fetch_add(1, Ordering::SeqCst);
        JsonSchemaEvaluator::new().compile(schema).map(CountingCompiled)
    }
}

fn counting() -> (CountingEvaluator, Arc<AtomicUsize>) {
    let compilations = Arc::new(AtomicUsize::new(0));
    (
        CountingEvaluator {
            compilations: Arc::clone(&compilations),
        },
        compilations,
    )
}

#[tokio::test]
async fn validate_collects_a_full_run() {
    let mut worker = spawn_worker(&WorkerConfig::default()).unwrap();
    let report = worker.validate(missing_email(120), schema()).await.unwrap();
    assert_eq!(report.batches, 3);
    assert_eq!(report.results.len(), 120);
    assert_eq!(report.summary().map(|s| s.total_errors), Some(120));
    assert_eq!(report.outcome(), Some(Outcome::Failure));
    worker.shutdown().await.unwrap();
}

#[tokio::test]
async fn messages_stream_in_order() {
    let config = WorkerConfig {
        batch_size: 2,
        ..WorkerConfig::default()
    };
    let mut worker = spawn_worker(&config).unwrap();
    worker
        .submit(WorkerRequest::validate(missing_email(5), schema()))
        .await
        .unwrap();

    let mut kinds = Vec::new();
    while let Some(message) = worker.next_message().await {
        let terminal = message.is_terminal();
        kinds.push(match message {
            WorkerMessage::ResultsBatch { results } => results.len(),
            WorkerMessage::Complete(summary) => {
                assert_eq!(summary.total_errors, 5);
                0
            }
            WorkerMessage::Error { message } => panic!("unexpected error: {message}"),
        });
        if terminal {
            break;
        }
    }
    assert_eq!(kinds, vec![2, 2, 1, 0]);
    worker.shutdown().await.unwrap();
}

#[tokio::test]
async fn compile_failure_is_reported_in_band() {
    let mut worker = spawn_worker(&WorkerConfig::default()).unwrap();
    let bad = json!({"properties": {"code": {"pattern": "(unclosed"}}});
    let report = worker.validate(missing_email(3), bad).await.unwrap();
    assert!(report.results.is_empty());
    assert!(report
        .error()
        .is_some_and(|m| m.starts_with("schema compilation failed")));

    // The worker is still usable.
    let report = worker.validate(missing_email(1), schema()).await.unwrap();
    assert_eq!(report.results.len(), 1);
    worker.shutdown().await.unwrap();
}

#[tokio::test]
async fn schema_compiled_once_per_identity() {
    let (evaluator, compilations) = counting();
    let mut worker = spawn_worker_with(&WorkerConfig::default(), evaluator).unwrap();

    worker.validate(missing_email(2), schema()).await.unwrap();
    worker.validate(missing_email(3), schema()).await.unwrap();
    assert_eq!(compilations.load(Ordering::SeqCst), 1);

    let other = json!({"type": "object", "required": ["name"]});
    worker.validate(missing_email(1), other).await.unwrap();
    assert_eq!(compilations.load(Ordering::SeqCst), 2);

    worker.validate(missing_email(1), schema()).await.unwrap();
    assert_eq!(compilations.load(Ordering::SeqCst), 3);
    worker.shutdown().await.unwrap();
}

#[tokio::test]
async fn panic_becomes_error_and_worker_survives() {
    let (evaluator, _) = counting();
    let config = WorkerConfig {
        batch_size: 1,
        ..WorkerConfig::default()
    };
    let mut worker = spawn_worker_with(&config, evaluator).unwrap();

    let mut rows = missing_email(2);
    rows.push([("boom", "1")].into_iter().collect());
    let report = worker.validate(rows, schema()).await.unwrap();
    assert_eq!(report.batches, 2, "batches flushed before the panic are kept");
    assert_eq!(report.error(), Some("internal error: evaluator exploded"));

    let report = worker.validate(missing_email(1), schema()).await.unwrap();
    assert_eq!(report.summary().map(|s| s.total_errors), Some(1));
    worker.shutdown().await.unwrap();
}

#[tokio::test]
async fn shutdown_cancels_in_flight_run() {
    let config = WorkerConfig {
        batch_size: 1,
        channel_capacity: 1,
        ..WorkerConfig::default()
    };
    let worker = spawn_worker(&config).unwrap();
    worker
        .submit(WorkerRequest::validate(missing_email(500), schema()))
        .await
        .unwrap();
    worker.shutdown().await.unwrap();
}

#[tokio::test]
async fn empty_input_completes_without_compiling() {
    let (evaluator, compilations) = counting();
    let mut worker = spawn_worker_with(&WorkerConfig::default(), evaluator).unwrap();
    let report = worker.validate(Vec::new(), schema()).await.unwrap();
    assert!(report.results.is_empty());
    assert_eq!(report.outcome(), Some(Outcome::Success));
    assert_eq!(compilations.load(Ordering::SeqCst), 0);
    worker.shutdown().await.unwrap();
}

#[tokio::test]
async fn invalid_config_is_rejected() {
    let config = WorkerConfig {
        batch_size: 0,
        ..WorkerConfig::default()
    };
    assert!(matches!(
        spawn_worker(&config),
        Err(WorkerError::InvalidConfig(_))
    ));
}
