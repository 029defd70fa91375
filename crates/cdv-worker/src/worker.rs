//! # Background Validation Worker
//!
//! Hosts a [`BatchEmitter`] on a dedicated blocking task and talks to it
//! only through channels: requests go in, messages come out. The caller
//! never shares memory with the running pipeline.
//!
//! ## Lifecycle
//!
//! - Requests are served one at a time, in submission order.
//! - The compiled-schema cache lives as long as the worker.
//! - A panic inside a run is caught, reported as that run's `error`
//!   message, and the worker keeps serving.
//! - Dropping the message receiver cancels the in-flight run at its next
//!   emission; dropping the request sender stops the worker once idle.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use cdv_core::{Row, ValidatePayload, WorkerMessage, WorkerRequest};
use cdv_schema::SchemaEvaluator;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::collect::{RunCollector, ValidationReport};
use crate::config::WorkerConfig;
use crate::emitter::{BatchEmitter, MessageSink};
use crate::error::WorkerError;

/// Pending requests accepted before `submit` waits.
const REQUEST_CAPACITY: usize = 4;

/// Caller side of a running validation worker.
#[derive(Debug)]
pub struct WorkerHandle {
    requests: mpsc::Sender<WorkerRequest>,
    messages: mpsc::Receiver<WorkerMessage>,
    task: JoinHandle<()>,
}

/// Start a worker backed by the `jsonschema` evaluator.
///
/// # Errors
///
/// Returns [`WorkerError::InvalidConfig`] for out-of-range configuration
/// values and [`WorkerError::NoRuntime`] outside a Tokio runtime.
pub fn spawn_worker(config: &WorkerConfig) -> Result<WorkerHandle, WorkerError> {
    spawn_worker_with(config, config.evaluator())
}

/// Start a worker backed by a caller-supplied evaluator.
///
/// # Errors
///
/// As [`spawn_worker`].
pub fn spawn_worker_with<E>(config: &WorkerConfig, evaluator: E) -> Result<WorkerHandle, WorkerError>
where
    E: SchemaEvaluator + 'static,
{
    config.validate()?;
    let runtime = tokio::runtime::Handle::try_current().map_err(|_| WorkerError::NoRuntime)?;

    let (request_tx, mut request_rx) = mpsc::channel::<WorkerRequest>(REQUEST_CAPACITY);
    let (message_tx, message_rx) = mpsc::channel::<WorkerMessage>(config.channel_capacity);
    let mut emitter = BatchEmitter::new(evaluator, config.batch_size);

    let task = runtime.spawn_blocking(move || {
        let mut sink = message_tx;
        tracing::debug!("validation worker started");
        while let Some(request) = request_rx.blocking_recv() {
            let WorkerRequest::Validate(payload) = request;
            if let Err(e) = serve(&mut emitter, &payload, &mut sink) {
                tracing::debug!(error = %e, "message consumer gone, stopping worker");
                break;
            }
        }
        tracing::debug!("validation worker stopped");
    });

    Ok(WorkerHandle {
        requests: request_tx,
        messages: message_rx,
        task,
    })
}

/// Run one request, converting a panic into the run's `error` message.
fn serve<E: SchemaEvaluator>(
    emitter: &mut BatchEmitter<E>,
    payload: &ValidatePayload,
    sink: &mut mpsc::Sender<WorkerMessage>,
) -> Result<(), WorkerError> {
    match panic::catch_unwind(AssertUnwindSafe(|| emitter.run(payload, &mut *sink))) {
        Ok(result) => report_failure(result, sink),
        Err(panic) => {
            let reason = panic_message(&*panic);
            tracing::error!(%reason, "validation run panicked");
            emitter.abort();
            sink.emit(WorkerMessage::error(format!("internal error: {reason}")))
        }
    }
}

/// Send a failed run's terminal `error` message. Only a closed channel is
/// returned, since nobody is left to receive anything.
fn report_failure<S: MessageSink>(
    result: Result<(), WorkerError>,
    sink: &mut S,
) -> Result<(), WorkerError> {
    match result {
        Err(WorkerError::ChannelClosed) => Err(WorkerError::ChannelClosed),
        Err(e) => {
            tracing::error!(error = %e, "validation run failed");
            sink.emit(WorkerMessage::error(e.to_string()))
        }
        Ok(()) => Ok(()),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl WorkerHandle {
    /// Queue a request.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::ChannelClosed`] if the worker has stopped.
    pub async fn submit(&self, request: WorkerRequest) -> Result<(), WorkerError> {
        self.requests
            .send(request)
            .await
            .map_err(|_| WorkerError::ChannelClosed)
    }

    /// Next message from the worker, or `None` once it has stopped.
    pub async fn next_message(&mut self) -> Option<WorkerMessage> {
        self.messages.recv().await
    }

    /// Submit a request and collect its messages up to the terminal one.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::ChannelClosed`] if the worker stops before
    /// the run ends, or any collection error from [`RunCollector::push`].
    pub async fn validate(
        &mut self,
        rows: Vec<Row>,
        schema: Value,
    ) -> Result<ValidationReport, WorkerError> {
        self.submit(WorkerRequest::validate(rows, schema)).await?;
        let mut collector = RunCollector::new();
        while let Some(message) = self.next_message().await {
            collector.push(message)?;
            if collector.is_finished() {
                return collector.finish();
            }
        }
        Err(WorkerError::ChannelClosed)
    }

    /// Stop the worker and wait for it to exit. An in-flight run is
    /// cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Join`] if the worker task failed.
    pub async fn shutdown(self) -> Result<(), WorkerError> {
        let Self {
            requests,
            messages,
            task,
        } = self;
        drop(requests);
        drop(messages);
        task.await.map_err(|e| WorkerError::Join(e.to_string()))
    }
}
