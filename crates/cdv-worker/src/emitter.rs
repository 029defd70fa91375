//! # Batch Emitter
//!
//! Drives one validation run: compiles the schema, pushes every row through
//! projection, structural checking, and formatting, and emits the resulting
//! [`RowResult`]s in bounded batches followed by a single terminal message.
//!
//! ## States
//!
//! ```text
//! Idle ──▶ Compiling ──▶ Processing ──▶ Draining ──▶ Complete
//!  │           │              │             │
//!  │           └──────────────┴─────────────┴──▶ Errored
//!  └──▶ Complete   (no rows)
//! ```
//!
//! `Errored` is reachable from every non-terminal state. Both terminal
//! states return to `Idle` when the next run begins.
//!
//! ## Emission Contract
//!
//! - Only rows with at least one error or warning produce a [`RowResult`].
//! - A batch is flushed as soon as it holds `batch_size` results; the
//!   remainder is flushed while draining, however small.
//! - Exactly one terminal message ends every run: `complete` with the
//!   diagnostic totals, or `error` with the reason.
//! - Batches already emitted are never retracted.

use cdv_core::{csv_row_number, Row, RowResult, RunSummary, ValidatePayload, WorkerMessage};
use cdv_schema::{
    CompiledSchema, DiagnosticFormatter, JsonSchemaEvaluator, RowProjector, SchemaEvaluator,
    StructuralValidator,
};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::WorkerConfig;
use crate::error::WorkerError;

// ---------------------------------------------------------------------------
// Message sinks
// ---------------------------------------------------------------------------

/// Destination of the messages a run emits.
pub trait MessageSink {
    /// Deliver one message.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::ChannelClosed`] when the consumer is gone,
    /// which cancels the run.
    fn emit(&mut self, message: WorkerMessage) -> Result<(), WorkerError>;
}

impl MessageSink for Vec<WorkerMessage> {
    fn emit(&mut self, message: WorkerMessage) -> Result<(), WorkerError> {
        self.push(message);
        Ok(())
    }
}

/// Blocks the calling thread while the channel is full. Only call from a
/// blocking context (e.g. inside `spawn_blocking`).
impl MessageSink for mpsc::Sender<WorkerMessage> {
    fn emit(&mut self, message: WorkerMessage) -> Result<(), WorkerError> {
        self.blocking_send(message)
            .map_err(|_| WorkerError::ChannelClosed)
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Lifecycle state of a [`BatchEmitter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmitterState {
    /// Waiting for a request.
    Idle,
    /// Compiling the request's schema.
    Compiling,
    /// Validating rows and flushing full batches.
    Processing,
    /// Flushing the last partial batch.
    Draining,
    /// The summary has been emitted.
    Complete,
    /// The run was abandoned with an error message.
    Errored,
}

impl EmitterState {
    /// Whether the state ends a run.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Errored)
    }

    /// Whether the state machine permits moving to `to`.
    pub fn can_transition_to(self, to: EmitterState) -> bool {
        use EmitterState::*;
        match (self, to) {
            (Idle, Compiling) | (Idle, Complete) => true,
            (Compiling, Processing) => true,
            (Processing, Draining) => true,
            (Draining, Complete) => true,
            (from, Errored) => !from.is_terminal(),
            (Complete | Errored, Idle) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for EmitterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "IDLE",
            Self::Compiling => "COMPILING",
            Self::Processing => "PROCESSING",
            Self::Draining => "DRAINING",
            Self::Complete => "COMPLETE",
            Self::Errored => "ERRORED",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// BatchEmitter
// ---------------------------------------------------------------------------

/// Sequential, single-threaded driver of validation runs.
///
/// Owns the structural validator and therefore the single-slot
/// compiled-schema cache, which survives across runs.
#[derive(Debug)]
pub struct BatchEmitter<E: SchemaEvaluator> {
    validator: StructuralValidator<E>,
    batch_size: usize,
    state: EmitterState,
}

impl BatchEmitter<JsonSchemaEvaluator> {
    /// Build an emitter from a worker configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::InvalidConfig`] for out-of-range values.
    pub fn from_config(config: &WorkerConfig) -> Result<Self, WorkerError> {
        config.validate()?;
        Ok(Self::new(config.evaluator(), config.batch_size))
    }
}

impl<E: SchemaEvaluator> BatchEmitter<E> {
    /// Create an idle emitter. A `batch_size` of zero is treated as one.
    pub fn new(evaluator: E, batch_size: usize) -> Self {
        Self {
            validator: StructuralValidator::new(evaluator),
            batch_size: batch_size.max(1),
            state: EmitterState::Idle,
        }
    }

    /// Current state.
    pub fn state(&self) -> EmitterState {
        self.state
    }

    /// Row results per batch.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// The structural validator and its schema cache.
    pub fn validator(&self) -> &StructuralValidator<E> {
        &self.validator
    }

    fn transition(&mut self, to: EmitterState) -> Result<(), WorkerError> {
        if !self.state.can_transition_to(to) {
            return Err(WorkerError::InvalidTransition {
                from: self.state.to_string(),
                to: to.to_string(),
                reason: "not permitted by the emitter state machine".into(),
            });
        }
        tracing::trace!(from = %self.state, to = %to, "emitter transition");
        self.state = to;
        Ok(())
    }

    /// Mark the in-flight run as abandoned. No-op if no run is in flight.
    ///
    /// Used after a run was interrupted from outside (e.g. by a panic).
    pub fn abort(&mut self) {
        if !self.state.is_terminal() && self.state != EmitterState::Idle {
            self.state = EmitterState::Errored;
        }
    }

    /// Run one validation request, emitting its messages into `sink`.
    ///
    /// A schema that fails to compile is not an `Err`: it is reported as
    /// the run's terminal `error` message and the emitter ends `Errored`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::ChannelClosed`] if the sink rejects a
    /// message; the run is abandoned and the emitter ends `Errored`.
    pub fn run<S: MessageSink>(
        &mut self,
        payload: &ValidatePayload,
        sink: &mut S,
    ) -> Result<(), WorkerError> {
        if self.state.is_terminal() {
            self.transition(EmitterState::Idle)?;
        }

        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "validation_run",
            run_id = %run_id,
            rows = payload.csv_data.len()
        );
        let _guard = span.enter();

        let result = self.drive(payload, sink);
        if result.is_err() {
            self.abort();
        }
        result
    }

    fn drive<S: MessageSink>(
        &mut self,
        payload: &ValidatePayload,
        sink: &mut S,
    ) -> Result<(), WorkerError> {
        if payload.csv_data.is_empty() {
            sink.emit(WorkerMessage::Complete(RunSummary::default()))?;
            self.transition(EmitterState::Complete)?;
            tracing::info!(total_errors = 0, total_warnings = 0, "validation run complete");
            return Ok(());
        }

        self.transition(EmitterState::Compiling)?;
        let compiled = match self.validator.compile(&payload.parsed_schema) {
            Ok(compiled) => compiled,
            Err(e) => {
                tracing::warn!(error = %e, "schema compilation failed, abandoning run");
                sink.emit(WorkerMessage::error(e.to_string()))?;
                return self.transition(EmitterState::Errored);
            }
        };

        self.transition(EmitterState::Processing)?;
        let projector = RowProjector::new(&payload.parsed_schema);
        let formatter = DiagnosticFormatter::new(&payload.parsed_schema);
        let mut buffer = Vec::with_capacity(self.batch_size);
        let mut summary = RunSummary::default();

        for (index, row) in payload.csv_data.iter().enumerate() {
            let result = check_row(csv_row_number(index), row, &projector, &*compiled, &formatter);
            if result.is_clean() {
                continue;
            }
            summary.record(&result);
            buffer.push(result);
            if buffer.len() >= self.batch_size {
                self.flush(&mut buffer, sink)?;
            }
        }

        self.transition(EmitterState::Draining)?;
        if !buffer.is_empty() {
            self.flush(&mut buffer, sink)?;
        }

        sink.emit(WorkerMessage::Complete(summary))?;
        self.transition(EmitterState::Complete)?;
        tracing::info!(
            total_errors = summary.total_errors,
            total_warnings = summary.total_warnings,
            "validation run complete"
        );
        Ok(())
    }

    fn flush<S: MessageSink>(
        &self,
        buffer: &mut Vec<RowResult>,
        sink: &mut S,
    ) -> Result<(), WorkerError> {
        let results = std::mem::replace(buffer, Vec::with_capacity(self.batch_size));
        tracing::debug!(batch_len = results.len(), "flushing results batch");
        sink.emit(WorkerMessage::ResultsBatch { results })
    }
}

/// Diagnostics of one row. A row that cannot be projected gets a single
/// `Row Conversion` error and skips structural checking. Required fields
/// left out for holding the empty-quote marker only warn.
fn check_row<C: CompiledSchema + ?Sized>(
    row_number: usize,
    row: &Row,
    projector: &RowProjector<'_>,
    compiled: &C,
    formatter: &DiagnosticFormatter<'_>,
) -> RowResult {
    match projector.project(row) {
        Ok(projected) => {
            let outcome = projected.settle(compiled.check(&projected.processed));
            RowResult {
                row: row_number,
                errors: formatter.format_outcome(&outcome),
                warnings: projected.warnings,
            }
        }
        Err(e) => {
            tracing::debug!(row = row_number, error = %e, "row conversion failed");
            RowResult {
                row: row_number,
                errors: vec![DiagnosticFormatter::row_conversion(&e)],
                warnings: Vec::new(),
            }
        }
    }
}
