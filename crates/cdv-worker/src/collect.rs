//! # Run Collection
//!
//! Folds the message stream of one run back into a [`ValidationReport`].
//! The collector enforces the stream contract: nothing after the terminal
//! message, and a `complete` summary that equals the totals recomputed from
//! the received row results.

use cdv_core::{Outcome, RowResult, RunSummary, WorkerMessage};
use serde::Serialize;

use crate::error::WorkerError;

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum RunEnd {
    /// The run finished with these totals.
    Complete {
        /// Totals reported by the worker.
        summary: RunSummary,
    },
    /// The run was abandoned.
    Failed {
        /// Reason carried by the `error` message.
        message: String,
    },
}

/// Everything a run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// Row results in emission order (which is input row order).
    pub results: Vec<RowResult>,
    /// Number of `resultsBatch` messages received.
    pub batches: usize,
    /// Terminal state of the run.
    pub end: RunEnd,
}

impl ValidationReport {
    /// Reported totals, if the run completed.
    pub fn summary(&self) -> Option<RunSummary> {
        match &self.end {
            RunEnd::Complete { summary } => Some(*summary),
            RunEnd::Failed { .. } => None,
        }
    }

    /// User-facing outcome, if the run completed.
    pub fn outcome(&self) -> Option<Outcome> {
        self.summary().map(|s| Outcome::from_summary(&s))
    }

    /// Error message of an abandoned run.
    pub fn error(&self) -> Option<&str> {
        match &self.end {
            RunEnd::Failed { message } => Some(message),
            RunEnd::Complete { .. } => None,
        }
    }
}

/// Accumulates the messages of a single run.
#[derive(Debug, Default)]
pub struct RunCollector {
    results: Vec<RowResult>,
    batches: usize,
    end: Option<RunEnd>,
}

impl RunCollector {
    /// Start an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the terminal message has been received.
    pub fn is_finished(&self) -> bool {
        self.end.is_some()
    }

    /// Row results received so far.
    pub fn results(&self) -> &[RowResult] {
        &self.results
    }

    /// Record one message.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::MessageAfterTerminal`] if the run already
    /// ended, and [`WorkerError::SummaryMismatch`] if a `complete` summary
    /// disagrees with the collected results.
    pub fn push(&mut self, message: WorkerMessage) -> Result<(), WorkerError> {
        if self.end.is_some() {
            return Err(WorkerError::MessageAfterTerminal {
                kind: wire_type(&message),
            });
        }

        match message {
            WorkerMessage::ResultsBatch { results } => {
                self.batches += 1;
                self.results.extend(results);
            }
            WorkerMessage::Complete(summary) => {
                let counted = RunSummary::from_results(&self.results);
                if counted != summary {
                    return Err(WorkerError::SummaryMismatch {
                        reported_errors: summary.total_errors,
                        reported_warnings: summary.total_warnings,
                        counted_errors: counted.total_errors,
                        counted_warnings: counted.total_warnings,
                    });
                }
                self.end = Some(RunEnd::Complete { summary });
            }
            WorkerMessage::Error { message } => {
                self.end = Some(RunEnd::Failed { message });
            }
        }
        Ok(())
    }

    /// Finish collection.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::IncompleteRun`] if no terminal message was
    /// received.
    pub fn finish(self) -> Result<ValidationReport, WorkerError> {
        let end = self.end.ok_or(WorkerError::IncompleteRun)?;
        Ok(ValidationReport {
            results: self.results,
            batches: self.batches,
            end,
        })
    }

    /// Collect a complete, already-materialized message stream.
    ///
    /// # Errors
    ///
    /// As [`RunCollector::push`] and [`RunCollector::finish`].
    pub fn collect(
        messages: impl IntoIterator<Item = WorkerMessage>,
    ) -> Result<ValidationReport, WorkerError> {
        let mut collector = Self::new();
        for message in messages {
            collector.push(message)?;
        }
        collector.finish()
    }
}

fn wire_type(message: &WorkerMessage) -> &'static str {
    match message {
        WorkerMessage::ResultsBatch { .. } => "resultsBatch",
        WorkerMessage::Complete(_) => "complete",
        WorkerMessage::Error { .. } => "error",
    }
}
