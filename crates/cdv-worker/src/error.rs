//! Error types for the validation worker.

use thiserror::Error;

/// Errors raised by the batch emitter, the worker, and run collection.
///
/// A schema that fails to compile is *not* a `WorkerError`: it is reported
/// in-band as the run's terminal `error` message.
#[derive(Error, Debug)]
pub enum WorkerError {
    /// The peer end of a request or response channel was dropped.
    #[error("worker channel closed")]
    ChannelClosed,

    /// The worker task could not be joined.
    #[error("worker task failed: {0}")]
    Join(String),

    /// No Tokio runtime is available to host the worker.
    #[error("no Tokio runtime available to spawn the validation worker")]
    NoRuntime,

    /// The batch emitter was asked to make a transition its state machine
    /// does not allow.
    #[error("invalid emitter transition from {from} to {to}: {reason}")]
    InvalidTransition {
        /// Current state name.
        from: String,
        /// Attempted target state name.
        to: String,
        /// Reason the transition was rejected.
        reason: String,
    },

    /// A configuration value is out of range.
    #[error("invalid worker configuration: {0}")]
    InvalidConfig(String),

    /// A configuration document is not valid YAML for [`WorkerConfig`].
    ///
    /// [`WorkerConfig`]: crate::WorkerConfig
    #[error("invalid worker configuration YAML: {reason}")]
    ConfigParse {
        /// YAML error, including line and column.
        reason: String,
    },

    /// The configuration file could not be read or parsed.
    #[error("failed to load worker configuration from {path}: {reason}")]
    ConfigLoad {
        /// Path of the configuration file.
        path: String,
        /// Underlying I/O or YAML error.
        reason: String,
    },

    /// A message arrived after the run had already ended.
    #[error("received {kind} message after the run ended")]
    MessageAfterTerminal {
        /// Wire type of the unexpected message.
        kind: &'static str,
    },

    /// The message stream ended before a terminal message.
    #[error("run ended without a complete or error message")]
    IncompleteRun,

    /// The reported totals disagree with the collected row results.
    #[error(
        "run summary mismatch: reported {reported_errors} errors / {reported_warnings} warnings, \
         collected {counted_errors} / {counted_warnings}"
    )]
    SummaryMismatch {
        /// `totalErrors` from the complete message.
        reported_errors: usize,
        /// `totalWarnings` from the complete message.
        reported_warnings: usize,
        /// Errors counted across received batches.
        counted_errors: usize,
        /// Warnings counted across received batches.
        counted_warnings: usize,
    },
}
