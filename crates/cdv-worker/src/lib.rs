//! # cdv-worker: Background Validation Worker
//!
//! Runs validation requests off the caller's thread and streams their
//! results back as [`WorkerMessage`](cdv_core::WorkerMessage)s.
//!
//! - [`emitter`]: the [`BatchEmitter`] state machine that drives one run
//!   row by row and flushes bounded result batches.
//! - [`worker`]: [`spawn_worker`] and the channel-backed [`WorkerHandle`].
//! - [`collect`]: folds a message stream into a [`ValidationReport`].
//! - [`config`]: [`WorkerConfig`], loadable from YAML.
//!
//! ## Concurrency Model
//!
//! Rows of one run are processed strictly in order on a single blocking
//! task. There is no in-band cancel message: a run is cancelled by
//! dropping the receiving end of its message channel.

pub mod collect;
pub mod config;
pub mod emitter;
pub mod error;
pub mod worker;

pub use collect::{RunCollector, RunEnd, ValidationReport};
pub use config::{DraftSetting, WorkerConfig, DEFAULT_BATCH_SIZE};
pub use emitter::{BatchEmitter, EmitterState, MessageSink};
pub use error::WorkerError;
pub use worker::{spawn_worker, spawn_worker_with, WorkerHandle};
