//! # cdv-core: Foundational Types for the CSV Data Validator
//!
//! Defines the data model shared by every other crate in the workspace:
//! the raw CSV [`Row`], the property-scoped [`ValidationIssue`], the
//! per-row [`RowResult`], the [`RunSummary`], and the request/response
//! messages exchanged with the background validation worker.
//!
//! ## Key Design Principles
//!
//! 1. **Rows stay strings.** A [`Row`] maps column names to raw cell text.
//!    Type coercion happens later, driven by the schema, never here.
//!
//! 2. **Totals count diagnostics, not rows.** [`RunSummary`] sums the
//!    individual errors and warnings across all row results.
//!
//! 3. **One wire shape.** [`WorkerRequest`] and [`WorkerMessage`] serialize
//!    as `{ "type": ..., "payload": ... }` so the same messages can cross a
//!    channel, a process boundary, or be printed as JSON lines.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `cdv-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod diagnostic;
pub mod error;
pub mod message;
pub mod row;

pub use diagnostic::{Outcome, RowResult, RunSummary, ValidationIssue};
pub use error::{parse_schema_text, CoreError};
pub use message::{ValidatePayload, WorkerMessage, WorkerRequest};
pub use row::{csv_row_number, Row, EMPTY_QUOTED};
