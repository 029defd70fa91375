//! # Diagnostics
//!
//! Output types of a validation run. A [`ValidationIssue`] is one
//! property-scoped message; a [`RowResult`] groups the errors and warnings
//! of one CSV row; a [`RunSummary`] totals the individual diagnostics of
//! the whole run.
//!
//! Row results are only materialized for rows with at least one issue, and
//! are never mutated after they have been emitted.

use serde::{Deserialize, Serialize};

/// A single property-scoped error or warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Column or property the message refers to.
    pub property: String,
    /// Human-readable description with remediation context.
    pub message: String,
}

impl ValidationIssue {
    /// Build an issue from a property name and message.
    pub fn new(property: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.property, self.message)
    }
}

/// Aggregated diagnostics for one CSV row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowResult {
    /// 1-based CSV line number (header is line 1).
    pub row: usize,
    /// Error diagnostics; any error makes the row invalid.
    pub errors: Vec<ValidationIssue>,
    /// Warning diagnostics; never affect validity.
    pub warnings: Vec<ValidationIssue>,
}

impl RowResult {
    /// Whether the row carries no diagnostics at all.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

/// Totals of individual diagnostics across a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// Sum of `errors.len()` over every row result.
    pub total_errors: usize,
    /// Sum of `warnings.len()` over every row result.
    pub total_warnings: usize,
}

impl RunSummary {
    /// Add one row result's diagnostics to the totals.
    pub fn record(&mut self, result: &RowResult) {
        self.total_errors += result.errors.len();
        self.total_warnings += result.warnings.len();
    }

    /// Recompute totals from a list of row results.
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a RowResult>) -> Self {
        let mut summary = Self::default();
        for result in results {
            summary.record(result);
        }
        summary
    }
}

/// User-facing classification of a completed run.
///
/// Errors take precedence over warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// No errors and no warnings.
    Success,
    /// No errors, at least one warning.
    SuccessWithWarnings,
    /// At least one error.
    Failure,
}

impl Outcome {
    /// Classify a run from its summary.
    pub fn from_summary(summary: &RunSummary) -> Self {
        if summary.total_errors > 0 {
            Self::Failure
        } else if summary.total_warnings > 0 {
            Self::SuccessWithWarnings
        } else {
            Self::Success
        }
    }

    /// Whether the run is considered valid.
    pub fn is_success(self) -> bool {
        !matches!(self, Self::Failure)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::SuccessWithWarnings => "success with warnings",
            Self::Failure => "failure",
        };
        f.write_str(s)
    }
}
