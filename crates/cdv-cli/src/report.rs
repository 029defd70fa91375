//! # Text Report
//!
//! Human-readable rendering of a [`ValidationReport`]: totals first, then
//! one block per row with issues, errors before warnings.

use cdv_core::Outcome;
use cdv_worker::{RunEnd, ValidationReport};

/// Render a report for a run over `total_rows` data rows.
pub fn render_text(report: &ValidationReport, total_rows: usize) -> String {
    let invalid = report
        .results
        .iter()
        .filter(|r| !r.errors.is_empty())
        .count();
    let errors: usize = report.results.iter().map(|r| r.errors.len()).sum();
    let warnings: usize = report.results.iter().map(|r| r.warnings.len()).sum();
    let outcome = match &report.end {
        RunEnd::Complete { summary } => Outcome::from_summary(summary).to_string(),
        RunEnd::Failed { message } => format!("aborted ({message})"),
    };

    let mut lines = vec![
        "Validation Report".to_string(),
        "=================".to_string(),
        format!("Total rows: {total_rows}"),
        format!("Valid: {}", total_rows.saturating_sub(invalid)),
        format!("Invalid: {invalid}"),
        format!("Errors: {errors}"),
        format!("Warnings: {warnings}"),
        format!("Outcome: {outcome}"),
    ];

    if !report.results.is_empty() {
        lines.push(String::new());
        lines.push("Rows With Issues".to_string());
        lines.push("----------------".to_string());
        for result in &report.results {
            lines.push(format!("Row {}", result.row));
            lines.extend(result.errors.iter().map(|issue| format!("  error: {issue}")));
            lines.extend(result.warnings.iter().map(|issue| format!("  warning: {issue}")));
        }
    }

    let mut text = lines.join("\n");
    text.push('\n');
    text
}
