//! # CSV Ingestion
//!
//! Reads a CSV file into header-keyed [`Row`]s: the first line is the
//! header, blank lines are skipped, and every cell stays a string. A record
//! whose field count differs from the header is rejected with its line
//! number rather than silently padded or truncated.

use std::io::Read;
use std::path::Path;

use cdv_core::Row;
use thiserror::Error;

/// CSV ingestion failed.
#[derive(Error, Debug)]
pub enum CsvInputError {
    /// The file could not be opened.
    #[error("cannot read CSV file {path}: {reason}")]
    Open {
        /// Path that was opened.
        path: String,
        /// Underlying I/O error.
        reason: String,
    },

    /// The CSV text is malformed.
    #[error("CSV parse error on line {line}: {reason}")]
    Parse {
        /// 1-based line of the offending record (0 when unknown).
        line: u64,
        /// Parser message.
        reason: String,
    },

    /// A record has a different number of fields than the header.
    #[error("CSV line {line} has {found} fields but the header has {expected}")]
    FieldCount {
        /// 1-based line of the offending record.
        line: u64,
        /// Header field count.
        expected: usize,
        /// Record field count.
        found: usize,
    },

    /// The delimiter is not a single-byte character.
    #[error("delimiter {0:?} is not an ASCII character")]
    Delimiter(char),
}

/// Read rows from a CSV file.
///
/// # Errors
///
/// Returns [`CsvInputError`] on I/O failure, malformed CSV, or ragged
/// records.
pub fn read_csv_file(path: &Path, delimiter: char) -> Result<Vec<Row>, CsvInputError> {
    let file = std::fs::File::open(path).map_err(|e| CsvInputError::Open {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    read_rows(file, delimiter)
}

/// Read rows from any CSV source.
///
/// # Errors
///
/// As [`read_csv_file`], minus the open failure.
pub fn read_rows<R: Read>(source: R, delimiter: char) -> Result<Vec<Row>, CsvInputError> {
    if !delimiter.is_ascii() {
        return Err(CsvInputError::Delimiter(delimiter));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter as u8)
        .flexible(true)
        .from_reader(source);

    let headers = reader.headers().map_err(parse_error)?.clone();
    let mut rows = Vec::new();

    for record in reader.records() {
        let record = record.map_err(parse_error)?;
        if record.len() == 1 && record.get(0).is_some_and(str::is_empty) {
            continue;
        }
        let line = record.position().map_or(0, |p| p.line());
        if record.len() != headers.len() {
            return Err(CsvInputError::FieldCount {
                line,
                expected: headers.len(),
                found: record.len(),
            });
        }
        rows.push(headers.iter().zip(record.iter()).collect::<Row>());
    }

    tracing::debug!(rows = rows.len(), columns = headers.len(), "read CSV input");
    Ok(rows)
}

fn parse_error(e: csv::Error) -> CsvInputError {
    CsvInputError::Parse {
        line: e.position().map_or(0, |p| p.line()),
        reason: e.to_string(),
    }
}
