//! # CSV Rows
//!
//! A [`Row`] is one CSV data line as produced by a header-mode parser:
//! an ordered mapping from column name to raw cell text. Column names may
//! be dot-separated (`address.city`) to denote nesting. Cells are never
//! type-inferred; a cell is either a string, an explicit `null`, or absent.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Raw cell value marking an intentionally blank, quoted cell.
///
/// This is the literal two-character string `""` (quote, quote), which is
/// distinct from an empty string.
pub const EMPTY_QUOTED: &str = "\"\"";

/// CSV line number of the data row at zero-based `index`.
///
/// Line 1 is the header, so the first data row is line 2.
pub fn csv_row_number(index: usize) -> usize {
    index + 2
}

/// One CSV data line, keyed by header name in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    cells: IndexMap<String, Option<String>>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a cell, replacing any previous value for the column.
    pub fn insert(&mut self, column: impl Into<String>, value: Option<String>) {
        self.cells.insert(column.into(), value);
    }

    /// Raw value of a column. `None` when the column is absent,
    /// `Some(None)` when it is present but null.
    pub fn get(&self, column: &str) -> Option<Option<&str>> {
        self.cells.get(column).map(|v| v.as_deref())
    }

    /// Iterate cells in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the row has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            cells: iter
                .into_iter()
                .map(|(k, v)| (k.into(), Some(v.into())))
                .collect(),
        }
    }
}
