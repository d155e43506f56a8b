use std::collections::HashMap;
use std::sync::Arc;

use super::row::{CustomDbRow, build_column_index};
use crate::types::RowValues;

/// A result set from a database query
///
/// Rows are materialized when the statement executes. Reading follows the
/// forward-cursor style of the native client: the cursor starts before the
/// first row and [`ResultSet::next`] advances it. Column positions used by
/// the metadata and positional accessors are 1-based.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// The rows returned by the query
    pub results: Vec<CustomDbRow>,
    /// The number of rows affected (for DML statements) or fetched (for queries)
    pub rows_affected: usize,
    /// Column names shared by all rows (to avoid duplicating in each row)
    column_names: Option<Arc<Vec<String>>>,
    column_index: Option<Arc<HashMap<String, usize>>>,
    cursor: usize,
}

impl ResultSet {
    /// Create a new result set with a known capacity
    #[must_use]
    pub fn with_capacity(capacity: usize) -> ResultSet {
        ResultSet {
            results: Vec::with_capacity(capacity),
            ..ResultSet::default()
        }
    }

    /// Create an empty result set that already knows its column labels.
    #[must_use]
    pub fn with_columns(column_names: Vec<String>) -> ResultSet {
        let mut rs = ResultSet::default();
        rs.set_column_names(Arc::new(column_names));
        rs
    }

    /// Set the column names for this result set (to be shared by all rows)
    pub fn set_column_names(&mut self, column_names: Arc<Vec<String>>) {
        self.column_index = Some(Arc::new(build_column_index(&column_names)));
        self.column_names = Some(column_names);
    }

    /// Get the column names for this result set
    #[must_use]
    pub fn get_column_names(&self) -> Option<&Arc<Vec<String>>> {
        self.column_names.as_ref()
    }

    /// Add a row to the result set
    pub fn add_row_values(&mut self, row_values: Vec<RowValues>) {
        if self.column_names.is_none() {
            self.set_column_names(Arc::new(Vec::new()));
        }
        let (Some(column_names), Some(cache)) = (&self.column_names, &self.column_index) else {
            return;
        };

        self.results.push(CustomDbRow {
            column_names: Arc::clone(column_names),
            rows: row_values,
            column_index_cache: Arc::clone(cache),
        });
        self.rows_affected += 1;
    }

    /// Add a prebuilt row to the result set
    pub fn add_row(&mut self, row: CustomDbRow) {
        if self.column_names.is_none() {
            self.set_column_names(Arc::clone(&row.column_names));
        }

        self.results.push(row);
        self.rows_affected += 1;
    }

    /// Advance the cursor. Returns `false` once the rows are exhausted
    /// (immediately, for an empty result).
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> bool {
        if self.cursor < self.results.len() {
            self.cursor += 1;
            true
        } else {
            self.cursor = self.results.len() + 1;
            false
        }
    }

    /// Move the cursor back before the first row.
    pub fn before_first(&mut self) {
        self.cursor = 0;
    }

    /// The row under the cursor, if `next()` last returned `true`.
    #[must_use]
    pub fn current_row(&self) -> Option<&CustomDbRow> {
        self.cursor
            .checked_sub(1)
            .and_then(|idx| self.results.get(idx))
    }

    /// Value of the named column in the current row.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&RowValues> {
        self.current_row().and_then(|row| row.get(column_name))
    }

    /// Value at a 1-based column position in the current row.
    #[must_use]
    pub fn get_at(&self, column: usize) -> Option<&RowValues> {
        let idx = column.checked_sub(1)?;
        self.current_row().and_then(|row| row.get_by_index(idx))
    }

    /// Text rendering of the named column in the current row.
    #[must_use]
    pub fn get_string(&self, column_name: &str) -> Option<String> {
        self.get(column_name).map(RowValues::to_display_string)
    }

    /// Text rendering of a 1-based column position in the current row.
    #[must_use]
    pub fn get_string_at(&self, column: usize) -> Option<String> {
        self.get_at(column).map(RowValues::to_display_string)
    }

    /// Number of materialized rows.
    #[must_use]
    pub fn rows_count(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.column_names.as_ref().map_or(0, |names| names.len())
    }

    /// Label of a 1-based column position.
    #[must_use]
    pub fn column_label(&self, column: usize) -> Option<&str> {
        let idx = column.checked_sub(1)?;
        self.column_names
            .as_ref()
            .and_then(|names| names.get(idx))
            .map(String::as_str)
    }

    /// 1-based position of a column label.
    #[must_use]
    pub fn find_column(&self, column_name: &str) -> Option<usize> {
        self.column_index
            .as_ref()
            .and_then(|index| index.get(column_name))
            .map(|idx| idx + 1)
    }

    /// Iterate all rows regardless of the cursor.
    pub fn iter(&self) -> std::slice::Iter<'_, CustomDbRow> {
        self.results.iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a CustomDbRow;
    type IntoIter = std::slice::Iter<'a, CustomDbRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}
