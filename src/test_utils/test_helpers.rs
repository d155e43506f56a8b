//! Helper utilities for testing and development.

use std::sync::Arc;

use crate::config::ConnectionParameters;
use crate::results::{CustomDbRow, ResultSet};
use crate::types::RowValues;

/// Create a test row with the given column names and values.
#[must_use]
pub fn create_test_row(column_names: Vec<String>, values: Vec<RowValues>) -> CustomDbRow {
    CustomDbRow::new(Arc::new(column_names), values)
}

/// Create a result set with the given labels and rows.
#[must_use]
pub fn create_test_result_set(column_names: &[&str], rows: Vec<Vec<RowValues>>) -> ResultSet {
    let mut rs = ResultSet::with_columns(column_names.iter().map(|c| (*c).to_string()).collect());
    for row in rows {
        rs.add_row_values(row);
    }
    rs
}

/// `{host: "db1", user: "u", password: "p", schema: "test"}`
#[must_use]
pub fn sample_parameters() -> ConnectionParameters {
    ConnectionParameters::new("db1".into(), "u".into(), "p".into(), "test".into())
}
