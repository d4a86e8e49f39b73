//! Helper utilities for testing and development.

use std::sync::Arc;

use crate::driver::BufferedCursor;
use crate::results::Record;
use crate::types::RowValues;

/// Create a test record with the given column names and values.
#[must_use]
pub fn create_test_record(column_names: &[&str], values: Vec<RowValues>) -> Record {
    Record::new(Arc::new(names(column_names)), values)
}

/// Buffered cursor over literal rows.
#[must_use]
pub fn cursor_from(column_names: &[&str], rows: Vec<Vec<RowValues>>) -> BufferedCursor {
    BufferedCursor::new(Arc::new(names(column_names)), rows)
}

fn names(column_names: &[&str]) -> Vec<String> {
    column_names.iter().map(|c| (*c).to_string()).collect()
}
