use rusqlite::types::Value;

use crate::error::DriverError;
use crate::types::RowValues;

/// Code reported when the driver is used after `close`.
pub(crate) const SQLITE_MISUSE: i32 = 21;

/// Extract a `RowValues` from a `SQLite` row.
///
/// # Errors
///
/// Returns `DriverError` if the value cannot be read.
pub fn sqlite_extract_value(row: &rusqlite::Row, idx: usize) -> Result<RowValues, DriverError> {
    let value: Value = row.get(idx)?;
    Ok(match value {
        Value::Null => RowValues::Null,
        Value::Integer(i) => RowValues::Int(i),
        Value::Real(f) => RowValues::Float(f),
        Value::Text(s) => RowValues::Text(s),
        Value::Blob(b) => RowValues::Blob(b),
    })
}

/// Read every row of a prepared statement, returning its column names and values.
///
/// # Errors
/// Returns `DriverError` if stepping the statement or reading a value fails.
pub fn collect_rows(
    stmt: &mut rusqlite::Statement<'_>,
) -> Result<(Vec<String>, Vec<Vec<RowValues>>), DriverError> {
    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let col_count = column_names.len();

    let mut rows = stmt.query([])?;
    let mut collected = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(col_count);
        for i in 0..col_count {
            values.push(sqlite_extract_value(row, i)?);
        }
        collected.push(values);
    }
    Ok((column_names, collected))
}

/// `SQLite` failures carry their extended result code; anything else reports code 0.
impl From<rusqlite::Error> for DriverError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ffi, message) => DriverError::new(
                message.unwrap_or_else(|| ffi.to_string()),
                ffi.extended_code,
            ),
            other => DriverError::new(other.to_string(), 0),
        }
    }
}
