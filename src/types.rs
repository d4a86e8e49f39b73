use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value as JsonValue;

/// Values that can be stored in a database row or used as statement parameters.
///
/// ```rust
/// use sql_txn_middleware::prelude::*;
///
/// let params = vec![
///     RowValues::Int(1),
///     RowValues::Text("alice".into()),
///     RowValues::Bool(true),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value
    JSON(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

pub(crate) const TIMESTAMP_FORMAT: &str = "%F %T%.f";

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let RowValues::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<&bool> {
        if let RowValues::Bool(value) = self {
            return Some(value);
        } else if let Some(i) = self.as_int() {
            if *i == 1 {
                return Some(&true);
            } else if *i == 0 {
                return Some(&false);
            }
        }
        None
    }

    /// Timestamps as-is; text in the bound literal format (`2024-01-02 03:04:05[.fff]`)
    /// is parsed, so values read back from text columns convert too.
    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            RowValues::Timestamp(value) => Some(*value),
            RowValues::Text(s) => NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            RowValues::Float(value) => Some(*value),
            #[allow(clippy::cast_precision_loss)]
            RowValues::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let RowValues::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    /// Short name of the variant, used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            RowValues::Int(_) => "int",
            RowValues::Float(_) => "float",
            RowValues::Text(_) => "text",
            RowValues::Bool(_) => "bool",
            RowValues::Timestamp(_) => "timestamp",
            RowValues::Null => "null",
            RowValues::JSON(_) => "json",
            RowValues::Blob(_) => "blob",
        }
    }
}

impl Serialize for RowValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RowValues::Int(i) => serializer.serialize_i64(*i),
            RowValues::Float(f) => serializer.serialize_f64(*f),
            RowValues::Text(s) => serializer.serialize_str(s),
            RowValues::Bool(b) => serializer.serialize_bool(*b),
            RowValues::Timestamp(dt) => {
                serializer.collect_str(&dt.format(TIMESTAMP_FORMAT))
            }
            RowValues::Null => serializer.serialize_unit(),
            RowValues::JSON(value) => value.serialize(serializer),
            RowValues::Blob(bytes) => bytes.serialize(serializer),
        }
    }
}

impl From<i64> for RowValues {
    fn from(value: i64) -> Self {
        RowValues::Int(value)
    }
}

impl From<i32> for RowValues {
    fn from(value: i32) -> Self {
        RowValues::Int(i64::from(value))
    }
}

impl From<f64> for RowValues {
    fn from(value: f64) -> Self {
        RowValues::Float(value)
    }
}

impl From<bool> for RowValues {
    fn from(value: bool) -> Self {
        RowValues::Bool(value)
    }
}

impl From<&str> for RowValues {
    fn from(value: &str) -> Self {
        RowValues::Text(value.to_string())
    }
}

impl From<String> for RowValues {
    fn from(value: String) -> Self {
        RowValues::Text(value)
    }
}

impl From<NaiveDateTime> for RowValues {
    fn from(value: NaiveDateTime) -> Self {
        RowValues::Timestamp(value)
    }
}

impl From<JsonValue> for RowValues {
    fn from(value: JsonValue) -> Self {
        RowValues::JSON(value)
    }
}

impl From<Vec<u8>> for RowValues {
    fn from(value: Vec<u8>) -> Self {
        RowValues::Blob(value)
    }
}

impl<T: Into<RowValues>> From<Option<T>> for RowValues {
    fn from(value: Option<T>) -> Self {
        value.map_or(RowValues::Null, Into::into)
    }
}

/// Hashable key derived from a column value, used by the keyed result views.
///
/// Booleans collapse to `Int(0|1)`; floats, timestamps and JSON collapse to their text
/// rendering. Two rows whose values render to the same key overwrite each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum RowKey {
    Int(i64),
    Text(String),
    Bytes(Vec<u8>),
    Null,
}

impl From<&RowValues> for RowKey {
    fn from(value: &RowValues) -> Self {
        match value {
            RowValues::Int(i) => RowKey::Int(*i),
            RowValues::Bool(b) => RowKey::Int(i64::from(*b)),
            RowValues::Float(f) => RowKey::Text(f.to_string()),
            RowValues::Text(s) => RowKey::Text(s.clone()),
            RowValues::Timestamp(dt) => RowKey::Text(dt.format(TIMESTAMP_FORMAT).to_string()),
            RowValues::JSON(v) => RowKey::Text(v.to_string()),
            RowValues::Blob(b) => RowKey::Bytes(b.clone()),
            RowValues::Null => RowKey::Null,
        }
    }
}

impl From<i64> for RowKey {
    fn from(value: i64) -> Self {
        RowKey::Int(value)
    }
}

impl From<&str> for RowKey {
    fn from(value: &str) -> Self {
        RowKey::Text(value.to_string())
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKey::Int(i) => write!(f, "{i}"),
            RowKey::Text(s) => f.write_str(s),
            RowKey::Bytes(b) => {
                for byte in b {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
            RowKey::Null => f.write_str("NULL"),
        }
    }
}

/// How the driver should materialise rows for a statement.
///
/// The connection passes this through untouched; drivers decide what it means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultMode {
    /// Fetch the whole result into client memory before returning.
    #[default]
    Buffered,
    /// Stream rows from the server as the cursor advances.
    Streamed,
}

/// Session transaction isolation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_collapse_bools_and_keep_text() {
        assert_eq!(RowKey::from(&RowValues::Bool(true)), RowKey::Int(1));
        assert_eq!(
            RowKey::from(&RowValues::Text("a".into())),
            RowKey::Text("a".into())
        );
        assert_eq!(RowKey::from(&RowValues::Null), RowKey::Null);
    }

    #[test]
    fn serializes_values_as_plain_json() {
        let ts = NaiveDateTime::parse_from_str("2024-01-02 03:04:05", "%Y-%m-%d %H:%M:%S")
            .expect("timestamp");
        let json = serde_json::to_value(vec![
            RowValues::Int(7),
            RowValues::Null,
            RowValues::Timestamp(ts),
            RowValues::JSON(serde_json::json!({"a": 1})),
        ])
        .expect("serialize");
        assert_eq!(
            json,
            serde_json::json!([7, null, "2024-01-02 03:04:05", {"a": 1}])
        );
    }

    #[test]
    fn bool_accessor_accepts_zero_and_one() {
        assert_eq!(RowValues::Bool(false).as_bool(), Some(&false));
        assert_eq!(RowValues::Int(1).as_bool(), Some(&true));
        assert_eq!(RowValues::Int(0).as_bool(), Some(&false));
        assert_eq!(RowValues::Int(2).as_bool(), None);
        assert_eq!(RowValues::Text("1".into()).as_bool(), None);
    }

    #[test]
    fn timestamp_accessor_reads_the_literal_format() {
        let ts = NaiveDateTime::parse_from_str("2024-01-02 03:04:05.250", "%Y-%m-%d %H:%M:%S%.f")
            .expect("timestamp");
        let rendered = ts.format(TIMESTAMP_FORMAT).to_string();
        assert_eq!(RowValues::Text(rendered).as_timestamp(), Some(ts));
        assert_eq!(RowValues::Timestamp(ts).as_timestamp(), Some(ts));

        let whole = NaiveDateTime::parse_from_str("2024-01-02 03:04:05", "%Y-%m-%d %H:%M:%S")
            .expect("timestamp");
        assert_eq!(
            RowValues::Text("2024-01-02 03:04:05".into()).as_timestamp(),
            Some(whole)
        );
        assert_eq!(RowValues::Text("yesterday".into()).as_timestamp(), None);
        assert_eq!(RowValues::Int(0).as_timestamp(), None);
    }

    #[test]
    fn float_and_blob_accessors() {
        assert_eq!(RowValues::Float(1.5).as_float(), Some(1.5));
        assert_eq!(RowValues::Int(3).as_float(), Some(3.0));
        assert_eq!(RowValues::Text("1.5".into()).as_float(), None);
        assert_eq!(RowValues::Blob(vec![0, 255]).as_blob(), Some(&[0u8, 255][..]));
        assert_eq!(RowValues::Null.as_blob(), None);
    }

    #[test]
    fn option_maps_none_to_null() {
        assert_eq!(RowValues::from(None::<i64>), RowValues::Null);
        assert_eq!(RowValues::from(Some("x")), RowValues::Text("x".into()));
    }

    #[test]
    fn isolation_level_renders_sql_keywords() {
        assert_eq!(IsolationLevel::RepeatableRead.to_string(), "REPEATABLE READ");
    }
}
