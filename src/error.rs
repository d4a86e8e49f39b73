use thiserror::Error;

use crate::statement::ValueKind;

/// Raw failure reported by a driver: its message and numeric error code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (code {code})")]
pub struct DriverError {
    pub message: String,
    pub code: i32,
}

impl DriverError {
    #[must_use]
    pub fn new(message: impl Into<String>, code: i32) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }
}

/// Malformed placeholder syntax in statement text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("placeholder parse error at byte {position}: {reason}")]
pub struct ParseError {
    pub position: usize,
    pub reason: String,
}

impl ParseError {
    pub(crate) fn new(position: usize, reason: impl Into<String>) -> Self {
        Self {
            position,
            reason: reason.into(),
        }
    }
}

/// Parameters that cannot be bound to a parsed template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("placeholder {{{}}} has no matching parameter ({available} given)", .index + 1)]
    MissingParameter { index: usize, available: usize },

    #[error("parameter {} is not referenced by any placeholder", .index + 1)]
    UnusedParameter { index: usize },

    #[error("parameter {} is {found}, placeholder expects {expected}", .index + 1)]
    KindMismatch {
        index: usize,
        expected: ValueKind,
        found: &'static str,
    },

    #[error("parameter {} is a non-finite float", .index + 1)]
    NonFiniteFloat { index: usize },
}

#[derive(Debug, Error)]
pub enum SqlTxnError {
    /// Unique-key violation reported by the database.
    #[error("duplicate entry '{entry}' for key '{key}': {message}")]
    DuplicateEntry {
        key: String,
        entry: String,
        message: String,
        code: i32,
    },

    #[error("database error {code}: {message}")]
    Database { message: String, code: i32 },

    #[error("transaction is already started at: {origin}")]
    TransactionAlreadyStarted { origin: String },

    #[error("no active transaction to {action}")]
    NoActiveTransaction { action: &'static str },

    #[error("DDL inside transaction")]
    DdlInTransaction,

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("column '{0}' is not present in the record")]
    MissingColumn(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl SqlTxnError {
    /// Numeric driver code for errors that originated in the driver.
    #[must_use]
    pub fn code(&self) -> Option<i32> {
        match self {
            SqlTxnError::DuplicateEntry { code, .. } | SqlTxnError::Database { code, .. } => {
                Some(*code)
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn is_duplicate_entry(&self) -> bool {
        matches!(self, SqlTxnError::DuplicateEntry { .. })
    }
}

impl From<DriverError> for SqlTxnError {
    fn from(err: DriverError) -> Self {
        crate::classify::classify_driver_error(err)
    }
}
