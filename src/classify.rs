use std::sync::LazyLock;

use regex::Regex;

use crate::error::{DriverError, SqlTxnError};

static DUPLICATE_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Duplicate entry '(.+)' for key '(.+)'").expect("duplicate entry pattern")
});

/// Turn a driver error message and code into a typed error.
///
/// Messages of the form `Duplicate entry '<value>' for key '<key>'` become
/// [`SqlTxnError::DuplicateEntry`] with the key and value copied verbatim out
/// of the message. Anything else, including messages that only resemble that
/// shape, becomes [`SqlTxnError::Database`].
///
/// ```rust
/// use sql_txn_middleware::classify::classify;
/// use sql_txn_middleware::SqlTxnError;
///
/// let err = classify("Duplicate entry 'bob@example.com' for key 'users.email_unique'", 1062);
/// match err {
///     SqlTxnError::DuplicateEntry { key, entry, .. } => {
///         assert_eq!(key, "users.email_unique");
///         assert_eq!(entry, "bob@example.com");
///     }
///     other => panic!("unexpected {other:?}"),
/// }
/// ```
#[must_use]
pub fn classify(message: &str, code: i32) -> SqlTxnError {
    if let Some(caps) = DUPLICATE_ENTRY.captures(message) {
        return SqlTxnError::DuplicateEntry {
            key: caps[2].to_string(),
            entry: caps[1].to_string(),
            message: message.to_string(),
            code,
        };
    }
    SqlTxnError::Database {
        message: message.to_string(),
        code,
    }
}

#[must_use]
pub fn classify_driver_error(err: DriverError) -> SqlTxnError {
    classify(&err.message, err.code)
}
