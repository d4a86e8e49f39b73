//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::config::{ConnectionOptions, RetryPolicy};
pub use crate::connection::Connection;
pub use crate::driver::{BufferedCursor, Driver, Execution, ResultSets, RowCursor};
pub use crate::error::{DriverError, SqlTxnError};
pub use crate::results::{MapEntry, Record, RecordMap, ResultIterator, WalkControl};
pub use crate::statement::{BuiltStatement, Sql, Statement};
pub use crate::transaction::TransactionRunner;
pub use crate::types::{IsolationLevel, ResultMode, RowKey, RowValues};

#[cfg(feature = "sqlite")]
pub use crate::exports::{SqliteDriver, SqliteOptions, SqliteOptionsBuilder, open_sqlite_connection};
