//! Blocking transactional query layer over a pluggable SQL driver.
//!
//! A [`Connection`] owns one [`Driver`], turns `{}` placeholder templates into final
//! SQL text, enforces a single open transaction with a DDL guard, and wraps row
//! cursors in a [`ResultIterator`] offering list, map, column and JSON views.
//! [`TransactionRunner`] runs a closure between `begin` and `commit`, with optional
//! retries.
//!
//! ```rust
//! use sql_txn_middleware::prelude::*;
//!
//! let mut conn = SqliteDriver::builder(":memory:".into()).wal(false).connect()?;
//! conn.multi_update(
//!     "create table users (id integer primary key, name text not null);
//!      insert into users (name) values ('ann'), ('bob');",
//!     &[],
//! )?;
//! let names = conn
//!     .transaction(|c| {
//!         c.select("select name from users where id > {:i}", &[RowValues::Int(1)])?
//!             .as_column(None)
//!     })?;
//! assert_eq!(names, vec![RowValues::Text("bob".into())]);
//! # Ok::<(), SqlTxnError>(())
//! ```

pub mod classify;
pub mod config;
pub mod connection;
pub mod driver;
pub mod error;
pub mod exports;
pub mod prelude;
pub mod results;
pub mod statement;
pub mod transaction;
pub mod types;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{ConnectionOptions, RetryPolicy};
pub use connection::{Connection, TxnOrigin};
pub use driver::{BufferedCursor, Driver, Execution, ResultSets, RowCursor};
pub use error::{DriverError, FormatError, ParseError, SqlTxnError};
pub use results::{MapEntry, Record, RecordMap, ResultIterator, WalkControl};
pub use statement::{BuiltStatement, Sql, Statement};
pub use transaction::TransactionRunner;
pub use types::{IsolationLevel, ResultMode, RowKey, RowValues};

pub use exports::*;
