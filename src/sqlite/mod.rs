// SQLite driver - runs the connection layer against an embedded database
//
// - config: open options and the fluent builder
// - query: value extraction and error conversion
// - driver: the `Driver` implementation

pub mod config;
pub mod driver;
pub mod query;

pub use config::{SqliteOptions, SqliteOptionsBuilder};
pub use driver::SqliteDriver;

use crate::config::ConnectionOptions;
use crate::connection::Connection;
use crate::error::SqlTxnError;
use crate::statement::BraceParser;

/// Open a `SQLite` database and wrap it in a [`Connection`].
///
/// Templates are parsed with standard SQL quoting, so `'C:\'` is a complete literal.
///
/// # Errors
/// Returns `SqlTxnError::Config` for invalid options, or a classified driver error if
/// the database cannot be opened.
pub fn open_connection(
    opts: &SqliteOptions,
    options: ConnectionOptions,
) -> Result<Connection<SqliteDriver>, SqlTxnError> {
    let driver = SqliteDriver::open(opts)?;
    Ok(Connection::with_options(driver, options)?.with_parser(BraceParser::standard()))
}
