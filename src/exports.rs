//! Database-specific type exports.
//!
//! Conditional feature exports for the bundled drivers, kept in one place.

// SQLite exports
#[cfg(feature = "sqlite")]
pub use crate::sqlite::SqliteDriver;
#[cfg(feature = "sqlite")]
pub use crate::sqlite::SqliteOptions;
#[cfg(feature = "sqlite")]
pub use crate::sqlite::SqliteOptionsBuilder;
#[cfg(feature = "sqlite")]
pub use crate::sqlite::open_connection as open_sqlite_connection;
