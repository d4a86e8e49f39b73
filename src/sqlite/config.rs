use std::time::Duration;

use serde::Deserialize;

use crate::config::ConnectionOptions;
use crate::connection::Connection;
use crate::error::SqlTxnError;

use super::SqliteDriver;

/// Special path that opens a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// Options for opening a `SQLite` database.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteOptions {
    pub db_path: String,
    /// Switch the journal to WAL after opening.
    #[serde(default = "default_wal")]
    pub wal: bool,
    #[serde(default)]
    pub busy_timeout: Option<Duration>,
}

fn default_wal() -> bool {
    true
}

impl SqliteOptions {
    #[must_use]
    pub fn new(db_path: String) -> Self {
        Self {
            db_path,
            wal: true,
            busy_timeout: None,
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(IN_MEMORY.to_string()).with_wal(false)
    }

    #[must_use]
    pub fn with_wal(mut self, wal: bool) -> Self {
        self.wal = wal;
        self
    }

    #[must_use]
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.db_path == IN_MEMORY
    }
}

/// Fluent builder for `SQLite` options.
#[derive(Debug, Clone)]
pub struct SqliteOptionsBuilder {
    opts: SqliteOptions,
    connection: ConnectionOptions,
}

impl SqliteOptionsBuilder {
    #[must_use]
    pub fn new(db_path: String) -> Self {
        Self {
            opts: SqliteOptions::new(db_path),
            connection: ConnectionOptions::default(),
        }
    }

    #[must_use]
    pub fn wal(mut self, wal: bool) -> Self {
        self.opts.wal = wal;
        self
    }

    #[must_use]
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.opts.busy_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn connection_options(mut self, options: ConnectionOptions) -> Self {
        self.connection = options;
        self
    }

    #[must_use]
    pub fn finish(self) -> SqliteOptions {
        self.opts
    }

    /// Open the database and wrap it in a [`Connection`].
    ///
    /// # Errors
    /// Returns `SqlTxnError` if the options are invalid or the database cannot be opened.
    pub fn connect(self) -> Result<Connection<SqliteDriver>, SqlTxnError> {
        super::open_connection(&self.opts, self.connection)
    }
}

impl SqliteDriver {
    #[must_use]
    pub fn builder(db_path: String) -> SqliteOptionsBuilder {
        SqliteOptionsBuilder::new(db_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_options() {
        let opts = SqliteDriver::builder("app.db".into())
            .wal(false)
            .busy_timeout(Duration::from_millis(250))
            .finish();
        assert_eq!(opts.db_path, "app.db");
        assert!(!opts.wal);
        assert_eq!(opts.busy_timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn deserialize_defaults_to_wal() {
        let opts: SqliteOptions =
            serde_json::from_str(r#"{"db_path": "data.db"}"#).expect("options");
        assert_eq!(opts, SqliteOptions::new("data.db".into()));
        assert!(SqliteOptions::in_memory().is_in_memory());
    }
}
