use std::sync::Arc;

use tracing::debug;

use crate::driver::{BufferedCursor, DrainedResultSets, Driver, Execution, ResultSets};
use crate::error::DriverError;
use crate::types::ResultMode;

use super::config::SqliteOptions;
use super::query::{SQLITE_MISUSE, collect_rows};

/// [`Driver`] over a single `rusqlite` connection.
///
/// Rows are always read into memory before they are handed out, whatever the
/// requested [`ResultMode`]. Turning auto-commit off issues `BEGIN`.
#[derive(Debug)]
pub struct SqliteDriver {
    conn: Option<rusqlite::Connection>,
    affected_rows: u64,
    last_insert_id: i64,
}

impl SqliteDriver {
    /// Open the database described by `opts`.
    ///
    /// # Errors
    /// Returns `DriverError` if the file cannot be opened or configured.
    pub fn open(opts: &SqliteOptions) -> Result<Self, DriverError> {
        let conn = if opts.is_in_memory() {
            rusqlite::Connection::open_in_memory()?
        } else {
            rusqlite::Connection::open(&opts.db_path)?
        };
        if let Some(timeout) = opts.busy_timeout {
            conn.busy_timeout(timeout)?;
        }
        if opts.wal && !opts.is_in_memory() {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        }
        debug!(db_path = %opts.db_path, wal = opts.wal, "opened sqlite database");
        Ok(Self::from_connection(conn))
    }

    /// Wrap an already open `rusqlite` connection.
    #[must_use]
    pub fn from_connection(conn: rusqlite::Connection) -> Self {
        Self {
            conn: Some(conn),
            affected_rows: 0,
            last_insert_id: 0,
        }
    }

    /// The underlying connection, or `None` after `close`.
    #[must_use]
    pub fn raw(&self) -> Option<&rusqlite::Connection> {
        self.conn.as_ref()
    }

    fn conn(&self) -> Result<&rusqlite::Connection, DriverError> {
        self.conn
            .as_ref()
            .ok_or_else(|| DriverError::new("sqlite connection is closed", SQLITE_MISUSE))
    }

    fn batch(&self, sql: &str) -> Result<(), DriverError> {
        self.conn()?.execute_batch(sql)?;
        Ok(())
    }
}

impl Driver for SqliteDriver {
    fn execute(&mut self, sql: &str, _mode: ResultMode) -> Result<Execution<'_>, DriverError> {
        let conn = self
            .conn
            .as_ref()
            .ok_or_else(|| DriverError::new("sqlite connection is closed", SQLITE_MISUSE))?;
        let mut stmt = conn.prepare(sql)?;
        if stmt.column_count() > 0 {
            let (columns, rows) = collect_rows(&mut stmt)?;
            self.affected_rows = rows.len() as u64;
            return Ok(Execution::Rows(Box::new(BufferedCursor::new(
                Arc::new(columns),
                rows,
            ))));
        }
        let changed = stmt.execute([])?;
        self.affected_rows = changed as u64;
        self.last_insert_id = conn.last_insert_rowid();
        Ok(Execution::Completed)
    }

    fn execute_multi(&mut self, sql: &str) -> Result<Box<dyn ResultSets + '_>, DriverError> {
        self.batch(sql)?;
        let (changes, rowid) = {
            let conn = self.conn()?;
            (conn.changes(), conn.last_insert_rowid())
        };
        self.affected_rows = changes;
        self.last_insert_id = rowid;
        Ok(Box::new(DrainedResultSets))
    }

    fn escape(&self, raw: &str) -> String {
        raw.replace('\'', "''")
    }

    fn set_autocommit(&mut self, enabled: bool) -> Result<(), DriverError> {
        let autocommit = self.conn()?.is_autocommit();
        match (enabled, autocommit) {
            (false, true) => self.batch("BEGIN"),
            (true, false) => self.batch("COMMIT"),
            _ => Ok(()),
        }
    }

    fn commit(&mut self) -> Result<(), DriverError> {
        if self.conn()?.is_autocommit() {
            return Ok(());
        }
        self.batch("COMMIT")
    }

    fn rollback(&mut self) -> Result<(), DriverError> {
        if self.conn()?.is_autocommit() {
            return Ok(());
        }
        self.batch("ROLLBACK")
    }

    fn affected_rows(&self) -> u64 {
        self.affected_rows
    }

    fn last_insert_id(&self) -> i64 {
        self.last_insert_id
    }

    fn close(&mut self) -> Result<(), DriverError> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, err)| DriverError::from(err))?;
            debug!("closed sqlite database");
        }
        Ok(())
    }
}
