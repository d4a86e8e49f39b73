//! The seam between the connection layer and a concrete database client.
//!
//! A [`Driver`] executes final SQL text and reports failures as [`DriverError`]s; the
//! connection owns everything above that (templates, transactions, error classification).

use std::collections::VecDeque;
use std::sync::Arc;

use crate::error::DriverError;
use crate::types::{ResultMode, RowValues};

/// Forward-only source of rows produced by one statement.
pub trait RowCursor {
    /// Column names in driver order.
    fn columns(&self) -> &Arc<Vec<String>>;

    /// Fetch the next row, or `None` once the cursor is exhausted.
    ///
    /// # Errors
    /// Returns `DriverError` if the driver fails while fetching.
    fn next_row(&mut self) -> Result<Option<Vec<RowValues>>, DriverError>;
}

/// Result sets produced by a multi-statement batch.
pub trait ResultSets {
    fn has_more(&self) -> bool;

    /// Discard the current result set and move to the next one.
    ///
    /// # Errors
    /// Returns the error of the statement that produced the next result set.
    fn advance(&mut self) -> Result<(), DriverError>;
}

/// Outcome of executing a single statement.
pub enum Execution<'a> {
    /// The statement produced rows.
    Rows(Box<dyn RowCursor + 'a>),
    /// The statement completed without a result set; counters are on the driver.
    Completed,
}

impl Execution<'_> {
    #[must_use]
    pub fn is_rows(&self) -> bool {
        matches!(self, Execution::Rows(_))
    }
}

impl std::fmt::Debug for Execution<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Execution::Rows(cursor) => f
                .debug_tuple("Rows")
                .field(cursor.columns().as_ref())
                .finish(),
            Execution::Completed => f.write_str("Completed"),
        }
    }
}

/// A live database client owned exclusively by one `Connection`.
pub trait Driver {
    /// Execute final SQL text.
    ///
    /// # Errors
    /// Returns `DriverError` with the database's message and code on failure.
    fn execute(&mut self, sql: &str, mode: ResultMode) -> Result<Execution<'_>, DriverError>;

    /// Execute a semicolon-joined batch.
    ///
    /// # Errors
    /// Returns `DriverError` if the first statement of the batch fails.
    fn execute_multi(&mut self, sql: &str) -> Result<Box<dyn ResultSets + '_>, DriverError>;

    /// Escape text for inclusion inside a single-quoted SQL literal.
    fn escape(&self, raw: &str) -> String;

    /// # Errors
    /// Returns `DriverError` if the driver rejects the mode change.
    fn set_autocommit(&mut self, enabled: bool) -> Result<(), DriverError>;

    /// # Errors
    /// Returns `DriverError` if the commit fails.
    fn commit(&mut self) -> Result<(), DriverError>;

    /// # Errors
    /// Returns `DriverError` if the rollback fails.
    fn rollback(&mut self) -> Result<(), DriverError>;

    /// Rows changed by the last completed statement.
    fn affected_rows(&self) -> u64;

    /// Id generated by the last insert.
    fn last_insert_id(&self) -> i64;

    /// # Errors
    /// Returns `DriverError` if the client cannot be shut down cleanly.
    fn close(&mut self) -> Result<(), DriverError> {
        Ok(())
    }
}

/// Cursor over rows already fetched into memory.
#[derive(Debug, Clone, Default)]
pub struct BufferedCursor {
    columns: Arc<Vec<String>>,
    rows: VecDeque<Vec<RowValues>>,
}

impl BufferedCursor {
    #[must_use]
    pub fn new(columns: Arc<Vec<String>>, rows: impl IntoIterator<Item = Vec<RowValues>>) -> Self {
        Self {
            columns,
            rows: rows.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl RowCursor for BufferedCursor {
    fn columns(&self) -> &Arc<Vec<String>> {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<Vec<RowValues>>, DriverError> {
        Ok(self.rows.pop_front())
    }
}

/// Batch whose statements have all run already.
#[derive(Debug, Default)]
pub struct DrainedResultSets;

impl ResultSets for DrainedResultSets {
    fn has_more(&self) -> bool {
        false
    }

    fn advance(&mut self) -> Result<(), DriverError> {
        Ok(())
    }
}
