use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::driver::{BufferedCursor, DrainedResultSets, Driver, Execution, ResultSets};
use crate::error::DriverError;
use crate::types::{ResultMode, RowValues};

/// One call received by a [`ScriptedDriver`].
#[derive(Debug, Clone, PartialEq)]
pub enum DriverCall {
    Execute { sql: String, mode: ResultMode },
    ExecuteMulti(String),
    SetAutocommit(bool),
    Commit,
    Rollback,
    Close,
}

/// Shared handle on the calls a [`ScriptedDriver`] has seen.
///
/// Outlives the driver, so calls made while a `Connection` drops can still be inspected.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<DriverCall>>>);

impl CallLog {
    fn push(&self, call: DriverCall) {
        self.0
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(call);
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<DriverCall> {
        self.0
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[derive(Debug)]
enum Reply {
    Rows {
        columns: Arc<Vec<String>>,
        rows: Vec<Vec<RowValues>>,
    },
    Completed {
        affected_rows: u64,
        last_insert_id: i64,
    },
    Error(DriverError),
    Batch(VecDeque<Result<(), DriverError>>),
}

/// Driver that answers statements from a queue of scripted replies.
///
/// Statements beyond the script complete with no affected rows. Escaping follows the
/// MySQL backslash convention.
#[derive(Debug, Default)]
pub struct ScriptedDriver {
    replies: VecDeque<Reply>,
    commit_failures: VecDeque<DriverError>,
    rollback_failures: VecDeque<DriverError>,
    autocommit_off_failures: VecDeque<DriverError>,
    autocommit_on_failures: VecDeque<DriverError>,
    log: CallLog,
    affected_rows: u64,
    last_insert_id: i64,
}

impl ScriptedDriver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a result set for the next executed statement.
    #[must_use]
    pub fn push_rows(mut self, columns: &[&str], rows: Vec<Vec<RowValues>>) -> Self {
        self.replies.push_back(Reply::Rows {
            columns: Arc::new(columns.iter().map(|c| (*c).to_string()).collect()),
            rows,
        });
        self
    }

    /// Queue a row-less completion with the given counters.
    #[must_use]
    pub fn push_completed(mut self, affected_rows: u64, last_insert_id: i64) -> Self {
        self.replies.push_back(Reply::Completed {
            affected_rows,
            last_insert_id,
        });
        self
    }

    /// Queue a failure for the next executed statement or batch.
    #[must_use]
    pub fn push_error(mut self, error: DriverError) -> Self {
        self.replies.push_back(Reply::Error(error));
        self
    }

    /// Queue the per-statement outcomes of the next batch.
    #[must_use]
    pub fn push_batch(mut self, outcomes: Vec<Result<(), DriverError>>) -> Self {
        self.replies.push_back(Reply::Batch(outcomes.into()));
        self
    }

    /// Fail the next commit. Repeat to fail several.
    #[must_use]
    pub fn fail_commit(mut self, error: DriverError) -> Self {
        self.commit_failures.push_back(error);
        self
    }

    /// Fail the next rollback. Repeat to fail several.
    #[must_use]
    pub fn fail_rollback(mut self, error: DriverError) -> Self {
        self.rollback_failures.push_back(error);
        self
    }

    /// Fail the next call that switches auto-commit to `enabled`.
    ///
    /// `false` targets `begin`; `true` targets the restore after a commit or rollback.
    #[must_use]
    pub fn fail_autocommit(mut self, enabled: bool, error: DriverError) -> Self {
        if enabled {
            self.autocommit_on_failures.push_back(error);
        } else {
            self.autocommit_off_failures.push_back(error);
        }
        self
    }

    #[must_use]
    pub fn call_log(&self) -> CallLog {
        self.log.clone()
    }

    #[must_use]
    pub fn calls(&self) -> Vec<DriverCall> {
        self.log.snapshot()
    }

    /// Replies not yet consumed.
    #[must_use]
    pub fn pending_replies(&self) -> usize {
        self.replies.len()
    }
}

struct ScriptedBatch {
    pending: VecDeque<Result<(), DriverError>>,
}

impl ResultSets for ScriptedBatch {
    fn has_more(&self) -> bool {
        !self.pending.is_empty()
    }

    fn advance(&mut self) -> Result<(), DriverError> {
        self.pending.pop_front().unwrap_or(Ok(()))
    }
}

impl Driver for ScriptedDriver {
    fn execute(&mut self, sql: &str, mode: ResultMode) -> Result<Execution<'_>, DriverError> {
        self.log.push(DriverCall::Execute {
            sql: sql.to_string(),
            mode,
        });
        match self.replies.pop_front() {
            Some(Reply::Rows { columns, rows }) => {
                self.affected_rows = rows.len() as u64;
                Ok(Execution::Rows(Box::new(BufferedCursor::new(columns, rows))))
            }
            Some(Reply::Error(error)) => Err(error),
            Some(Reply::Completed {
                affected_rows,
                last_insert_id,
            }) => {
                self.affected_rows = affected_rows;
                self.last_insert_id = last_insert_id;
                Ok(Execution::Completed)
            }
            Some(Reply::Batch(_)) | None => {
                self.affected_rows = 0;
                Ok(Execution::Completed)
            }
        }
    }

    fn execute_multi(&mut self, sql: &str) -> Result<Box<dyn ResultSets + '_>, DriverError> {
        self.log.push(DriverCall::ExecuteMulti(sql.to_string()));
        match self.replies.pop_front() {
            Some(Reply::Error(error)) => Err(error),
            Some(Reply::Batch(mut pending)) => {
                pending.pop_front().unwrap_or(Ok(()))?;
                Ok(Box::new(ScriptedBatch { pending }))
            }
            Some(_) | None => Ok(Box::new(DrainedResultSets)),
        }
    }

    fn escape(&self, raw: &str) -> String {
        let mut out = String::with_capacity(raw.len());
        for ch in raw.chars() {
            match ch {
                '\\' => out.push_str("\\\\"),
                '\'' => out.push_str("\\'"),
                '\0' => out.push_str("\\0"),
                other => out.push(other),
            }
        }
        out
    }

    fn set_autocommit(&mut self, enabled: bool) -> Result<(), DriverError> {
        self.log.push(DriverCall::SetAutocommit(enabled));
        let failures = if enabled {
            &mut self.autocommit_on_failures
        } else {
            &mut self.autocommit_off_failures
        };
        failures.pop_front().map_or(Ok(()), Err)
    }

    fn commit(&mut self) -> Result<(), DriverError> {
        self.log.push(DriverCall::Commit);
        self.commit_failures.pop_front().map_or(Ok(()), Err)
    }

    fn rollback(&mut self) -> Result<(), DriverError> {
        self.log.push(DriverCall::Rollback);
        self.rollback_failures.pop_front().map_or(Ok(()), Err)
    }

    fn affected_rows(&self) -> u64 {
        self.affected_rows
    }

    fn last_insert_id(&self) -> i64 {
        self.last_insert_id
    }

    fn close(&mut self) -> Result<(), DriverError> {
        self.log.push(DriverCall::Close);
        Ok(())
    }
}
