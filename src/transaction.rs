//! Run a unit of work inside a transaction, optionally retrying it.

use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::RetryPolicy;
use crate::connection::Connection;
use crate::driver::Driver;
use crate::error::SqlTxnError;

/// Binds a connection to a closure that is run between `begin` and `commit`.
///
/// The closure receives the connection and returns `Result<T, E>`; arguments are
/// whatever it captures. Any `E` that can absorb a [`SqlTxnError`] works, so
/// application error types pass through untouched.
///
/// ```rust
/// # use sql_txn_middleware::prelude::*;
/// # use sql_txn_middleware::test_utils::ScriptedDriver;
/// let mut conn = Connection::new(ScriptedDriver::new().push_completed(1, 7));
/// let id = TransactionRunner::new(&mut conn, |c: &mut Connection<_>| {
///     c.insert("insert into users (name) values ({})", &["ann".into()])
/// })
/// .run()?;
/// assert_eq!(id, 7);
/// assert!(!conn.in_transaction());
/// # Ok::<(), SqlTxnError>(())
/// ```
pub struct TransactionRunner<'c, D: Driver, F> {
    conn: &'c mut Connection<D>,
    work: F,
}

enum Failure<E> {
    /// `begin` refused; nothing to undo.
    Begin(E),
    /// The work or its commit failed and the rollback went through.
    Work(E),
    Rollback(E),
    /// The transaction closed before the commit error (e.g. restoring auto-commit failed
    /// after the driver commit); never rolled back or retried.
    Committed(E),
}

impl<'c, D: Driver, F> TransactionRunner<'c, D, F> {
    pub fn new(conn: &'c mut Connection<D>, work: F) -> Self {
        Self { conn, work }
    }

    /// Run the work once: commit on success, roll back and return the error on failure.
    ///
    /// # Errors
    /// Returns the work's error, the commit error, or the rollback error if rolling back
    /// also failed.
    #[track_caller]
    pub fn run<T, E>(mut self) -> Result<T, E>
    where
        F: FnMut(&mut Connection<D>) -> Result<T, E>,
        E: From<SqlTxnError>,
    {
        match self.attempt() {
            Ok(value) => Ok(value),
            Err(
                Failure::Begin(err)
                | Failure::Work(err)
                | Failure::Rollback(err)
                | Failure::Committed(err),
            ) => Err(err),
        }
    }

    /// Run the work up to `retry_count + 1` times, sleeping `retry_delay` between
    /// failed attempts.
    ///
    /// Every failure of the work (or its commit) is retried. A failing `begin` or
    /// rollback ends the loop immediately, as does a commit that went through but could
    /// not restore auto-commit.
    ///
    /// # Errors
    /// Returns the error of the last attempt.
    #[track_caller]
    pub fn run_retry<T, E>(mut self, retry_count: u32, retry_delay: Duration) -> Result<T, E>
    where
        F: FnMut(&mut Connection<D>) -> Result<T, E>,
        E: From<SqlTxnError>,
    {
        let attempts = retry_count.saturating_add(1);
        let mut attempt = 1;
        loop {
            match self.attempt() {
                Ok(value) => return Ok(value),
                Err(Failure::Work(_)) if attempt < attempts => {
                    warn!(attempt, attempts, "transaction attempt failed; retrying");
                    if !retry_delay.is_zero() {
                        thread::sleep(retry_delay);
                    }
                    attempt += 1;
                }
                Err(Failure::Work(err)) => {
                    warn!(attempt, attempts, "transaction failed on final attempt");
                    return Err(err);
                }
                Err(Failure::Begin(err) | Failure::Rollback(err) | Failure::Committed(err)) => {
                    return Err(err);
                }
            }
        }
    }

    /// [`run_retry`](Self::run_retry) with counts taken from a [`RetryPolicy`].
    ///
    /// # Errors
    /// Returns the error of the last attempt.
    #[track_caller]
    pub fn run_with_policy<T, E>(self, policy: &RetryPolicy) -> Result<T, E>
    where
        F: FnMut(&mut Connection<D>) -> Result<T, E>,
        E: From<SqlTxnError>,
    {
        self.run_retry(policy.retry_count, policy.retry_delay)
    }

    #[track_caller]
    fn attempt<T, E>(&mut self) -> Result<T, Failure<E>>
    where
        F: FnMut(&mut Connection<D>) -> Result<T, E>,
        E: From<SqlTxnError>,
    {
        if let Err(err) = self.conn.begin() {
            return Err(Failure::Begin(err.into()));
        }
        let value = match (self.work)(&mut *self.conn) {
            Ok(value) => value,
            Err(err) => return Err(self.undo(err)),
        };
        match self.conn.commit() {
            Ok(()) => Ok(value),
            Err(err) if !self.conn.in_transaction() => {
                warn!(error = %err, "commit failed after the transaction was closed; not rolling back");
                Err(Failure::Committed(err.into()))
            }
            Err(err) => Err(self.undo(err.into())),
        }
    }

    fn undo<E: From<SqlTxnError>>(&mut self, err: E) -> Failure<E> {
        // the work may have finished the transaction itself
        if self.conn.in_transaction() {
            if let Err(rollback_err) = self.conn.rollback() {
                warn!(error = %rollback_err, "rollback after failed transaction failed");
                return Failure::Rollback(rollback_err.into());
            }
            debug!("transaction work failed; rolled back");
        }
        Failure::Work(err)
    }
}

impl<D: Driver> Connection<D> {
    /// Run `work` in a transaction once. See [`TransactionRunner::run`].
    ///
    /// # Errors
    /// Returns the work's error, or the commit/rollback error.
    #[track_caller]
    pub fn transaction<T, E, F>(&mut self, work: F) -> Result<T, E>
    where
        F: FnMut(&mut Self) -> Result<T, E>,
        E: From<SqlTxnError>,
    {
        TransactionRunner::new(self, work).run()
    }

    /// Run `work` in a transaction, retrying per `policy`.
    ///
    /// # Errors
    /// Returns the error of the last attempt.
    #[track_caller]
    pub fn transaction_with_retry<T, E, F>(&mut self, policy: &RetryPolicy, work: F) -> Result<T, E>
    where
        F: FnMut(&mut Self) -> Result<T, E>,
        E: From<SqlTxnError>,
    {
        TransactionRunner::new(self, work).run_with_policy(policy)
    }
}
