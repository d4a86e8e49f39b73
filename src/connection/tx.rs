use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;
use std::panic::Location;

use tracing::debug;

use crate::driver::Driver;
use crate::error::SqlTxnError;

use super::Connection;

/// Where the currently open transaction was started.
#[derive(Debug)]
pub struct TxnOrigin {
    location: &'static Location<'static>,
    backtrace: Backtrace,
}

impl TxnOrigin {
    #[track_caller]
    fn capture() -> Self {
        Self {
            location: Location::caller(),
            backtrace: Backtrace::capture(),
        }
    }

    #[must_use]
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// Captured only when `RUST_BACKTRACE` / `RUST_LIB_BACKTRACE` enable it.
    #[must_use]
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

impl fmt::Display for TxnOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.location)?;
        if self.backtrace.status() == BacktraceStatus::Captured {
            write!(f, "\n{}", self.backtrace)?;
        }
        Ok(())
    }
}

impl<D: Driver> Connection<D> {
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.txn.is_some()
    }

    #[must_use]
    pub fn transaction_origin(&self) -> Option<&TxnOrigin> {
        self.txn.as_ref()
    }

    /// Start a transaction and turn off driver auto-commit.
    ///
    /// # Errors
    /// Returns `SqlTxnError::TransactionAlreadyStarted` (with the origin of the open
    /// transaction) if one is already open, or a classified driver error.
    #[track_caller]
    pub fn begin(&mut self) -> Result<(), SqlTxnError> {
        if let Some(origin) = &self.txn {
            return Err(SqlTxnError::TransactionAlreadyStarted {
                origin: origin.to_string(),
            });
        }
        let origin = TxnOrigin::capture();
        self.driver.set_autocommit(false)?;
        debug!(origin = %origin.location, "transaction started");
        self.txn = Some(origin);
        Ok(())
    }

    /// Commit the open transaction and restore auto-commit.
    ///
    /// # Errors
    /// Returns `SqlTxnError::NoActiveTransaction` when idle, or a classified driver error.
    /// If the driver commit fails the transaction stays open. If only restoring
    /// auto-commit fails, the work is already committed and the transaction is closed.
    pub fn commit(&mut self) -> Result<(), SqlTxnError> {
        if self.txn.is_none() {
            return Err(SqlTxnError::NoActiveTransaction { action: "commit" });
        }
        self.driver.commit()?;
        self.txn = None;
        debug!("transaction committed");
        self.driver.set_autocommit(true)?;
        Ok(())
    }

    /// Roll back the open transaction and restore auto-commit.
    ///
    /// # Errors
    /// Returns `SqlTxnError::NoActiveTransaction` when idle, or a classified driver error.
    /// If the driver rollback fails the transaction stays open; a failed auto-commit
    /// restore is reported with the transaction already closed.
    pub fn rollback(&mut self) -> Result<(), SqlTxnError> {
        if self.txn.is_none() {
            return Err(SqlTxnError::NoActiveTransaction { action: "rollback" });
        }
        self.driver.rollback()?;
        self.txn = None;
        debug!("transaction rolled back");
        self.driver.set_autocommit(true)?;
        Ok(())
    }
}
