use std::time::Duration;

use serde::Deserialize;

use crate::error::SqlTxnError;
use crate::types::ResultMode;

/// Default number of parsed templates a connection keeps.
pub const DEFAULT_STATEMENT_CACHE_CAPACITY: usize = 100;

/// Per-connection settings.
///
/// ```rust
/// use sql_txn_middleware::prelude::*;
///
/// let opts = ConnectionOptions::default()
///     .with_statement_cache_capacity(16)
///     .with_result_mode(ResultMode::Streamed);
/// assert_eq!(opts.statement_cache_capacity, 16);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConnectionOptions {
    pub statement_cache_capacity: usize,
    pub result_mode: ResultMode,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            statement_cache_capacity: DEFAULT_STATEMENT_CACHE_CAPACITY,
            result_mode: ResultMode::Buffered,
        }
    }
}

impl ConnectionOptions {
    #[must_use]
    pub fn with_statement_cache_capacity(mut self, capacity: usize) -> Self {
        self.statement_cache_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_result_mode(mut self, mode: ResultMode) -> Self {
        self.result_mode = mode;
        self
    }

    /// Reject settings the connection cannot work with.
    ///
    /// # Errors
    /// Returns `SqlTxnError::Config` when the statement cache capacity is zero.
    pub fn validate(&self) -> Result<(), SqlTxnError> {
        if self.statement_cache_capacity == 0 {
            return Err(SqlTxnError::Config(
                "statement_cache_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// How many times a transactional unit of work is retried, and how long to wait between tries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub retry_count: u32,
    #[serde(with = "seconds")]
    pub retry_delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(retry_count: u32, retry_delay: Duration) -> Self {
        Self {
            retry_count,
            retry_delay,
        }
    }

    /// Single attempt, no retry.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.retry_count.saturating_add(1)
    }
}

mod seconds {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
