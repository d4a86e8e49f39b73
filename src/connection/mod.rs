use std::fmt;

use tracing::warn;

use crate::config::ConnectionOptions;
use crate::driver::Driver;
use crate::error::SqlTxnError;
use crate::statement::{
    BraceParser, LiteralFormatter, StatementCache, TemplateFormatter, TemplateParser,
};

mod build;
mod query;
mod tx;

pub use query::is_ddl;
pub use tx::TxnOrigin;

/// Transactional wrapper around one exclusively owned driver.
///
/// Holds the transaction marker and the statement template cache. All operations take
/// `&mut self`; share a connection across threads only behind a `Mutex`.
pub struct Connection<D: Driver> {
    pub(crate) driver: D,
    pub(crate) txn: Option<TxnOrigin>,
    pub(crate) cache: StatementCache,
    pub(crate) parser: Box<dyn TemplateParser + Send>,
    pub(crate) formatter: Box<dyn TemplateFormatter + Send>,
    pub(crate) options: ConnectionOptions,
}

impl<D: Driver> Connection<D> {
    /// Wrap a driver with default options and the brace placeholder syntax.
    #[must_use]
    pub fn new(driver: D) -> Self {
        let options = ConnectionOptions::default();
        Self {
            driver,
            txn: None,
            cache: StatementCache::new(options.statement_cache_capacity),
            parser: Box::new(BraceParser::default()),
            formatter: Box::new(LiteralFormatter),
            options,
        }
    }

    /// Wrap a driver with explicit options.
    ///
    /// # Errors
    /// Returns `SqlTxnError::Config` if the options are invalid.
    pub fn with_options(driver: D, options: ConnectionOptions) -> Result<Self, SqlTxnError> {
        options.validate()?;
        let mut conn = Self::new(driver);
        conn.cache = StatementCache::new(options.statement_cache_capacity);
        conn.options = options;
        Ok(conn)
    }

    /// Replace the placeholder parser. Clears the statement cache.
    #[must_use]
    pub fn with_parser(mut self, parser: impl TemplateParser + Send + 'static) -> Self {
        self.parser = Box::new(parser);
        self.cache.clear();
        self
    }

    /// Replace the parameter formatter.
    #[must_use]
    pub fn with_formatter(mut self, formatter: impl TemplateFormatter + Send + 'static) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    #[must_use]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Direct driver access. Statements issued here bypass the DDL guard and the marker.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    #[must_use]
    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }

    #[must_use]
    pub fn statement_cache(&self) -> &StatementCache {
        &self.cache
    }

    /// Close the driver, rolling back first if a transaction is still open.
    ///
    /// # Errors
    /// Returns a classified driver error if the rollback or the close fails.
    pub fn close(mut self) -> Result<(), SqlTxnError> {
        if self.in_transaction() {
            self.rollback()?;
        }
        self.driver.close()?;
        Ok(())
    }
}

impl<D: Driver> Drop for Connection<D> {
    fn drop(&mut self) {
        if let Some(origin) = self.txn.take() {
            warn!(origin = %origin.location(), "connection dropped inside a transaction; rolling back");
            let result = self
                .driver
                .rollback()
                .and_then(|()| self.driver.set_autocommit(true));
            if let Err(err) = result {
                warn!(error = %err, "rollback on drop failed");
            }
        }
    }
}

impl<D: Driver + fmt::Debug> fmt::Debug for Connection<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("driver", &self.driver)
            .field("in_transaction", &self.txn.is_some())
            .field("cached_statements", &self.cache.len())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
