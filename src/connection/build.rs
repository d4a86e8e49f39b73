use std::borrow::Cow;

use crate::driver::Driver;
use crate::error::SqlTxnError;
use crate::statement::{BuiltStatement, PLACEHOLDER_MARKER, Sql, Statement};
use crate::types::RowValues;

use super::Connection;

impl<D: Driver> Connection<D> {
    /// Parse statement text for later building.
    ///
    /// Text without a placeholder marker is returned as a plain statement without touching
    /// the cache or the parser.
    ///
    /// # Errors
    /// Returns `SqlTxnError::Parse` on malformed placeholder syntax.
    pub fn prepare(&mut self, sql: &str) -> Result<Statement, SqlTxnError> {
        if sql.contains(PLACEHOLDER_MARKER) {
            Ok(self.cache.get_or_parse(sql, self.parser.as_ref())?)
        } else {
            Ok(Statement::plain(sql))
        }
    }

    /// Bind `params` into a statement, producing final SQL text.
    ///
    /// Text parameters are escaped by the live driver. Plain and already-built statements
    /// come back unchanged.
    ///
    /// ```rust
    /// # use sql_txn_middleware::prelude::*;
    /// # use sql_txn_middleware::test_utils::ScriptedDriver;
    /// let mut conn = Connection::new(ScriptedDriver::new());
    /// let built = conn.build("select * from users where name = {:s}", &["o'neil".into()])?;
    /// assert_eq!(built.as_str(), "select * from users where name = 'o\\'neil'");
    /// # Ok::<(), SqlTxnError>(())
    /// ```
    ///
    /// # Errors
    /// Returns `SqlTxnError::Parse` or `SqlTxnError::Format` from the template collaborators.
    pub fn build<'a>(
        &mut self,
        sql: impl Into<Sql<'a>>,
        params: &[RowValues],
    ) -> Result<BuiltStatement, SqlTxnError> {
        match self.render(sql.into(), params)? {
            Cow::Owned(text) => Ok(BuiltStatement::new(text)),
            Cow::Borrowed(text) => Ok(BuiltStatement::new(text)),
        }
    }

    pub(crate) fn render<'a>(
        &mut self,
        sql: Sql<'a>,
        params: &[RowValues],
    ) -> Result<Cow<'a, str>, SqlTxnError> {
        let statement = match sql {
            Sql::Built(built) => return Ok(Cow::Borrowed(built.as_str())),
            Sql::Prepared(Statement::Plain(text)) => return Ok(Cow::Borrowed(&**text)),
            Sql::Text(text) if !text.contains(PLACEHOLDER_MARKER) => {
                return Ok(Cow::Borrowed(text));
            }
            Sql::Text(text) => self.prepare(text)?,
            Sql::Prepared(statement) => statement.clone(),
        };
        match statement {
            Statement::Plain(text) => Ok(Cow::Owned(text.to_string())),
            Statement::Template(template) => {
                let driver = &self.driver;
                let escape = |raw: &str| driver.escape(raw);
                let text = self.formatter.format(&template, params, &escape)?;
                Ok(Cow::Owned(text))
            }
        }
    }
}
