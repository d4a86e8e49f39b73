use std::sync::LazyLock;

use regex::Regex;
use tracing::{trace, warn};

use crate::driver::{Driver, Execution};
use crate::error::SqlTxnError;
use crate::results::ResultIterator;
use crate::statement::Sql;
use crate::types::{IsolationLevel, ResultMode, RowValues};

use super::Connection;

static DDL_STATEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(create|drop|alter)").expect("ddl pattern"));

/// True when `sql` starts (after whitespace) with `CREATE`, `DROP` or `ALTER`.
#[must_use]
pub fn is_ddl(sql: &str) -> bool {
    DDL_STATEMENT.is_match(sql)
}

impl<D: Driver> Connection<D> {
    /// DDL implicitly commits on common engines, so it is refused while a transaction is open.
    fn guard_ddl(&self, sql: &str) -> Result<(), SqlTxnError> {
        if self.txn.is_some() && is_ddl(sql) {
            warn!(sql, "refusing DDL inside transaction");
            return Err(SqlTxnError::DdlInTransaction);
        }
        Ok(())
    }

    /// Build and execute a statement using the connection's default result mode.
    ///
    /// # Errors
    /// Returns template errors, `SqlTxnError::DdlInTransaction`, or a classified driver error.
    pub fn query<'a>(
        &mut self,
        sql: impl Into<Sql<'a>>,
        params: &[RowValues],
    ) -> Result<Execution<'_>, SqlTxnError> {
        let mode = self.options.result_mode;
        self.query_opt(sql, mode, params)
    }

    /// Build and execute a statement; `mode` is handed to the driver as-is.
    ///
    /// # Errors
    /// Returns template errors, `SqlTxnError::DdlInTransaction`, or a classified driver error.
    pub fn query_opt<'a>(
        &mut self,
        sql: impl Into<Sql<'a>>,
        mode: ResultMode,
        params: &[RowValues],
    ) -> Result<Execution<'_>, SqlTxnError> {
        let text = self.render(sql.into(), params)?;
        self.guard_ddl(&text)?;
        trace!(sql = %text, ?mode, "executing statement");
        Ok(self.driver.execute(&text, mode)?)
    }

    /// Execute a semicolon-joined batch, discarding every result set it produces.
    ///
    /// # Errors
    /// Returns template errors, `SqlTxnError::DdlInTransaction`, or the first classified
    /// driver error of the batch.
    pub fn multi_update<'a>(
        &mut self,
        sql: impl Into<Sql<'a>>,
        params: &[RowValues],
    ) -> Result<(), SqlTxnError> {
        let text = self.render(sql.into(), params)?;
        self.guard_ddl(&text)?;
        trace!(sql = %text, "executing batch");
        let mut results = self.driver.execute_multi(&text)?;
        while results.has_more() {
            results.advance()?;
        }
        Ok(())
    }

    /// Execute a statement and iterate its rows lazily.
    ///
    /// The iterator borrows the connection until it is dropped.
    ///
    /// # Errors
    /// Returns template errors, `SqlTxnError::DdlInTransaction`, or a classified driver error.
    pub fn select<'a>(
        &mut self,
        sql: impl Into<Sql<'a>>,
        params: &[RowValues],
    ) -> Result<ResultIterator<'_>, SqlTxnError> {
        let mode = self.options.result_mode;
        self.select_opt(sql, mode, params)
    }

    /// Like [`select`](Self::select) with an explicit result mode.
    ///
    /// # Errors
    /// Returns template errors, `SqlTxnError::DdlInTransaction`, or a classified driver error.
    pub fn select_opt<'a>(
        &mut self,
        sql: impl Into<Sql<'a>>,
        mode: ResultMode,
        params: &[RowValues],
    ) -> Result<ResultIterator<'_>, SqlTxnError> {
        match self.query_opt(sql, mode, params)? {
            Execution::Rows(cursor) => Ok(ResultIterator::new(cursor)),
            Execution::Completed => Ok(ResultIterator::empty()),
        }
    }

    /// Execute a statement and return the number of affected rows.
    ///
    /// # Errors
    /// Returns template errors, `SqlTxnError::DdlInTransaction`, or a classified driver error.
    pub fn update<'a>(
        &mut self,
        sql: impl Into<Sql<'a>>,
        params: &[RowValues],
    ) -> Result<u64, SqlTxnError> {
        drop(self.query(sql, params)?);
        Ok(self.driver.affected_rows())
    }

    /// Execute a statement and return the id the driver generated for it.
    ///
    /// # Errors
    /// Returns template errors, `SqlTxnError::DdlInTransaction`, or a classified driver error.
    pub fn insert<'a>(
        &mut self,
        sql: impl Into<Sql<'a>>,
        params: &[RowValues],
    ) -> Result<i64, SqlTxnError> {
        drop(self.query(sql, params)?);
        Ok(self.driver.last_insert_id())
    }

    /// Set the session isolation level for subsequent transactions.
    ///
    /// # Errors
    /// Returns a classified driver error if the database rejects the statement.
    pub fn set_isolation_level(&mut self, level: IsolationLevel) -> Result<(), SqlTxnError> {
        let sql = format!("SET SESSION TRANSACTION ISOLATION LEVEL {level}");
        drop(self.query(sql.as_str(), &[])?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::DriverError;
    use crate::test_utils::{DriverCall, ScriptedDriver};

    #[test]
    fn ddl_pattern_matches_prefix_case_insensitively() {
        assert!(is_ddl("  \n\tCREATE TABLE t (id int)"));
        assert!(is_ddl("drop table t"));
        assert!(is_ddl("Alter table t add c int"));
        assert!(!is_ddl("select 1 -- drop"));
        assert!(!is_ddl("insert into created values (1)"));
    }

    #[test]
    fn ddl_refused_inside_transaction_without_reaching_driver() {
        let mut conn = Connection::new(ScriptedDriver::new());
        conn.begin().expect("begin");
        let err = conn
            .query("  create table t (id int)", &[])
            .expect_err("ddl in transaction");
        assert!(matches!(err, SqlTxnError::DdlInTransaction));
        let err = conn
            .multi_update("DROP TABLE t; select 1", &[])
            .expect_err("ddl in transaction");
        assert!(matches!(err, SqlTxnError::DdlInTransaction));
        assert!(
            conn.driver()
                .calls()
                .iter()
                .all(|c| !matches!(c, DriverCall::Execute { .. } | DriverCall::ExecuteMulti(_)))
        );
    }

    #[test]
    fn ddl_allowed_outside_transaction() {
        let mut conn = Connection::new(ScriptedDriver::new());
        drop(conn.query("create table t (id int)", &[]).expect("ddl"));
        assert_eq!(
            conn.driver().calls(),
            vec![DriverCall::Execute {
                sql: "create table t (id int)".into(),
                mode: ResultMode::Buffered,
            }]
        );
    }

    #[test]
    fn query_builds_and_passes_mode_through() {
        let mut conn = Connection::new(ScriptedDriver::new());
        drop(
            conn.query_opt(
                "delete from t where id = {:i}",
                ResultMode::Streamed,
                &[RowValues::Int(9)],
            )
            .expect("query"),
        );
        assert_eq!(
            conn.driver().calls(),
            vec![DriverCall::Execute {
                sql: "delete from t where id = 9".into(),
                mode: ResultMode::Streamed,
            }]
        );
    }

    #[test]
    fn driver_failure_is_classified() {
        let driver = ScriptedDriver::new().push_error(DriverError::new(
            "Duplicate entry 'bob@example.com' for key 'users.email_unique'",
            1062,
        ));
        let mut conn = Connection::new(driver);
        let err = conn
            .insert("insert into users (email) values ({})", &["bob@example.com".into()])
            .expect_err("duplicate");
        match err {
            SqlTxnError::DuplicateEntry { key, entry, .. } => {
                assert_eq!(key, "users.email_unique");
                assert_eq!(entry, "bob@example.com");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn update_and_insert_read_driver_counters() {
        let driver = ScriptedDriver::new()
            .push_completed(3, 0)
            .push_completed(1, 42);
        let mut conn = Connection::new(driver);
        assert_eq!(conn.update("update t set a = 1", &[]).expect("update"), 3);
        assert_eq!(
            conn.insert("insert into t (a) values ({})", &[RowValues::Int(1)])
                .expect("insert"),
            42
        );
    }

    #[test]
    fn select_wraps_rows_and_empty_results() {
        let driver = ScriptedDriver::new().push_rows(
            &["id", "name"],
            vec![vec![RowValues::Int(1), "a".into()]],
        );
        let mut conn = Connection::new(driver);
        let records = conn
            .select("select id, name from t", &[])
            .expect("select")
            .as_records()
            .expect("records");
        assert_eq!(records.len(), 1);
        assert_eq!(*records[0].column_names, vec!["id".to_string(), "name".to_string()]);

        let mut nothing = conn.select("update t set a = 1", &[]).expect("select");
        assert!(nothing.as_records().expect("records").is_empty());
    }

    #[test]
    fn multi_update_drains_and_surfaces_first_error() {
        let driver = ScriptedDriver::new()
            .push_batch(vec![Ok(()), Ok(()), Ok(())])
            .push_batch(vec![
                Ok(()),
                Err(DriverError::new("Unknown column 'x'", 1054)),
                Err(DriverError::new("never reached", 1)),
            ]);
        let mut conn = Connection::new(driver);
        conn.multi_update("update a set x = 1; update b set y = 2; select 1", &[])
            .expect("batch");
        let err = conn
            .multi_update("update a set x = 1; update b set x = 2", &[])
            .expect_err("second batch");
        assert_eq!(err.code(), Some(1054));
    }

    #[test]
    fn isolation_level_goes_through_query() {
        let mut conn = Connection::new(ScriptedDriver::new());
        conn.set_isolation_level(IsolationLevel::ReadCommitted)
            .expect("isolation");
        assert_eq!(
            conn.driver().calls(),
            vec![DriverCall::Execute {
                sql: "SET SESSION TRANSACTION ISOLATION LEVEL READ COMMITTED".into(),
                mode: ResultMode::Buffered,
            }]
        );
    }

    #[test]
    fn prepared_and_built_statements_skip_reparsing() {
        let mut conn = Connection::new(ScriptedDriver::new());
        let prepared = conn.prepare("select {}").expect("prepare");
        let again = conn.prepare("select {}").expect("prepare");
        assert!(prepared.ptr_eq(&again));
        assert_eq!(conn.statement_cache().len(), 1);

        let plain = conn.prepare("select 1").expect("prepare");
        assert!(matches!(plain, crate::statement::Statement::Plain(ref t) if Arc::strong_count(t) == 1));
        assert_eq!(conn.statement_cache().len(), 1);

        let built = conn.build(&prepared, &["x".into()]).expect("build");
        drop(conn.query(&built, &[]).expect("query"));
        assert_eq!(
            conn.driver().calls(),
            vec![DriverCall::Execute {
                sql: "select 'x'".into(),
                mode: ResultMode::Buffered,
            }]
        );
    }
}
