#![cfg(feature = "sqlite")]

use sql_txn_middleware::prelude::*;
use tempfile::tempdir;

fn unique_db_path(prefix: &str) -> String {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join(format!("{prefix}.db"));
    // Leak the tempdir so the file persists for the duration of the test binary.
    std::mem::forget(dir);
    path.to_string_lossy().into_owned()
}

fn setup(conn: &mut Connection<SqliteDriver>) -> Result<(), SqlTxnError> {
    conn.multi_update(
        "CREATE TABLE IF NOT EXISTS users (
             id INTEGER PRIMARY KEY,
             email TEXT NOT NULL UNIQUE,
             dept TEXT NOT NULL
         );
         DELETE FROM users;",
        &[],
    )
}

fn count_users(conn: &mut Connection<SqliteDriver>) -> Result<i64, SqlTxnError> {
    let value = conn
        .select("SELECT COUNT(*) AS cnt FROM users", &[])?
        .get_value(Some("cnt"))?;
    value
        .and_then(|v| v.as_int().copied())
        .ok_or_else(|| SqlTxnError::MissingColumn("cnt".into()))
}

#[test]
fn insert_update_select_round_trip() -> Result<(), SqlTxnError> {
    let mut conn = SqliteDriver::builder(unique_db_path("crud")).connect()?;
    setup(&mut conn)?;

    let id = conn.insert(
        "INSERT INTO users (email, dept) VALUES ({:s}, {:s})",
        &["o'neil@example.com".into(), "eng".into()],
    )?;
    assert_eq!(id, 1);
    conn.insert(
        "INSERT INTO users (email, dept) VALUES ({}, {})",
        &["bob@example.com".into(), "ops".into()],
    )?;

    let changed = conn.update("UPDATE users SET dept = {} WHERE id >= {:i}", &["eng".into(), RowValues::Int(1)])?;
    assert_eq!(changed, 2);

    let emails = conn
        .select("SELECT email FROM users ORDER BY id", &[])?
        .as_column(None)?;
    assert_eq!(
        emails,
        vec![
            RowValues::Text("o'neil@example.com".into()),
            RowValues::Text("bob@example.com".into()),
        ]
    );

    let by_dept = conn
        .select("SELECT dept, id, email FROM users ORDER BY id", &[])?
        .as_map(&["dept", "id"])?;
    let eng = by_dept[&RowKey::from("eng")].as_nested().expect("nested");
    assert_eq!(eng.len(), 2);
    conn.close()
}

#[test]
fn backslash_in_literal_does_not_hide_placeholders() -> Result<(), SqlTxnError> {
    let mut conn = SqliteDriver::builder(":memory:".into()).wal(false).connect()?;
    let rows = conn
        .select(r"select 'C:\' as p, {:i} as id", &[RowValues::Int(5)])?
        .as_records_values()?;
    assert_eq!(
        rows,
        vec![vec![RowValues::Text(r"C:\".into()), RowValues::Int(5)]]
    );

    let echoed = conn
        .select("select {:s} as p", &[r"C:\".into()])?
        .get_value(Some("p"))?;
    assert_eq!(echoed, Some(RowValues::Text(r"C:\".into())));
    Ok(())
}

#[test]
fn bound_timestamps_read_back_from_text() -> Result<(), SqlTxnError> {
    let mut conn = SqliteDriver::builder(":memory:".into()).wal(false).connect()?;
    let ts = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .and_then(|d| d.and_hms_milli_opt(3, 4, 5, 250))
        .expect("valid timestamp");
    let value = conn
        .select("select {:t} as at", &[RowValues::Timestamp(ts)])?
        .get_value(Some("at"))?
        .expect("one row");
    assert!(value.as_text().is_some());
    assert_eq!(value.as_timestamp(), Some(ts));
    Ok(())
}

#[test]
fn ddl_is_refused_inside_transaction_only() -> Result<(), SqlTxnError> {
    let mut conn = SqliteDriver::builder(unique_db_path("ddl")).connect()?;
    setup(&mut conn)?;

    conn.begin()?;
    let err = conn.multi_update("  create table other (id integer)", &[]);
    assert!(matches!(err, Err(SqlTxnError::DdlInTransaction)));
    assert!(conn.in_transaction());
    conn.rollback()?;

    conn.multi_update("create table other (id integer)", &[])?;
    conn.multi_update("drop table other", &[])?;
    Ok(())
}

#[test]
fn unique_violation_carries_sqlite_code() -> Result<(), SqlTxnError> {
    let mut conn = SqliteDriver::builder(unique_db_path("unique")).connect()?;
    setup(&mut conn)?;
    conn.insert(
        "INSERT INTO users (email, dept) VALUES ({}, 'eng')",
        &["dup@example.com".into()],
    )?;
    let err = conn
        .insert(
            "INSERT INTO users (email, dept) VALUES ({}, 'eng')",
            &["dup@example.com".into()],
        )
        .expect_err("unique violation");
    // SQLITE_CONSTRAINT_UNIQUE; the message is not in the duplicate-entry format
    assert_eq!(err.code(), Some(2067));
    assert!(!err.is_duplicate_entry());
    Ok(())
}

#[test]
fn rollback_discards_and_commit_persists() -> Result<(), SqlTxnError> {
    let path = unique_db_path("txn");
    let mut conn = SqliteDriver::builder(path.clone()).connect()?;
    setup(&mut conn)?;

    conn.begin()?;
    conn.insert("INSERT INTO users (email, dept) VALUES ('a@x', 'eng')", &[])?;
    conn.rollback()?;
    assert_eq!(count_users(&mut conn)?, 0);

    conn.begin()?;
    conn.insert("INSERT INTO users (email, dept) VALUES ('b@x', 'eng')", &[])?;
    conn.commit()?;
    conn.close()?;

    let mut reopened = SqliteDriver::builder(path).connect()?;
    assert_eq!(count_users(&mut reopened)?, 1);
    Ok(())
}

#[test]
fn dropping_connection_mid_transaction_rolls_back() -> Result<(), SqlTxnError> {
    let path = unique_db_path("bad_drop");
    {
        let mut conn = SqliteDriver::builder(path.clone()).connect()?;
        setup(&mut conn)?;
        conn.begin()?;
        conn.insert("INSERT INTO users (email, dept) VALUES ('lost@x', 'eng')", &[])?;
    }
    let mut conn = SqliteDriver::builder(path).connect()?;
    assert_eq!(count_users(&mut conn)?, 0);
    Ok(())
}

#[test]
fn json_view_serializes_rows_in_column_order() -> Result<(), SqlTxnError> {
    let mut conn = open_sqlite_connection(&SqliteOptions::in_memory(), ConnectionOptions::default())?;
    let json = conn
        .select("SELECT 1 AS id, 'ann' AS name, NULL AS note", &[])?
        .into_json()?;
    assert_eq!(
        serde_json::to_string(&json)?,
        r#"[{"id":1,"name":"ann","note":null}]"#
    );
    Ok(())
}
