use std::sync::Arc;

use super::*;
use crate::error::DriverError;
use crate::test_utils::cursor_from;

fn cursor(columns: &[&str], rows: Vec<Vec<RowValues>>) -> Box<dyn RowCursor> {
    Box::new(cursor_from(columns, rows))
}

fn people() -> ResultIterator<'static> {
    ResultIterator::new(cursor(
        &["id", "name"],
        vec![
            vec![RowValues::Int(1), "a".into()],
            vec![RowValues::Int(2), "b".into()],
            vec![RowValues::Int(1), "c".into()],
        ],
    ))
}

fn text(s: &str) -> RowValues {
    RowValues::Text(s.to_string())
}

#[test]
fn as_map_single_key_is_last_write_wins() {
    let map = people().as_map(&["id"]).expect("map");
    assert_eq!(map.len(), 2);
    let one = map[&RowKey::Int(1)].as_record().expect("record");
    assert_eq!(one.get("name"), Some(&text("c")));
    let two = map[&RowKey::Int(2)].as_record().expect("record");
    assert_eq!(two.get("name"), Some(&text("b")));
    // first insertion fixes the position of key 1
    assert_eq!(map.keys().collect::<Vec<_>>(), vec![&RowKey::Int(1), &RowKey::Int(2)]);
}

#[test]
fn as_map_without_fields_infers_first_column() {
    let map = people().as_map(&[]).expect("map");
    assert_eq!(map.len(), 2);
    assert!(map.contains_key(&RowKey::Int(2)));
}

#[test]
fn as_map_nests_on_multiple_fields() {
    let mut rows = ResultIterator::new(cursor(
        &["dept", "team", "id"],
        vec![
            vec![text("eng"), text("core"), RowValues::Int(1)],
            vec![text("eng"), text("web"), RowValues::Int(2)],
            vec![text("ops"), text("core"), RowValues::Int(3)],
            vec![text("eng"), text("core"), RowValues::Int(4)],
        ],
    ));
    let map = rows.as_map(&["dept", "team", "id"]).expect("map");
    let eng = map[&RowKey::from("eng")].as_nested().expect("nested");
    let core = eng[&RowKey::from("core")].as_nested().expect("nested");
    assert_eq!(core.len(), 2);
    assert!(core[&RowKey::Int(4)].as_record().is_some());
    let ops = map[&RowKey::from("ops")].as_nested().expect("nested");
    assert_eq!(ops[&RowKey::from("core")].as_nested().map(IndexMap::len), Some(1));
}

#[test]
fn as_map_missing_key_field_fails() {
    let err = people().as_map(&["nope"]).expect_err("missing column");
    assert!(matches!(err, SqlTxnError::MissingColumn(ref c) if c == "nope"));
}

#[test]
fn as_column_preserves_order() {
    let col = people().as_column(Some("name")).expect("column");
    assert_eq!(col, vec![text("a"), text("b"), text("c")]);
    let ids = people().as_column(None).expect("column");
    assert_eq!(ids, vec![RowValues::Int(1), RowValues::Int(2), RowValues::Int(1)]);
}

#[test]
fn as_key_value_infers_both_fields() {
    let kv = people().as_key_value(None, None).expect("kv");
    assert_eq!(kv.len(), 2);
    assert_eq!(kv[&RowKey::Int(1)], text("c"));
    assert_eq!(kv[&RowKey::Int(2)], text("b"));

    let by_name = people().as_key_value(Some("name"), Some("id")).expect("kv");
    assert_eq!(by_name[&RowKey::from("a")], RowValues::Int(1));
}

#[test]
fn as_key_value_needs_two_columns_to_infer() {
    let mut rows = ResultIterator::new(cursor(&["id"], vec![vec![RowValues::Int(1)]]));
    assert!(matches!(
        rows.as_key_value(None, None),
        Err(SqlTxnError::MissingColumn(_))
    ));
}

#[test]
fn second_aggregation_is_empty() {
    let mut rows = people();
    assert_eq!(rows.as_records().expect("records").len(), 3);
    assert!(rows.is_exhausted());
    assert!(rows.as_column(None).expect("column").is_empty());
    assert!(rows.as_map(&["id"]).expect("map").is_empty());
    assert!(rows.get_record().expect("record").is_none());
}

#[test]
fn column_less_rows_are_drained_by_inferring_views() {
    let mut rows = ResultIterator::new(cursor(&[], vec![Vec::new(), Vec::new()]));
    assert!(rows.as_map_by(None).expect("map").is_empty());
    assert!(rows.is_exhausted());

    let mut rows = ResultIterator::new(cursor(&[], vec![Vec::new(), Vec::new()]));
    assert!(rows.as_column(None).expect("column").is_empty());
    assert!(rows.is_exhausted());

    let mut rows = ResultIterator::new(cursor(&[], vec![Vec::new()]));
    assert!(rows.as_map(&[]).expect("map").is_empty());
    assert!(rows.is_exhausted());
}

#[test]
fn get_record_and_value_do_not_advance() {
    let mut rows = people();
    assert_eq!(rows.get_value(None).expect("value"), Some(RowValues::Int(1)));
    assert_eq!(rows.get_value(Some("name")).expect("value"), Some(text("a")));
    assert_eq!(rows.get_value(Some("missing")).expect("value"), None);
    assert_eq!(rows.as_records().expect("records").len(), 3);
}

#[test]
fn get_value_on_empty_result_is_none() {
    let mut rows = ResultIterator::new(cursor(&["id"], Vec::new()));
    assert_eq!(rows.get_value(None).expect("value"), None);
    let mut nothing = ResultIterator::empty();
    assert!(nothing.as_records().expect("records").is_empty());
}

#[test]
fn walk_stops_on_false_and_keeps_that_record_current() {
    let mut rows = people();
    let mut seen = Vec::new();
    rows.walk(|rec| {
        seen.push(rec.get("name").cloned());
        seen.len() < 2
    })
    .expect("walk");
    assert_eq!(seen, vec![Some(text("a")), Some(text("b"))]);
    assert_eq!(rows.get_value(Some("name")).expect("value"), Some(text("b")));
}

#[test]
fn walk_with_unit_callback_visits_everything() {
    let mut rows = people();
    let mut count = 0;
    rows.walk(|_| count += 1).expect("walk");
    assert_eq!(count, 3);
    assert!(rows.is_exhausted());
}

#[test]
fn walk_with_control_flow_breaks() {
    let mut rows = people();
    let mut count = 0;
    rows.walk(|_| {
        count += 1;
        ControlFlow::<()>::Break(())
    })
    .expect("walk");
    assert_eq!(count, 1);
}

#[test]
fn records_values_drop_column_names() {
    let values = people().as_records_values().expect("values");
    assert_eq!(values[1], vec![RowValues::Int(2), text("b")]);
}

#[test]
fn json_view_is_the_record_list() {
    let json = people().into_json().expect("json");
    assert_eq!(
        json,
        serde_json::json!([
            {"id": 1, "name": "a"},
            {"id": 2, "name": "b"},
            {"id": 1, "name": "c"},
        ])
    );
}

struct FailingCursor {
    columns: Arc<Vec<String>>,
    served: bool,
}

impl RowCursor for FailingCursor {
    fn columns(&self) -> &Arc<Vec<String>> {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<Vec<RowValues>>, DriverError> {
        if self.served {
            return Err(DriverError::new("Lost connection to server during query", 2013));
        }
        self.served = true;
        Ok(Some(vec![RowValues::Int(1)]))
    }
}

#[test]
fn fetch_errors_are_classified_and_end_iteration() {
    let rows = ResultIterator::new(Box::new(FailingCursor {
        columns: Arc::new(vec!["id".into()]),
        served: false,
    }));
    let collected: Vec<_> = rows.collect();
    assert_eq!(collected.len(), 2);
    assert!(collected[0].is_ok());
    assert!(matches!(
        collected[1],
        Err(SqlTxnError::Database { code: 2013, .. })
    ));
}
