//! Lazy, single-pass views over the rows of a statement.
//!
//! A [`ResultIterator`] pulls one row from its cursor at a time. Every aggregation
//! (`as_records`, `as_map`, `as_column`, ...) drains whatever is left, so a second
//! aggregation on the same iterator sees nothing and returns an empty result.

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use tracing::trace;

use crate::driver::RowCursor;
use crate::error::SqlTxnError;
use crate::types::{RowKey, RowValues};

mod row;

pub use row::Record;
use row::index_columns;

/// Nested keyed view produced by [`ResultIterator::as_map`].
pub type RecordMap = IndexMap<RowKey, MapEntry>;

/// A slot in a [`RecordMap`]: either a record or the next nesting level.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEntry {
    Record(Record),
    Nested(RecordMap),
}

impl MapEntry {
    #[must_use]
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            MapEntry::Record(rec) => Some(rec),
            MapEntry::Nested(_) => None,
        }
    }

    #[must_use]
    pub fn as_nested(&self) -> Option<&RecordMap> {
        match self {
            MapEntry::Nested(map) => Some(map),
            MapEntry::Record(_) => None,
        }
    }

    fn nested_mut(&mut self) -> &mut RecordMap {
        if let MapEntry::Record(_) = self {
            *self = MapEntry::Nested(RecordMap::new());
        }
        match self {
            MapEntry::Nested(map) => map,
            MapEntry::Record(_) => unreachable!("entry was just replaced by a nested map"),
        }
    }
}

/// What a [`ResultIterator::walk`] callback returns to keep going or stop.
pub trait WalkControl {
    fn should_stop(&self) -> bool;
}

impl WalkControl for () {
    fn should_stop(&self) -> bool {
        false
    }
}

/// `false` stops the walk.
impl WalkControl for bool {
    fn should_stop(&self) -> bool {
        !*self
    }
}

impl<B, C> WalkControl for ControlFlow<B, C> {
    fn should_stop(&self) -> bool {
        self.is_break()
    }
}

/// Forward-only, non-restartable sequence of [`Record`]s backed by a driver cursor.
///
/// The cursor is released as soon as it reports exhaustion.
pub struct ResultIterator<'c> {
    cursor: Option<Box<dyn RowCursor + 'c>>,
    columns: Arc<Vec<String>>,
    column_index: Arc<HashMap<String, usize>>,
    current: Option<Record>,
    needs_fetch: bool,
}

impl<'c> ResultIterator<'c> {
    #[must_use]
    pub fn new(cursor: Box<dyn RowCursor + 'c>) -> Self {
        let columns = Arc::clone(cursor.columns());
        let column_index = Arc::new(index_columns(&columns));
        Self {
            cursor: Some(cursor),
            columns,
            column_index,
            current: None,
            needs_fetch: true,
        }
    }

    /// An iterator with no rows, for statements that produced no result set.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            cursor: None,
            columns: Arc::new(Vec::new()),
            column_index: Arc::new(HashMap::new()),
            current: None,
            needs_fetch: false,
        }
    }

    #[must_use]
    pub fn columns(&self) -> &Arc<Vec<String>> {
        &self.columns
    }

    /// True once the cursor has been drained and released.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.cursor.is_none() && self.current.is_none() && !self.needs_fetch
    }

    fn fetch(&mut self) -> Result<Option<Record>, SqlTxnError> {
        let Some(cursor) = self.cursor.as_mut() else {
            return Ok(None);
        };
        match cursor.next_row()? {
            Some(values) => Ok(Some(Record::with_index(
                Arc::clone(&self.columns),
                values,
                Arc::clone(&self.column_index),
            ))),
            None => {
                self.cursor = None;
                trace!("result cursor exhausted and released");
                Ok(None)
            }
        }
    }

    fn settle(&mut self) -> Result<(), SqlTxnError> {
        if self.needs_fetch {
            self.needs_fetch = false;
            self.current = self.fetch()?;
        }
        Ok(())
    }

    fn next_record(&mut self) -> Result<Option<Record>, SqlTxnError> {
        self.settle()?;
        let record = self.current.take();
        if record.is_some() {
            self.needs_fetch = true;
        }
        Ok(record)
    }

    /// The current record, without advancing.
    ///
    /// # Errors
    /// Returns a classified driver error if fetching the row fails.
    pub fn get_record(&mut self) -> Result<Option<&Record>, SqlTxnError> {
        self.settle()?;
        Ok(self.current.as_ref())
    }

    /// A value from the current record: the named field, or the first field.
    ///
    /// Returns `None` when there is no current record, when it has no columns, or when the
    /// named field is absent.
    ///
    /// # Errors
    /// Returns a classified driver error if fetching the row fails.
    pub fn get_value(&mut self, field: Option<&str>) -> Result<Option<RowValues>, SqlTxnError> {
        let Some(record) = self.get_record()? else {
            return Ok(None);
        };
        if record.is_empty() {
            return Ok(None);
        }
        let value = match field {
            Some(name) => record.get(name),
            None => record.get_by_index(0),
        };
        Ok(value.cloned())
    }

    /// Drain the remaining rows into a list.
    ///
    /// # Errors
    /// Returns a classified driver error if fetching a row fails.
    pub fn as_records(&mut self) -> Result<Vec<Record>, SqlTxnError> {
        let mut out = Vec::new();
        while let Some(record) = self.next_record()? {
            out.push(record);
        }
        Ok(out)
    }

    /// Like [`as_records`](Self::as_records) but keeps only the values, in column order.
    ///
    /// # Errors
    /// Returns a classified driver error if fetching a row fails.
    pub fn as_records_values(&mut self) -> Result<Vec<Vec<RowValues>>, SqlTxnError> {
        let mut out = Vec::new();
        while let Some(record) = self.next_record()? {
            out.push(record.into_values());
        }
        Ok(out)
    }

    /// Call `callback` for each remaining record until it asks to stop.
    ///
    /// When the callback stops the walk, the record it stopped on stays current.
    ///
    /// ```rust
    /// # use sql_txn_middleware::prelude::*;
    /// # use std::sync::Arc;
    /// let cursor = BufferedCursor::new(
    ///     Arc::new(vec!["id".to_string()]),
    ///     (1..=5).map(|i| vec![RowValues::Int(i)]),
    /// );
    /// let mut rows = ResultIterator::new(Box::new(cursor));
    /// let mut seen = Vec::new();
    /// rows.walk(|rec| {
    ///     seen.push(rec.get("id").cloned());
    ///     seen.len() < 2
    /// })?;
    /// assert_eq!(seen.len(), 2);
    /// # Ok::<(), SqlTxnError>(())
    /// ```
    ///
    /// # Errors
    /// Returns a classified driver error if fetching a row fails.
    pub fn walk<F, R>(&mut self, mut callback: F) -> Result<(), SqlTxnError>
    where
        F: FnMut(&Record) -> R,
        R: WalkControl,
    {
        loop {
            self.settle()?;
            let Some(record) = self.current.as_ref() else {
                return Ok(());
            };
            if callback(record).should_stop() {
                return Ok(());
            }
            self.needs_fetch = true;
        }
    }

    /// Discard the remaining records so the cursor is released.
    fn drain(&mut self) -> Result<(), SqlTxnError> {
        while self.next_record()?.is_some() {}
        Ok(())
    }

    /// Name of the column at `position` in the next record, if there is a next record.
    fn infer_column(&mut self, position: usize) -> Result<Option<Option<String>>, SqlTxnError> {
        Ok(self
            .get_record()?
            .map(|record| record.column_names.get(position).cloned()))
    }

    /// Key the remaining records by one or more fields.
    ///
    /// - no fields: the first column of the next record is the key;
    /// - one field: a flat map, later duplicates overwrite earlier ones;
    /// - several fields: all but the last form nesting levels, the last keys the record.
    ///
    /// # Errors
    /// Returns `SqlTxnError::MissingColumn` if a record lacks a key field, or a classified
    /// driver error if fetching a row fails.
    pub fn as_map(&mut self, key_fields: &[&str]) -> Result<RecordMap, SqlTxnError> {
        let mut out = RecordMap::new();
        let Some((last, prefix)) = key_fields.split_last() else {
            return Ok(self
                .as_map_by(None)?
                .into_iter()
                .map(|(key, record)| (key, MapEntry::Record(record)))
                .collect());
        };

        while let Some(record) = self.next_record()? {
            let mut target = &mut out;
            for field in prefix {
                let key = key_of(&record, field)?;
                target = target
                    .entry(key)
                    .or_insert_with(|| MapEntry::Nested(RecordMap::new()))
                    .nested_mut();
            }
            let key = key_of(&record, last)?;
            target.insert(key, MapEntry::Record(record));
        }
        Ok(out)
    }

    /// Flat map of the remaining records keyed by `field` (or the first column).
    ///
    /// # Errors
    /// Returns `SqlTxnError::MissingColumn` if a record lacks the key field, or a classified
    /// driver error if fetching a row fails.
    pub fn as_map_by(
        &mut self,
        field: Option<&str>,
    ) -> Result<IndexMap<RowKey, Record>, SqlTxnError> {
        let mut out = IndexMap::new();
        let field = match field {
            Some(name) => name.to_string(),
            None => match self.infer_column(0)? {
                Some(Some(name)) => name,
                _ => {
                    self.drain()?;
                    return Ok(out);
                }
            },
        };
        while let Some(record) = self.next_record()? {
            out.insert(key_of(&record, &field)?, record);
        }
        Ok(out)
    }

    /// Flat `key → value` map over the remaining records.
    ///
    /// Omitted field names are taken from the first and second columns of the next record.
    ///
    /// # Errors
    /// Returns `SqlTxnError::MissingColumn` if a field cannot be inferred or is absent from a
    /// record, or a classified driver error if fetching a row fails.
    pub fn as_key_value(
        &mut self,
        key_field: Option<&str>,
        value_field: Option<&str>,
    ) -> Result<IndexMap<RowKey, RowValues>, SqlTxnError> {
        let mut out = IndexMap::new();
        let Some(first) = self.get_record()? else {
            return Ok(out);
        };
        let key_field = match key_field {
            Some(name) => name.to_string(),
            None => first
                .column_names
                .first()
                .cloned()
                .ok_or_else(|| SqlTxnError::MissingColumn("<first column>".into()))?,
        };
        let value_field = match value_field {
            Some(name) => name.to_string(),
            None => first
                .column_names
                .get(1)
                .cloned()
                .ok_or_else(|| SqlTxnError::MissingColumn("<second column>".into()))?,
        };

        while let Some(record) = self.next_record()? {
            let key = key_of(&record, &key_field)?;
            let value = value_of(&record, &value_field)?.clone();
            out.insert(key, value);
        }
        Ok(out)
    }

    /// One column of the remaining records, in cursor order.
    ///
    /// # Errors
    /// Returns `SqlTxnError::MissingColumn` if a record lacks the field, or a classified
    /// driver error if fetching a row fails.
    pub fn as_column(&mut self, value_field: Option<&str>) -> Result<Vec<RowValues>, SqlTxnError> {
        let mut out = Vec::new();
        let field = match value_field {
            Some(name) => name.to_string(),
            None => match self.infer_column(0)? {
                Some(Some(name)) => name,
                _ => {
                    self.drain()?;
                    return Ok(out);
                }
            },
        };
        while let Some(mut record) = self.next_record()? {
            let idx = record
                .get_column_index(&field)
                .filter(|idx| *idx < record.values.len())
                .ok_or_else(|| SqlTxnError::MissingColumn(field.clone()))?;
            out.push(record.values.swap_remove(idx));
        }
        Ok(out)
    }

    /// The remaining records as a JSON array of objects.
    ///
    /// # Errors
    /// Returns a classified driver error if fetching a row fails, or
    /// `SqlTxnError::Serialization` if a value cannot be represented as JSON.
    pub fn into_json(mut self) -> Result<JsonValue, SqlTxnError> {
        let records = self.as_records()?;
        Ok(serde_json::to_value(records)?)
    }
}

fn value_of<'r>(record: &'r Record, field: &str) -> Result<&'r RowValues, SqlTxnError> {
    record
        .get(field)
        .ok_or_else(|| SqlTxnError::MissingColumn(field.to_string()))
}

fn key_of(record: &Record, field: &str) -> Result<RowKey, SqlTxnError> {
    value_of(record, field).map(RowKey::from)
}

impl Iterator for ResultIterator<'_> {
    type Item = Result<Record, SqlTxnError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(err) => {
                self.cursor = None;
                self.current = None;
                self.needs_fetch = false;
                Some(Err(err))
            }
        }
    }
}

impl std::fmt::Debug for ResultIterator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultIterator")
            .field("columns", &self.columns)
            .field("current", &self.current)
            .field("cursor_open", &self.cursor.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests;
