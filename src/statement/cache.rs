use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::ParseError;

use super::{Statement, TemplateParser};

/// Bounded map from raw statement text to its parsed template.
///
/// Eviction is by insertion order: once full, the entry inserted earliest is dropped,
/// regardless of how recently it was hit.
#[derive(Debug)]
pub struct StatementCache {
    capacity: usize,
    entries: IndexMap<String, Statement>,
}

impl StatementCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: IndexMap::with_capacity(capacity.max(1)),
        }
    }

    /// Return the cached template for `sql`, parsing and inserting it on a miss.
    ///
    /// A miss on a full cache evicts before parsing, so a failed parse still frees a slot.
    ///
    /// # Errors
    /// Returns the parser's `ParseError` unchanged; nothing is cached in that case.
    pub fn get_or_parse(
        &mut self,
        sql: &str,
        parser: &dyn TemplateParser,
    ) -> Result<Statement, ParseError> {
        if let Some(hit) = self.entries.get(sql) {
            return Ok(hit.clone());
        }

        if self.entries.len() >= self.capacity
            && let Some((evicted, _)) = self.entries.shift_remove_index(0)
        {
            debug!(capacity = self.capacity, evicted = %evicted, "statement cache evicted oldest template");
        }
        let template = parser.parse(sql)?;
        let statement = Statement::Template(Arc::new(template));
        self.entries.insert(sql.to_string(), statement.clone());
        Ok(statement)
    }

    #[must_use]
    pub fn contains(&self, sql: &str) -> bool {
        self.entries.contains_key(sql)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
