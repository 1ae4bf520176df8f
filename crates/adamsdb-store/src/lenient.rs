//! Log-and-default wrapper around [`LogTable`]
//!
//! For call sites that only want best-effort persistence: every failure is
//! logged at `warn` and replaced by `false`, `None`, `0` or an empty list.

use crate::connection::DatabaseConnection;
use crate::errors::Result;
use crate::log_table::LogTable;
use adamsdb_core::{LogQuery, LogRecord};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct LenientLogTable {
    inner: Arc<LogTable>,
}

impl LenientLogTable {
    pub fn new(inner: Arc<LogTable>) -> Self {
        Self { inner }
    }

    /// Wrap the process-wide table for `dbcon`
    pub fn for_connection(dbcon: &Arc<DatabaseConnection>) -> Self {
        Self::new(LogTable::singleton(dbcon))
    }

    pub fn inner(&self) -> &LogTable {
        &self.inner
    }

    pub fn load(&self, id: i64) -> Option<LogRecord> {
        or_default("load", self.inner.load(id))
    }

    pub fn load_matching(&self, query: &LogQuery) -> Vec<LogRecord> {
        or_default("load_matching", self.inner.load_matching(query))
    }

    pub fn exists(&self, record: &LogRecord) -> bool {
        or_default("exists", self.inner.exists(record))
    }

    pub fn add(&self, record: &mut LogRecord) -> bool {
        or_default("add", self.inner.add(record))
    }

    pub fn update(&self, record: &LogRecord) -> bool {
        or_default("update", self.inner.update(record))
    }

    pub fn remove(&self, record: &LogRecord) -> bool {
        or_default("remove", self.inner.remove(record))
    }

    pub fn count(&self) -> i64 {
        or_default("count", self.inner.count())
    }
}

fn or_default<T: Default>(op: &str, result: Result<T>) -> T {
    result.unwrap_or_else(|e| {
        tracing::warn!(op, err.code = e.code(), "{}", e);
        T::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_invalid_query_yields_empty() {
        let table = LenientLogTable::new(Arc::new(LogTable::new(
            DatabaseConnection::open_in_memory().unwrap(),
        )));
        assert!(table.load_matching(&LogQuery::new().status("[")).is_empty());
    }

    #[test]
    fn test_oversized_record_is_not_added() {
        let table = LenientLogTable::new(Arc::new(LogTable::new(
            DatabaseConnection::open_in_memory().unwrap(),
        )));
        let mut record = LogRecord::new("h", "x".repeat(51), "t", "s", "m", "src", Utc::now());
        assert!(!table.add(&mut record));
        assert!(!record.has_id());
        assert_eq!(table.count(), 0);
    }
}
