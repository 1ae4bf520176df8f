//! Per-connection instance registries
//!
//! A [`TableManager`] hands out exactly one instance per connection context.
//! [`StoreContext`] bundles the managers an application needs so they can be
//! created at startup and dropped at shutdown instead of living in statics.

use crate::connection::{acquire_lock, ConnectionKey, DatabaseConnection};
use crate::log_table::LogTable;
use crate::sql::Sql;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Registry of one `T` per connection context
pub struct TableManager<T> {
    name: String,
    tables: Mutex<HashMap<ConnectionKey, Arc<T>>>,
}

impl<T> std::fmt::Debug for TableManager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableManager")
            .field("name", &self.name)
            .field("len", &self.len())
            .finish()
    }
}

impl<T> TableManager<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Mutex::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Instance for `dbcon`, constructing it with `ctor` on first use
    ///
    /// Lookup and insert happen under one lock, so concurrent callers with
    /// the same key always get the same instance.
    pub fn singleton<F>(&self, dbcon: &Arc<DatabaseConnection>, ctor: F) -> Arc<T>
    where
        F: FnOnce(Arc<DatabaseConnection>) -> T,
    {
        let mut tables = acquire_lock(&self.tables);
        tables
            .entry(dbcon.key().clone())
            .or_insert_with(|| {
                tracing::debug!(manager = %self.name, connection = %dbcon.key(), "new instance");
                Arc::new(ctor(Arc::clone(dbcon)))
            })
            .clone()
    }

    pub fn get(&self, key: &ConnectionKey) -> Option<Arc<T>> {
        acquire_lock(&self.tables).get(key).cloned()
    }

    pub fn has(&self, key: &ConnectionKey) -> bool {
        acquire_lock(&self.tables).contains_key(key)
    }

    pub fn remove(&self, key: &ConnectionKey) -> Option<Arc<T>> {
        acquire_lock(&self.tables).remove(key)
    }

    pub fn clear(&self) {
        acquire_lock(&self.tables).clear();
    }

    pub fn len(&self) -> usize {
        acquire_lock(&self.tables).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Explicit registry context owning the log-table and SQL-helper managers
#[derive(Debug)]
pub struct StoreContext {
    log_tables: TableManager<LogTable>,
    sql: TableManager<Sql>,
}

impl Default for StoreContext {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreContext {
    pub fn new() -> Self {
        Self {
            log_tables: TableManager::new("LOG"),
            sql: TableManager::new("SQL"),
        }
    }

    /// The log table bound to `dbcon`
    pub fn log_table(&self, dbcon: &Arc<DatabaseConnection>) -> Arc<LogTable> {
        self.log_tables.singleton(dbcon, LogTable::new)
    }

    /// The SQL helper bound to `dbcon`
    pub fn sql(&self, dbcon: &Arc<DatabaseConnection>) -> Arc<Sql> {
        self.sql.singleton(dbcon, Sql::new)
    }

    pub fn log_tables(&self) -> &TableManager<LogTable> {
        &self.log_tables
    }

    pub fn sql_helpers(&self) -> &TableManager<Sql> {
        &self.sql
    }

    /// Forget every instance bound to `key`
    pub fn release(&self, key: &ConnectionKey) {
        self.log_tables.remove(key);
        self.sql.remove(key);
    }
}
