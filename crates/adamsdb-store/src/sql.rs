//! Generic SQL helper bound to one connection context
//!
//! Convenience queries that are not tied to the log table: table and
//! column introspection, single-column selects and housekeeping.

use crate::connection::DatabaseConnection;
use crate::errors::{from_rusqlite, Result};
use crate::registry::TableManager;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OptionalExtension};
use std::sync::{Arc, OnceLock};

static SQL_MANAGER: OnceLock<TableManager<Sql>> = OnceLock::new();

/// Assemble a SELECT the way the helper methods do
///
/// `where_clause` gets a `WHERE` keyword unless it is empty or already
/// starts with `LIMIT ` or `ORDER ` (case-insensitive).
pub fn build_select(
    distinct: bool,
    columns: &str,
    tables: Option<&str>,
    where_clause: Option<&str>,
) -> String {
    let mut query = String::from("SELECT ");
    if distinct {
        query.push_str("DISTINCT ");
    }
    query.push_str(columns);

    if let Some(tables) = tables {
        query.push_str(" FROM ");
        query.push_str(tables);
    }

    if let Some(clause) = where_clause.map(str::trim).filter(|c| !c.is_empty()) {
        let upper = clause.to_ascii_uppercase();
        if !upper.starts_with("LIMIT ") && !upper.starts_with("ORDER ") {
            query.push_str(" WHERE");
        }
        query.push(' ');
        query.push_str(clause);
    }

    query
}

/// True when `table` exists on this connection
pub fn table_exists_on(conn: &Connection, table: &str) -> Result<bool> {
    conn.query_row(
        "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [table],
        |_| Ok(()),
    )
    .optional()
    .map(|found| found.is_some())
    .map_err(from_rusqlite)
}

/// Render any SQLite value as text; NULL becomes "" and BLOBs become hex
pub fn value_to_string(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(n) => n.to_string(),
        ValueRef::Real(x) => x.to_string(),
        ValueRef::Text(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        ValueRef::Blob(bytes) => hex::encode(bytes),
    }
}

/// Generic SQL helper
#[derive(Debug)]
pub struct Sql {
    dbcon: Arc<DatabaseConnection>,
}

impl Sql {
    pub fn new(dbcon: Arc<DatabaseConnection>) -> Self {
        Self { dbcon }
    }

    /// Process-wide helper for this connection context
    pub fn singleton(dbcon: &Arc<DatabaseConnection>) -> Arc<Sql> {
        SQL_MANAGER
            .get_or_init(|| TableManager::new("SQL"))
            .singleton(dbcon, Sql::new)
    }

    pub fn database_connection(&self) -> &Arc<DatabaseConnection> {
        &self.dbcon
    }

    pub fn table_exists(&self, table: &str) -> Result<bool> {
        self.dbcon
            .with_connection(true, |conn| table_exists_on(conn, table))
    }

    pub fn column_exists(&self, table: &str, column: &str) -> Result<bool> {
        self.dbcon.with_connection(true, |conn| {
            let mut stmt = conn
                .prepare("SELECT name FROM pragma_table_info(?1)")
                .map_err(from_rusqlite)?;
            let names = stmt
                .query_map([table], |row| row.get::<_, String>(0))
                .map_err(from_rusqlite)?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(from_rusqlite)?;
            Ok(names.iter().any(|name| name.eq_ignore_ascii_case(column)))
        })
    }

    /// All user tables, sorted by name
    pub fn table_names(&self) -> Result<Vec<String>> {
        self.select_string(
            false,
            "name",
            "sqlite_master",
            "type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
    }

    /// Execute one or more statements, ignoring any rows they return
    pub fn execute(&self, sql: &str) -> Result<()> {
        tracing::debug!(sql, "execute");
        self.dbcon
            .with_connection(true, |conn| conn.execute_batch(sql).map_err(from_rusqlite))
    }

    /// `UPDATE <table> SET <set> WHERE <where>`; returns the affected row count
    pub fn update(&self, set: &str, table: &str, where_clause: &str) -> Result<usize> {
        let sql = format!("UPDATE {} SET {} WHERE {}", table, set, where_clause);
        tracing::debug!(sql = %sql, "update");
        self.dbcon
            .with_connection(true, |conn| conn.execute(&sql, []).map_err(from_rusqlite))
    }

    /// Remove all rows (SQLite has no TRUNCATE)
    pub fn truncate(&self, table: &str) -> Result<()> {
        self.execute(&format!("DELETE FROM {}", table))
    }

    pub fn drop(&self, table: &str) -> Result<()> {
        self.execute(&format!("DROP TABLE {}", table))
    }

    /// First column of every row as text
    pub fn select_string(
        &self,
        distinct: bool,
        column: &str,
        tables: &str,
        where_clause: &str,
    ) -> Result<Vec<String>> {
        let rows = self.select_strings(distinct, &[column], tables, where_clause)?;
        Ok(rows.into_iter().filter_map(|row| row.into_iter().next()).collect())
    }

    /// The given columns of every row as text
    pub fn select_strings(
        &self,
        distinct: bool,
        columns: &[&str],
        tables: &str,
        where_clause: &str,
    ) -> Result<Vec<Vec<String>>> {
        let query = build_select(distinct, &columns.join(", "), Some(tables), Some(where_clause));
        tracing::debug!(sql = %query, "select");
        self.dbcon.with_connection(true, |conn| {
            let mut stmt = conn.prepare(&query).map_err(from_rusqlite)?;
            let width = stmt.column_count();
            let rows = stmt
                .query_map([], |row| {
                    (0..width)
                        .map(|i| row.get_ref(i).map(value_to_string))
                        .collect::<rusqlite::Result<Vec<_>>>()
                })
                .map_err(from_rusqlite)?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(from_rusqlite)?;
            Ok(rows)
        })
    }

    pub fn select_int(
        &self,
        distinct: bool,
        column: &str,
        tables: &str,
        where_clause: &str,
    ) -> Result<Vec<i32>> {
        self.select_column(distinct, column, tables, where_clause)
    }

    pub fn select_long(
        &self,
        distinct: bool,
        column: &str,
        tables: &str,
        where_clause: &str,
    ) -> Result<Vec<i64>> {
        self.select_column(distinct, column, tables, where_clause)
    }

    pub fn select_double(
        &self,
        distinct: bool,
        column: &str,
        tables: &str,
        where_clause: &str,
    ) -> Result<Vec<f64>> {
        self.select_column(distinct, column, tables, where_clause)
    }

    fn select_column<T: rusqlite::types::FromSql>(
        &self,
        distinct: bool,
        column: &str,
        tables: &str,
        where_clause: &str,
    ) -> Result<Vec<T>> {
        let query = build_select(distinct, column, Some(tables), Some(where_clause));
        tracing::debug!(sql = %query, "select");
        self.dbcon.with_connection(true, |conn| {
            let mut stmt = conn.prepare(&query).map_err(from_rusqlite)?;
            let values = stmt
                .query_map([], |row| row.get::<_, T>(0))
                .map_err(from_rusqlite)?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(from_rusqlite)?;
            Ok(values)
        })
    }
}
