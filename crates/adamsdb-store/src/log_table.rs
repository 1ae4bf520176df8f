//! `LogTable` - persistence façade for the `LOG` table
//!
//! ## Logging Ownership
//!
//! Each public operation owns its lifecycle logging:
//! - `log_op_start!` at entry
//! - `log_op_end!` on success
//! - `log_op_error!` on failure
//!
//! SQL text is logged with `tracing::debug!()`.

#![allow(clippy::result_large_err)]

use crate::connection::DatabaseConnection;
use crate::errors::{from_rusqlite, Result};
use crate::migrations::ensure_log_table;
use crate::registry::TableManager;
use crate::row_mapper::{map_log_row, to_sql_values};
use crate::sql::table_exists_on;
use adamsdb_core::errors::ExError;
use adamsdb_core::statement::{
    delete_sql, exists_sql, insert_sql, insert_with_id_sql, select_by_id_sql, update_sql,
    LOG_TABLE,
};
use adamsdb_core::{log_op_end, log_op_error, log_op_start, LogQuery, LogRecord, SelectParts};
use chrono::SubsecRound;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, OptionalExtension};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

static LOG_TABLE_MANAGER: OnceLock<TableManager<LogTable>> = OnceLock::new();

/// Typed access to the `LOG` table of one connection context
///
/// A missing table is not an error for reads: `load` yields `None`,
/// `load_matching` an empty list and `exists`/`update`/`remove` `false`.
/// `add` creates the table on demand.
#[derive(Debug)]
pub struct LogTable {
    dbcon: Arc<DatabaseConnection>,
}

impl LogTable {
    pub fn new(dbcon: Arc<DatabaseConnection>) -> Self {
        Self { dbcon }
    }

    /// Process-wide table for this connection context
    pub fn singleton(dbcon: &Arc<DatabaseConnection>) -> Arc<LogTable> {
        LOG_TABLE_MANAGER
            .get_or_init(|| TableManager::new(LOG_TABLE))
            .singleton(dbcon, LogTable::new)
    }

    pub fn table_name(&self) -> &'static str {
        LOG_TABLE
    }

    pub fn database_connection(&self) -> &Arc<DatabaseConnection> {
        &self.dbcon
    }

    /// Load a record by primary key
    ///
    /// # Errors
    ///
    /// `Connection` or `Statement` from the database layer. `Mapping` when
    /// the table lacks one of the record columns or a stored value does not
    /// parse. An unknown id is `Ok(None)`.
    pub fn load(&self, id: i64) -> Result<Option<LogRecord>> {
        log_op_start!("log_load", record_id = id);
        let start = Instant::now();

        let result = self.dbcon.with_connection(true, |conn| {
            if !table_exists_on(conn, LOG_TABLE)? {
                return Ok(None);
            }
            conn.query_row(&select_by_id_sql(LOG_TABLE), [id], map_log_row)
                .optional()
                .map_err(from_rusqlite)
        });

        finish("log_load", start, result)
    }

    /// Load every record matching `query`
    ///
    /// Rows come back sorted by generation (newest first when
    /// `query.latest`); records with equal generation keep database order.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a bad pattern or inverted date range, otherwise
    /// whatever the database layer reports.
    pub fn load_matching(&self, query: &LogQuery) -> Result<Vec<LogRecord>> {
        log_op_start!("log_load_matching", latest = query.latest);
        let start = Instant::now();

        let result = self.load_matching_impl(query);
        let result = finish("log_load_matching", start, result);
        if let Ok(records) = &result {
            tracing::debug!(rows = records.len(), "log_load_matching rows");
        }
        result
    }

    fn load_matching_impl(&self, query: &LogQuery) -> Result<Vec<LogRecord>> {
        query.validate().map_err(ExError::from)?;

        let parts = SelectParts::from_query(query);
        let sql = parts.to_sql(LOG_TABLE);
        tracing::debug!(sql = %parts.render_literal(LOG_TABLE), "load_matching");
        let params = to_sql_values(parts.params());

        let mut records = self.dbcon.with_connection(true, |conn| {
            if !table_exists_on(conn, LOG_TABLE)? {
                return Ok(Vec::new());
            }
            let mut stmt = conn.prepare(&sql).map_err(from_rusqlite)?;
            let rows = stmt
                .query_map(params_from_iter(params), map_log_row)
                .map_err(from_rusqlite)?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(from_rusqlite)?;
            Ok(rows)
        })?;

        if query.latest {
            records.sort_by(|a, b| b.generation.cmp(&a.generation));
        } else {
            records.sort_by(|a, b| a.generation.cmp(&b.generation));
        }
        Ok(records)
    }

    /// True if the record has an id and that row is stored
    ///
    /// A record without an id never exists; no SQL is issued for it.
    pub fn exists(&self, record: &LogRecord) -> Result<bool> {
        let Some(id) = record.id() else {
            return Ok(false);
        };
        log_op_start!("log_exists", record_id = id);
        let start = Instant::now();

        let result = self.dbcon.with_connection(true, |conn| {
            if !table_exists_on(conn, LOG_TABLE)? {
                return Ok(false);
            }
            conn.query_row(&exists_sql(LOG_TABLE), [id], |_| Ok(()))
                .optional()
                .map(|found| found.is_some())
                .map_err(from_rusqlite)
        });

        finish("log_exists", start, result)
    }

    /// Store a record and assign its id
    ///
    /// Returns `true` straight away when the record is already stored. The
    /// table is created if it does not exist yet. A record carrying an id
    /// that is not stored is inserted under that id. `generation` is first
    /// cut to the microsecond precision it is stored with.
    ///
    /// # Errors
    ///
    /// `InvalidInput` when a column exceeds its length limit or `generation`
    /// is outside years 0 to 9999, otherwise whatever the database layer
    /// reports.
    pub fn add(&self, record: &mut LogRecord) -> Result<bool> {
        record.validate().map_err(ExError::from)?;
        record.generation = record.generation.trunc_subsecs(6);
        if self.exists(record)? {
            return Ok(true);
        }

        log_op_start!("log_add", host = record.host.as_str(), source = record.source.as_str());
        let start = Instant::now();

        let result = self.add_impl(record);
        finish("log_add", start, result)
    }

    fn add_impl(&self, record: &mut LogRecord) -> Result<bool> {
        let explicit_id = record.id();
        let mut values = to_sql_values(record.to_params());

        let id = self.dbcon.with_connection(true, |conn| {
            if !table_exists_on(conn, LOG_TABLE)? {
                tracing::debug!("creating LOG table on demand");
                ensure_log_table(conn)?;
            }
            let sql = match explicit_id {
                Some(id) => {
                    values.push(Value::Integer(id));
                    insert_with_id_sql(LOG_TABLE)
                }
                None => insert_sql(LOG_TABLE),
            };
            tracing::debug!(sql = %sql, "add");
            conn.execute(&sql, params_from_iter(values))
                .map_err(from_rusqlite)?;
            Ok(conn.last_insert_rowid())
        })?;

        record.assign_id(id).map_err(ExError::from)?;
        Ok(true)
    }

    /// Overwrite the stored row with the record's fields
    ///
    /// Returns `false` (and changes nothing) when the record has no id or
    /// its row is not stored.
    pub fn update(&self, record: &LogRecord) -> Result<bool> {
        let Some(id) = record.id() else {
            return Ok(false);
        };
        record.validate().map_err(ExError::from)?;

        log_op_start!("log_update", record_id = id);
        let start = Instant::now();

        let mut values = to_sql_values(record.to_params());
        values.push(Value::Integer(id));

        let result = self.dbcon.with_connection(true, |conn| {
            if !table_exists_on(conn, LOG_TABLE)? {
                return Ok(false);
            }
            let changed = conn
                .execute(&update_sql(LOG_TABLE), params_from_iter(values))
                .map_err(from_rusqlite)?;
            Ok(changed > 0)
        });

        finish("log_update", start, result)
    }

    /// Delete the record's row
    ///
    /// A record without an id is never deleted and no SQL is issued for it.
    /// Returns `true` only if a row was removed.
    pub fn remove(&self, record: &LogRecord) -> Result<bool> {
        let Some(id) = record.id() else {
            tracing::debug!("remove skipped, record has no id");
            return Ok(false);
        };

        log_op_start!("log_remove", record_id = id);
        let start = Instant::now();

        let result = self.dbcon.with_connection(true, |conn| {
            if !table_exists_on(conn, LOG_TABLE)? {
                return Ok(false);
            }
            let deleted = conn
                .execute(&delete_sql(LOG_TABLE), [id])
                .map_err(from_rusqlite)?;
            Ok(deleted > 0)
        });

        finish("log_remove", start, result)
    }

    /// Number of stored records (0 when the table does not exist)
    pub fn count(&self) -> Result<i64> {
        self.dbcon.with_connection(true, |conn| {
            if !table_exists_on(conn, LOG_TABLE)? {
                return Ok(0);
            }
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", LOG_TABLE), [], |row| {
                row.get(0)
            })
            .map_err(from_rusqlite)
        })
    }

    /// Create the table (and indexes) if missing
    pub fn init(&self) -> Result<()> {
        log_op_start!("log_init");
        let start = Instant::now();

        let result = self
            .dbcon
            .with_connection(true, |conn| ensure_log_table(conn));

        finish("log_init", start, result)
    }

    pub fn table_exists(&self) -> Result<bool> {
        self.dbcon
            .with_connection(true, |conn| table_exists_on(conn, LOG_TABLE))
    }
}

fn finish<T>(op: &'static str, start: Instant, result: Result<T>) -> Result<T> {
    let duration_ms = start.elapsed().as_millis() as u64;
    match result {
        Ok(value) => {
            log_op_end!(op, duration_ms = duration_ms);
            Ok(value)
        }
        Err(e) => {
            let e = if e.op().is_none() || e.op() == Some("sqlite") {
                e.with_op(op)
            } else {
                e
            };
            log_op_error!(op, e, duration_ms = duration_ms);
            Err(e)
        }
    }
}
