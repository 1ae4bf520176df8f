//! Mapping between `LOG` rows and `LogRecord`
//!
//! Columns are looked up by name, so any SELECT that includes the `LOG`
//! columns can be mapped regardless of column order.

use adamsdb_core::model::parse_timestamp;
use adamsdb_core::{LogRecord, SqlValue};
use rusqlite::types::{Type, Value};
use rusqlite::Row;

/// Map one result row to a `LogRecord`
///
/// NULL text columns become empty strings. A missing column or an
/// unparsable `GENERATION` fails the row (classified as `Mapping` by
/// [`from_rusqlite`](crate::errors::from_rusqlite)).
pub fn map_log_row(row: &Row<'_>) -> rusqlite::Result<LogRecord> {
    let id: i64 = row.get("AUTO_ID")?;
    let host = text_column(row, "HOST")?;
    let ip = text_column(row, "IP")?;
    let log_type = text_column(row, "TYPE")?;
    let message = text_column(row, "MESSAGE")?;
    let source = text_column(row, "SOURCE")?;
    let status = text_column(row, "STATUS")?;

    let generation_text: String = row.get("GENERATION")?;
    let generation = parse_timestamp(&generation_text).map_err(|e| {
        let idx = row.as_ref().column_index("GENERATION").unwrap_or(0);
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
    })?;

    Ok(LogRecord::persisted(
        id, host, ip, log_type, status, message, source, generation,
    ))
}

fn text_column(row: &Row<'_>, name: &str) -> rusqlite::Result<String> {
    let value: Option<String> = row.get(name)?;
    Ok(value.unwrap_or_default())
}

/// Convert builder values into rusqlite bind values
pub fn to_sql_values(values: Vec<SqlValue>) -> Vec<Value> {
    values
        .into_iter()
        .map(|v| match v {
            SqlValue::Integer(n) => Value::Integer(n),
            SqlValue::Text(s) => Value::Text(s),
        })
        .collect()
}
