//! Error handling for adamsdb-store
//!
//! Wraps adamsdb-core ExError with store-specific helpers

use adamsdb_core::errors::{ExError, ExErrorKind};
use rusqlite::ErrorCode;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Classify a rusqlite error into the store taxonomy
///
/// Column lookup and value conversion failures are `Mapping`, and so is a
/// statement SQLite rejects for naming a column the table lacks. Failures to
/// open the database file are `Connection`, everything else is `Statement`.
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    let kind = match &err {
        rusqlite::Error::InvalidColumnName(_)
        | rusqlite::Error::InvalidColumnIndex(_)
        | rusqlite::Error::InvalidColumnType(..)
        | rusqlite::Error::FromSqlConversionFailure(..)
        | rusqlite::Error::IntegralValueOutOfRange(..) => ExErrorKind::Mapping,
        rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.starts_with("no such column") => {
            ExErrorKind::Mapping
        }
        rusqlite::Error::SqliteFailure(e, _)
            if matches!(
                e.code,
                ErrorCode::CannotOpen | ErrorCode::NotADatabase | ErrorCode::PermissionDenied
            ) =>
        {
            ExErrorKind::Connection
        }
        _ => ExErrorKind::Statement,
    };
    ExError::new(kind)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Create a connection error
pub fn connection_error(url: &str, reason: impl Into<String>) -> ExError {
    ExError::new(ExErrorKind::Connection)
        .with_op("connect")
        .with_entity_id(url)
        .with_message(reason)
}

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Statement)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Create a checksum mismatch error
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::Statement)
        .with_op("migration_checksum")
        .with_message(format!(
            "Checksum mismatch for migration {}: expected {}, got {}",
            migration_id, expected, actual
        ))
}
