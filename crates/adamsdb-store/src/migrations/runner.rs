//! Applies pending migrations

use super::{Migration, LOG_TABLE_MIGRATION, MIGRATIONS};
use crate::errors::{checksum_mismatch, from_rusqlite, migration_error, Result};
use crate::sql::table_exists_on;
use adamsdb_core::statement::LOG_TABLE;
use rusqlite::{params, Connection, OptionalExtension};

const CREATE_SCHEMA_VERSION: &str = "CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY,
    migration_id TEXT NOT NULL UNIQUE,
    applied_at INTEGER NOT NULL,
    checksum TEXT
)";

/// Bring the schema up to date
///
/// Migrations already recorded are verified against their checksum and
/// skipped; the rest run in their own transaction.
///
/// # Errors
///
/// `Statement` when a migration fails or a recorded checksum differs.
pub fn apply_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(CREATE_SCHEMA_VERSION)
        .map_err(from_rusqlite)?;
    MIGRATIONS.iter().try_for_each(|m| apply_one(conn, m))
}

/// Apply pending migrations and make sure the `LOG` table exists
///
/// A recorded migration is not re-run, so a `LOG` table dropped after its
/// migration was applied is recreated here from the same SQL.
///
/// # Errors
///
/// As [`apply_migrations`], or `Statement` when the table cannot be created.
pub fn ensure_log_table(conn: &Connection) -> Result<()> {
    apply_migrations(conn)?;
    if table_exists_on(conn, LOG_TABLE)? {
        return Ok(());
    }
    tracing::warn!(
        migration_id = LOG_TABLE_MIGRATION.id,
        "LOG table missing although its migration is recorded, recreating"
    );
    conn.execute_batch(LOG_TABLE_MIGRATION.sql)
        .map_err(|e| migration_error(LOG_TABLE_MIGRATION.id, &e.to_string()))
}

/// Ids of applied migrations, in application order
///
/// # Errors
///
/// `Statement` when `schema_version` cannot be read.
pub fn applied_migrations(conn: &Connection) -> Result<Vec<String>> {
    conn.execute_batch(CREATE_SCHEMA_VERSION)
        .map_err(from_rusqlite)?;
    let mut stmt = conn
        .prepare("SELECT migration_id FROM schema_version ORDER BY id")
        .map_err(from_rusqlite)?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(from_rusqlite)?;
    rows.map(|r| r.map_err(from_rusqlite)).collect()
}

fn recorded_checksum(conn: &Connection, id: &str) -> Result<Option<Option<String>>> {
    conn.query_row(
        "SELECT checksum FROM schema_version WHERE migration_id = ?1",
        [id],
        |row| row.get(0),
    )
    .optional()
    .map_err(from_rusqlite)
}

fn apply_one(conn: &Connection, migration: &Migration) -> Result<()> {
    let checksum = migration.checksum();

    if let Some(recorded) = recorded_checksum(conn, migration.id)? {
        return match recorded {
            Some(stored) if stored != checksum => {
                Err(checksum_mismatch(migration.id, &stored, &checksum))
            }
            _ => Ok(()),
        };
    }

    // unchecked: the connection is only borrowed
    let tx = conn.unchecked_transaction().map_err(from_rusqlite)?;
    tx.execute_batch(migration.sql)
        .map_err(|e| migration_error(migration.id, &e.to_string()))?;
    tx.execute(
        "INSERT INTO schema_version (migration_id, applied_at, checksum) VALUES (?1, ?2, ?3)",
        params![migration.id, chrono::Utc::now().timestamp(), checksum],
    )
    .map_err(from_rusqlite)?;
    tx.commit().map_err(from_rusqlite)?;

    tracing::info!(migration_id = migration.id, "applied migration");
    Ok(())
}
