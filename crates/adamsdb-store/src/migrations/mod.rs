//! Schema migrations
//!
//! SQL files under `migrations/` are compiled in and applied in order. Each
//! applied migration is recorded in `schema_version` together with the
//! SHA-256 of its text, so editing an already-applied file is detected.

mod runner;

use sha2::{Digest, Sha256};

pub use runner::{applied_migrations, apply_migrations, ensure_log_table};

/// One embedded migration
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub id: &'static str,
    pub sql: &'static str,
}

impl Migration {
    /// Hex SHA-256 of the SQL text
    pub fn checksum(&self) -> String {
        hex::encode(Sha256::digest(self.sql.as_bytes()))
    }
}

/// Creates `LOG` and its indexes; every statement is `IF NOT EXISTS`
pub const LOG_TABLE_MIGRATION: Migration = Migration {
    id: "001_log_table",
    sql: include_str!("../../migrations/001_log_table.sql"),
};

/// All migrations, oldest first
pub const MIGRATIONS: &[Migration] = &[LOG_TABLE_MIGRATION];
