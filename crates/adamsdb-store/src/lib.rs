//! adams-db Store - SQLite persistence for log records
//!
//! Provides:
//! - Connection provider with reconnect and failed-attempt bookkeeping
//! - Embedded migrations creating the `LOG` table
//! - Row mapper between `LOG` rows and `LogRecord`
//! - `LogTable` façade (load/exists/add/update/remove) with typed errors
//! - `LenientLogTable` for callers that want log-and-default behavior
//! - Generic SQL helper and per-connection table registries
//! - TOML configuration

pub mod config;
pub mod connection;
pub mod errors;
pub mod lenient;
pub mod log_table;
pub mod migrations;
pub mod registry;
pub mod row_mapper;
pub mod sql;

// Re-export key types
pub use config::{ConfigError, StoreConfig};
pub use connection::{ConnectionKey, ConnectionParams, DatabaseConnection};
pub use errors::Result;
pub use lenient::LenientLogTable;
pub use log_table::LogTable;
pub use registry::{StoreContext, TableManager};
pub use sql::Sql;
