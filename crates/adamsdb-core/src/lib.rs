//! adams-db Core - log record model, query builder and shared facilities
//!
//! This crate provides:
//! - `LogRecord` / `LogQuery` data model for the `LOG` table
//! - Statement builder turning a `LogQuery` into parameterized SQL parts
//! - Structured error facility (`ExError`, `ExErrorKind`)
//! - Logging facility (profiles, `log_op_*` macros, test capture)
//!
//! Nothing in here touches a database; see `adamsdb-store` for persistence.

pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod statement;

pub use adamsdb_core_types as types;
#[doc(hidden)]
pub use tracing;

// Re-export commonly used types
pub use errors::{ExError, ExErrorKind, LogError, Result};
pub use model::{LogQuery, LogRecord};
pub use statement::{SelectParts, SqlValue};
