//! Data model for the `LOG` table

pub mod query;
pub mod record;

pub use query::{LogQuery, MATCH_ALL};
pub use record::{format_timestamp, parse_timestamp, LogRecord, TIMESTAMP_FORMAT};
