//! Log record model (one row of the `LOG` table)

use crate::errors::LogError;
use chrono::{DateTime, Datelike, NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Timestamp layout used for the `GENERATION` column and query bounds.
///
/// Fixed width, so lexical order in SQLite equals chronological order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Maximum lengths of the VARCHAR columns
pub const MAX_HOST_LEN: usize = 255;
pub const MAX_IP_LEN: usize = 50;
pub const MAX_TYPE_LEN: usize = 255;
pub const MAX_STATUS_LEN: usize = 255;

/// Years whose `TIMESTAMP_FORMAT` text is four digits without a sign
pub const GENERATION_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

/// Format a generation timestamp for storage or comparison
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored generation timestamp
///
/// Accepts the storage layout (fraction optional) and RFC 3339.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, LogError> {
    let trimmed = value.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| LogError::InvalidTimestamp {
            value: value.to_string(),
            reason: e.to_string(),
        })
}

/// A persisted log message
///
/// `id` is `None` until the store assigns the primary key; after that it
/// never changes. `generation` is always supplied by the producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    id: Option<i64>,
    pub host: String,
    pub ip: String,
    #[serde(rename = "type")]
    pub log_type: String,
    pub status: String,
    pub message: String,
    pub source: String,
    pub generation: DateTime<Utc>,
}

impl LogRecord {
    /// Create a new (not yet persisted) record
    ///
    /// `generation` is truncated to microseconds, the precision of the
    /// `GENERATION` column.
    pub fn new(
        host: impl Into<String>,
        ip: impl Into<String>,
        log_type: impl Into<String>,
        status: impl Into<String>,
        message: impl Into<String>,
        source: impl Into<String>,
        generation: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            host: host.into(),
            ip: ip.into(),
            log_type: log_type.into(),
            status: status.into(),
            message: message.into(),
            source: source.into(),
            generation: generation.trunc_subsecs(6),
        }
    }

    /// Rebuild a record that already carries a database id
    #[allow(clippy::too_many_arguments)]
    pub fn persisted(
        id: i64,
        host: impl Into<String>,
        ip: impl Into<String>,
        log_type: impl Into<String>,
        status: impl Into<String>,
        message: impl Into<String>,
        source: impl Into<String>,
        generation: DateTime<Utc>,
    ) -> Self {
        let mut record = Self::new(host, ip, log_type, status, message, source, generation);
        record.id = Some(id);
        record
    }

    /// Build the message from key/value properties
    pub fn with_properties(mut self, properties: &BTreeMap<String, String>) -> Self {
        self.message = properties
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("\n");
        self
    }

    /// Database id, if the record has been stored
    pub fn id(&self) -> Option<i64> {
        self.id
    }

    /// True once the store has assigned an id
    pub fn has_id(&self) -> bool {
        self.id.is_some()
    }

    /// Record the id assigned by the store
    ///
    /// Re-assigning the same id is a no-op; a different id is rejected.
    pub fn assign_id(&mut self, id: i64) -> Result<(), LogError> {
        match self.id {
            None => {
                self.id = Some(id);
                Ok(())
            }
            Some(existing) if existing == id => Ok(()),
            Some(existing) => Err(LogError::InvalidRecord {
                reason: format!("id {} already assigned, refusing {}", existing, id),
            }),
        }
    }

    /// Parse the message as `key=value` lines
    ///
    /// Blank lines, `#` comments and lines without `=` are skipped.
    pub fn message_properties(&self) -> BTreeMap<String, String> {
        self.message
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| line.split_once('='))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect()
    }

    /// Field-wise equality ignoring `id`
    pub fn same_content(&self, other: &LogRecord) -> bool {
        self.host == other.host
            && self.ip == other.ip
            && self.log_type == other.log_type
            && self.status == other.status
            && self.message == other.message
            && self.source == other.source
            && self.generation == other.generation
    }

    /// Check column length limits and the generation year before the record
    /// reaches the database
    pub fn validate(&self) -> Result<(), LogError> {
        let year = self.generation.year();
        if !GENERATION_YEARS.contains(&year) {
            return Err(LogError::InvalidRecord {
                reason: format!("generation year {} is outside 0..=9999", year),
            });
        }
        let checks = [
            ("host", &self.host, MAX_HOST_LEN),
            ("ip", &self.ip, MAX_IP_LEN),
            ("type", &self.log_type, MAX_TYPE_LEN),
            ("status", &self.status, MAX_STATUS_LEN),
        ];
        for (name, value, max) in checks {
            let len = value.chars().count();
            if len > max {
                return Err(LogError::InvalidRecord {
                    reason: format!("{} is {} chars, limit is {}", name, len, max),
                });
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for LogRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.id {
            Some(id) => write!(f, "#{} ", id)?,
            None => write!(f, "#new ")?,
        }
        write!(
            f,
            "{} {}@{} ({}) [{}] {}",
            format_timestamp(&self.generation),
            self.source,
            self.host,
            self.ip,
            self.log_type,
            self.status
        )
    }
}
