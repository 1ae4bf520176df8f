//! Filters and sort order for loading log records

use crate::errors::LogError;
use crate::model::record::format_timestamp;
use chrono::{DateTime, Utc};
use regex::Regex;

/// Pattern that matches everything; treated the same as no filter
pub const MATCH_ALL: &str = ".*";

/// Filters and sort order for `LogTable::load_matching`
///
/// String filters are regular expressions matched against the column.
/// `None`, `""` and [`MATCH_ALL`] all mean "no filter". Absent generation
/// bounds mean unbounded. A limit of `None` or `<= 0` means unbounded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogQuery {
    pub host: Option<String>,
    pub ip: Option<String>,
    pub log_type: Option<String>,
    pub status: Option<String>,
    pub source: Option<String>,
    pub generation_start: Option<DateTime<Utc>>,
    pub generation_end: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub latest: bool,
}

impl LogQuery {
    /// Query matching every record, oldest first, unlimited
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host(mut self, pattern: impl Into<String>) -> Self {
        self.host = Some(pattern.into());
        self
    }

    pub fn ip(mut self, pattern: impl Into<String>) -> Self {
        self.ip = Some(pattern.into());
        self
    }

    pub fn log_type(mut self, pattern: impl Into<String>) -> Self {
        self.log_type = Some(pattern.into());
        self
    }

    pub fn status(mut self, pattern: impl Into<String>) -> Self {
        self.status = Some(pattern.into());
        self
    }

    pub fn source(mut self, pattern: impl Into<String>) -> Self {
        self.source = Some(pattern.into());
        self
    }

    /// Inclusive lower bound on `generation`
    pub fn generated_after(mut self, start: DateTime<Utc>) -> Self {
        self.generation_start = Some(start);
        self
    }

    /// Inclusive upper bound on `generation`
    pub fn generated_before(mut self, end: DateTime<Utc>) -> Self {
        self.generation_end = Some(end);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Newest first when true
    pub fn latest(mut self, latest: bool) -> Self {
        self.latest = latest;
        self
    }

    /// Effective limit: `Some(n)` only for `n > 0`
    pub fn effective_limit(&self) -> Option<i64> {
        self.limit.filter(|n| *n > 0)
    }

    /// Active string filters as `(column, pattern)` in column order
    pub fn active_filters(&self) -> Vec<(&'static str, &str)> {
        [
            ("HOST", &self.host),
            ("IP", &self.ip),
            ("TYPE", &self.log_type),
            ("STATUS", &self.status),
            ("SOURCE", &self.source),
        ]
        .into_iter()
        .filter_map(|(column, pattern)| {
            pattern
                .as_deref()
                .filter(|p| is_active_pattern(p))
                .map(|p| (column, p))
        })
        .collect()
    }

    /// Reject invalid patterns and inverted ranges before any SQL is built
    pub fn validate(&self) -> Result<(), LogError> {
        for (column, pattern) in self.active_filters() {
            Regex::new(pattern).map_err(|e| LogError::InvalidPattern {
                column: column.to_string(),
                reason: e.to_string(),
            })?;
        }
        if let (Some(start), Some(end)) = (&self.generation_start, &self.generation_end) {
            if start > end {
                return Err(LogError::InvalidRange {
                    start: format_timestamp(start),
                    end: format_timestamp(end),
                });
            }
        }
        Ok(())
    }
}

fn is_active_pattern(pattern: &str) -> bool {
    !pattern.is_empty() && pattern != MATCH_ALL
}
