use adamsdb_core_types::{RequestContext, RequestId, TraceId};
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExError>;

/// Failure classes with stable codes for callers, tests and CLI output
///
/// A store operation surfaces one of `Connection`, `Statement` or `Mapping`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExErrorKind {
    /// No usable database connection could be obtained
    Connection,
    /// SQL was malformed or rejected by the database
    Statement,
    /// A result row is missing an expected column or holds an unparsable value
    Mapping,
    NotFound,
    InvalidInput,
    Config,
    Io,
    Serialization,
    Internal,
}

impl ExErrorKind {
    pub fn code(&self) -> &'static str {
        use ExErrorKind::*;
        match self {
            Connection => "ERR_CONNECTION",
            Statement => "ERR_STATEMENT",
            Mapping => "ERR_MAPPING",
            NotFound => "ERR_NOT_FOUND",
            InvalidInput => "ERR_INVALID_INPUT",
            Config => "ERR_CONFIG",
            Io => "ERR_IO",
            Serialization => "ERR_SERIALIZATION",
            Internal => "ERR_INTERNAL",
        }
    }
}

/// Structured error returned by every fallible store call
///
/// Built with `ExError::new(kind)` and the `with_*` methods:
///
/// ```
/// use adamsdb_core::errors::{ExError, ExErrorKind};
///
/// let err = ExError::new(ExErrorKind::NotFound)
///     .with_op("log_load")
///     .with_entity_id("42");
/// assert_eq!(err.to_string(), "[ERR_NOT_FOUND] in operation 'log_load' (entity_id: 42)");
/// ```
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    message: String,
    op: Option<String>,
    entity_id: Option<String>,
    context: Option<RequestContext>,
    cause: Option<Box<ExError>>,
}

impl ExError {
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            message: String::new(),
            op: None,
            entity_id: None,
            context: None,
            cause: None,
        }
    }

    /// Operation that failed (`log_add`, `connect`, ...)
    pub fn with_op(self, op: impl Into<String>) -> Self {
        Self {
            op: Some(op.into()),
            ..self
        }
    }

    /// Record id, table name or connection key the failure concerns
    pub fn with_entity_id(self, id: impl Into<String>) -> Self {
        Self {
            entity_id: Some(id.into()),
            ..self
        }
    }

    /// Attach the ids of the request the error belongs to
    pub fn with_context(self, ctx: &RequestContext) -> Self {
        Self {
            context: Some(ctx.clone()),
            ..self
        }
    }

    pub fn with_message(self, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..self
        }
    }

    pub fn with_source(self, source: ExError) -> Self {
        Self {
            cause: Some(Box::new(source)),
            ..self
        }
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.context.as_ref().map(|ctx| &ctx.request_id)
    }

    pub fn trace_id(&self) -> Option<&TraceId> {
        self.context.as_ref().and_then(|ctx| ctx.trace_id.as_ref())
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.cause.as_deref()
    }
}

impl fmt::Display for ExError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        f.write_str(self.code())?;
        f.write_str("]")?;
        if let Some(op) = self.op() {
            write!(f, " in operation '{op}'")?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(id) = self.entity_id() {
            write!(f, " (entity_id: {id})")?;
        }
        if let Some(id) = self.request_id() {
            write!(f, " (request_id: {id})")?;
        }
        match &self.cause {
            Some(cause) => write!(f, "; caused by {cause}"),
            None => Ok(()),
        }
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// Domain errors raised while building or validating log records and queries
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LogError {
    /// No row with the given primary key
    #[error("Log record not found: {id}")]
    RecordNotFound { id: i64 },

    /// Record failed validation before reaching the database
    #[error("Invalid log record: {reason}")]
    InvalidRecord { reason: String },

    /// A filter pattern is not a valid regular expression
    #[error("Invalid pattern for {column}: {reason}")]
    InvalidPattern { column: String, reason: String },

    /// Timestamp text could not be parsed
    #[error("Invalid timestamp '{value}': {reason}")]
    InvalidTimestamp { value: String, reason: String },

    /// Generation range is inverted
    #[error("Invalid generation range: start {start} is after end {end}")]
    InvalidRange { start: String, end: String },
}

impl From<LogError> for ExError {
    fn from(err: LogError) -> Self {
        match err {
            LogError::RecordNotFound { id } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(id.to_string())
                .with_message("Log record not found"),

            LogError::InvalidRecord { reason } => ExError::new(ExErrorKind::InvalidInput)
                .with_message(format!("Invalid log record: {}", reason)),

            LogError::InvalidPattern { column, reason } => ExError::new(ExErrorKind::InvalidInput)
                .with_entity_id(column)
                .with_message(format!("Invalid pattern: {}", reason)),

            LogError::InvalidTimestamp { value, reason } => ExError::new(ExErrorKind::Mapping)
                .with_entity_id(value)
                .with_message(format!("Invalid timestamp: {}", reason)),

            LogError::InvalidRange { start, end } => ExError::new(ExErrorKind::InvalidInput)
                .with_op("build_query")
                .with_message(format!("start {} is after end {}", start, end)),
        }
    }
}

impl From<serde_json::Error> for ExError {
    fn from(err: serde_json::Error) -> Self {
        ExError::new(ExErrorKind::Serialization).with_message(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_failure_kind_codes() {
        assert_eq!(ExErrorKind::Connection.code(), "ERR_CONNECTION");
        assert_eq!(ExErrorKind::Statement.code(), "ERR_STATEMENT");
        assert_eq!(ExErrorKind::Mapping.code(), "ERR_MAPPING");
    }

    #[test]
    fn test_display_includes_context() {
        let err = ExError::new(ExErrorKind::Statement)
            .with_op("add")
            .with_entity_id("LOG")
            .with_message("no such table");

        let text = err.to_string();
        assert!(text.starts_with("[ERR_STATEMENT]"));
        assert!(text.contains("'add'"));
        assert!(text.contains("no such table"));
        assert!(text.contains("entity_id: LOG"));
    }

    #[test]
    fn test_source_chain() {
        let root = ExError::new(ExErrorKind::Connection).with_message("unable to open");
        let err = ExError::new(ExErrorKind::Statement).with_source(root);

        assert_eq!(
            err.source_error().map(|e| e.kind()),
            Some(ExErrorKind::Connection)
        );
        assert!(std::error::Error::source(&err).is_some());
    }
}
