//! Field and event names shared by the logging macros and log consumers

/// Module path of the emitting code
pub const FIELD_COMPONENT: &str = "component";
/// Operation name, e.g. `log_add`
pub const FIELD_OP: &str = "op";
/// Phase of the operation, one of the `EVENT_*` values
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_ERR_CODE: &str = "err.code";

pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
