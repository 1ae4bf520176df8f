use adamsdb_core::errors::{ExError, ExErrorKind, LogError};
use adamsdb_core::types::RequestContext;

#[test]
fn test_record_not_found_maps_to_not_found() {
    let ex_err: ExError = LogError::RecordNotFound { id: 3 }.into();

    assert_eq!(ex_err.kind(), ExErrorKind::NotFound);
    assert_eq!(ex_err.code(), "ERR_NOT_FOUND");
    assert_eq!(ex_err.entity_id(), Some("3"));
}

#[test]
fn test_invalid_pattern_is_invalid_input() {
    let ex_err: ExError = LogError::InvalidPattern {
        column: "HOST".to_string(),
        reason: "unclosed group".to_string(),
    }
    .into();

    assert_eq!(ex_err.kind(), ExErrorKind::InvalidInput);
    assert_eq!(ex_err.entity_id(), Some("HOST"));
    assert!(ex_err.message().contains("unclosed group"));
}

#[test]
fn test_invalid_timestamp_is_mapping_error() {
    let ex_err: ExError = LogError::InvalidTimestamp {
        value: "garbage".to_string(),
        reason: "input contains invalid characters".to_string(),
    }
    .into();

    assert_eq!(ex_err.kind(), ExErrorKind::Mapping);
}

#[test]
fn test_error_kind_codes_are_unique() {
    let kinds = [
        ExErrorKind::Connection,
        ExErrorKind::Statement,
        ExErrorKind::Mapping,
        ExErrorKind::NotFound,
        ExErrorKind::InvalidInput,
        ExErrorKind::Config,
        ExErrorKind::Io,
        ExErrorKind::Serialization,
        ExErrorKind::Internal,
    ];
    let mut codes: Vec<_> = kinds.iter().map(|k| k.code()).collect();
    codes.sort();
    codes.dedup();
    assert_eq!(codes.len(), kinds.len());
}

#[test]
fn test_request_context_is_attached() {
    let ctx = RequestContext::resume("req-7").with_trace_id("trace-1");
    let ex_err = ExError::new(ExErrorKind::Statement)
        .with_op("log_add")
        .with_context(&ctx);

    assert_eq!(ex_err.request_id().map(|id| id.as_str()), Some("req-7"));
    assert_eq!(ex_err.trace_id().map(|id| id.as_str()), Some("trace-1"));
    assert!(ex_err.to_string().contains("request_id: req-7"));
}
