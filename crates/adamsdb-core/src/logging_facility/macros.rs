//! Operation logging macros
//!
//! `log_op_start!`, `log_op_end!` and `log_op_error!` all expand to one
//! `tracing` event tagged with the calling module, the operation name and the
//! phase, so log consumers can pair a start with its end.

#[doc(hidden)]
#[macro_export]
macro_rules! __log_op_event {
    ($level:ident, $op:expr, $phase:ident $(, $($field:tt)*)?) => {
        $crate::tracing::$level!(
            component = module_path!(),
            op = $op,
            event = $crate::types::schema::$phase,
            $($($field)*)?
        )
    };
}

/// Operation start
///
/// ```
/// # use adamsdb_core::log_op_start;
/// log_op_start!("log_load");
/// log_op_start!("log_load", record_id = 7);
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)*)?) => {
        $crate::__log_op_event!(info, $op, EVENT_START $(, $($field)*)?)
    };
}

/// Operation finished; `duration_ms` is mandatory
///
/// ```
/// # use adamsdb_core::log_op_end;
/// log_op_end!("log_load", duration_ms = 3, rows = 1);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {
        $crate::__log_op_event!(
            info, $op, EVENT_END, duration_ms = $duration $(, $($field)*)?
        )
    };
}

/// Operation failed
///
/// `$err` is borrowed and cloned into an `ExError`, so the caller keeps
/// ownership and can still return it.
///
/// ```
/// # use adamsdb_core::{log_op_error, errors::{ExError, ExErrorKind}};
/// let err = ExError::new(ExErrorKind::Statement).with_message("no such table: LOG");
/// log_op_error!("log_load", err, duration_ms = 1);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {{
        let failure = $crate::errors::ExError::from(::std::clone::Clone::clone(&$err));
        $crate::__log_op_event!(
            error,
            $op,
            EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?failure.kind(),
            err.code = failure.code(),
            err.message = failure.message()
            $(, $($field)*)?
        )
    }};
}
