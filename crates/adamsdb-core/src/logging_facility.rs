//! Structured logging
//!
//! Binaries call [`init`] once with a [`Profile`]. Library code never
//! installs a subscriber; it only emits events through `log_op_start!`,
//! `log_op_end!` and `log_op_error!`. Tests install [`init_test_capture`]
//! instead and assert on what was emitted.
//!
//! ```rust
//! use adamsdb_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
