//! Domain entities and business logic
//!
//! This module contains the core domain types for abrthook:
//! - Stack frames and the captured error value
//! - The exception formatter (rendering and executable extraction)
//! - The report model and the ABRT wire protocol
//! - Domain-specific error types

pub mod captured_error;
pub mod errors;
pub mod formatter;
pub mod frame;
pub mod protocol;
pub mod report;

// Re-export commonly used types
pub use captured_error::{CapturedError, ErrorSource};
pub use errors::{ConnectError, ProtocolError};
pub use formatter::{executable, format};
pub use frame::StackFrame;
pub use protocol::{
    classify_response, encode_request, format_response, parse_request, TransportOutcome,
};
pub use report::{Report, ReportField};
