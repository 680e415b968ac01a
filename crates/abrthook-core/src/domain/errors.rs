//! Domain error types
//!
//! This module defines the errors that can surface while talking to the
//! crash collection daemon: connection failures and malformed requests.

use thiserror::Error;

/// Failure to open the transport to the crash collection daemon
///
/// `cause` holds the operating system's description of the failure
/// (e.g. "No such file or directory", "Connection refused").
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{cause} - connect(2) for {path}")]
pub struct ConnectError {
    /// OS-level cause, without the `(os error N)` suffix
    pub cause: String,
    /// The endpoint that was being connected to
    pub path: String,
}

impl ConnectError {
    /// Create a new connection error
    pub fn new(cause: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            cause: cause.into(),
            path: path.into(),
        }
    }

    /// Build a connection error from an I/O error raised by `connect(2)`.
    pub fn from_io(err: &std::io::Error, path: impl Into<String>) -> Self {
        Self::new(os_cause(err), path)
    }
}

/// Strip the `" (os error N)"` suffix that std appends to OS errors.
fn os_cause(err: &std::io::Error) -> String {
    let text = err.to_string();
    match text.rfind(" (os error ") {
        Some(idx) if err.raw_os_error().is_some() => text[..idx].to_string(),
        _ => text,
    }
}

/// Errors raised while decoding a report request
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The request does not start with the expected request line
    #[error("Missing request line")]
    MissingRequestLine,

    /// A field has no `=` separating name and value
    #[error("Field without separator: {0}")]
    MissingSeparator(String),

    /// The last field is not followed by a terminator
    #[error("Unterminated field: {0}")]
    UnterminatedField(String),

    /// The payload is not valid UTF-8
    #[error("Invalid UTF-8 in request: {0}")]
    InvalidUtf8(String),
}
