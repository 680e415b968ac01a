//! ABRT wire protocol
//!
//! The request is an HTTP-looking preamble followed by `NAME=value\0`
//! fields:
//!
//! ```text
//! PUT / HTTP/1.1\r\n\r\nPID=1234\0EXECUTABLE=/usr/bin/app\0...
//! ```
//!
//! The daemon answers with a status line such as `HTTP/1.1 201 \r\n\r\n`.

use super::errors::{ConnectError, ProtocolError};
use super::report::{Report, FIELD_TERMINATOR};

/// Request line preceding the report fields
pub const REQUEST_LINE: &str = "PUT / HTTP/1.1\r\n\r\n";

/// Encode a report as a complete request.
pub fn encode_request(report: &Report) -> Vec<u8> {
    let mut request = String::from(REQUEST_LINE);
    for (field, value) in report.fields() {
        request.push_str(field.as_str());
        request.push('=');
        request.push_str(value);
        request.push(FIELD_TERMINATOR);
    }
    request.into_bytes()
}

/// Decode a request back into `(name, value)` pairs.
///
/// Every field must be terminated; the value is everything after the
/// first `=` up to the terminator.
pub fn parse_request(request: &[u8]) -> Result<Vec<(String, String)>, ProtocolError> {
    let text =
        std::str::from_utf8(request).map_err(|e| ProtocolError::InvalidUtf8(e.to_string()))?;
    let body = text
        .strip_prefix(REQUEST_LINE)
        .ok_or(ProtocolError::MissingRequestLine)?;

    let mut fields = Vec::new();
    let mut rest = body;
    while !rest.is_empty() {
        let Some(end) = rest.find(FIELD_TERMINATOR) else {
            return Err(ProtocolError::UnterminatedField(rest.to_string()));
        };
        let raw = &rest[..end];
        let (name, value) = raw
            .split_once('=')
            .ok_or_else(|| ProtocolError::MissingSeparator(raw.to_string()))?;
        fields.push((name.to_string(), value.to_string()));
        rest = &rest[end + FIELD_TERMINATOR.len_utf8()..];
    }

    Ok(fields)
}

/// Status line sent back by a collector, e.g. `HTTP/1.1 201 \r\n\r\n`
pub fn format_response(status: u16) -> String {
    format!("HTTP/1.1 {status} \r\n\r\n")
}

/// Result of one reporting attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportOutcome {
    /// The daemon accepted the report (2xx)
    Delivered,
    /// The daemon closed the connection without answering
    EmptyResponse,
    /// The answer is not a recognisable status line
    MalformedResponse(String),
    /// The daemon answered with a non-2xx status
    ErrorStatus(String),
    /// The daemon could not be reached
    ConnectError(ConnectError),
    /// Connected, but writing the request or reading the answer failed
    IoError(String),
}

impl TransportOutcome {
    /// Whether the report reached the daemon and was accepted
    pub fn is_delivered(&self) -> bool {
        matches!(self, TransportOutcome::Delivered)
    }
}

impl std::fmt::Display for TransportOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportOutcome::Delivered => write!(f, "delivered"),
            TransportOutcome::EmptyResponse => write!(f, "empty response"),
            TransportOutcome::MalformedResponse(raw) => write!(f, "malformed response: {raw:?}"),
            TransportOutcome::ErrorStatus(raw) => write!(f, "error status: {raw:?}"),
            TransportOutcome::ConnectError(err) => write!(f, "connect error: {err}"),
            TransportOutcome::IoError(cause) => write!(f, "I/O error: {cause}"),
        }
    }
}

/// Classify the daemon's answer.
pub fn classify_response(response: &str) -> TransportOutcome {
    if response.is_empty() {
        return TransportOutcome::EmptyResponse;
    }

    let mut parts = response.split_whitespace();
    let version = parts.next().unwrap_or_default();
    let status = parts
        .next()
        .filter(|code| code.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|code| code.parse::<u16>().ok());

    match status {
        Some(code) if version.starts_with("HTTP/") => {
            if (200..=299).contains(&code) {
                TransportOutcome::Delivered
            } else {
                TransportOutcome::ErrorStatus(response.to_string())
            }
        }
        _ => TransportOutcome::MalformedResponse(response.to_string()),
    }
}
