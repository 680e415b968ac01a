//! Log sink port (driven/secondary port)
//!
//! The reporter writes exactly one notice per detected error and one
//! error line per failed delivery. Implementations route them to syslog,
//! `tracing`, or memory for tests.
//!
//! ## Design Notes
//!
//! - Messages are complete strings. Implementations that hand them to a
//!   printf-style API must pass them as an argument of a constant
//!   template, never as the template itself.
//! - Logging is infallible from the caller's point of view.

use std::fmt::{self, Display, Formatter};

/// Severity of a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Notice,
    Error,
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Notice => "notice",
            LogLevel::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// Destination of the reporter's diagnostic lines
pub trait ILogSink: Send + Sync {
    /// Write one line at the given level
    fn log(&self, level: LogLevel, message: &str);

    /// Write a notice-level line
    fn notice(&self, message: &str) {
        self.log(LogLevel::Notice, message);
    }

    /// Write an error-level line
    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }
}
