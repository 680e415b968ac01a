//! Port definitions (hexagonal architecture interfaces)
//!
//! The crash reporter depends on two capabilities supplied from outside:
//!
//! - [`ILogSink`] - The system log that receives notices and errors
//! - [`ICrashTransport`] - Opens connections to the crash collection daemon,
//!   each connection being an [`IConnection`]

pub mod log_sink;
pub mod transport;

pub use log_sink::{ILogSink, LogLevel};
pub use transport::{IConnection, ICrashTransport};
