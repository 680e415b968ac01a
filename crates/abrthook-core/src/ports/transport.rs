//! Crash transport port (driven/secondary port)
//!
//! Resolves the daemon endpoint and opens one connection per report.
//!
//! ## Design Notes
//!
//! - Connections are scoped values: dropping one must close it, so every
//!   exit path of the reporter releases the socket.
//! - `close_write` half-closes the connection so the daemon sees the end
//!   of the request while the answer can still be read.

use std::io::{Read, Write};

use crate::domain::ConnectError;

/// An open connection to the crash collection daemon
pub trait IConnection: Read + Write {
    /// Signal the end of the request to the peer
    fn close_write(&mut self) -> std::io::Result<()>;
}

/// Opens connections to the crash collection daemon
pub trait ICrashTransport: Send + Sync {
    /// Human-readable endpoint, used in log lines
    fn endpoint(&self) -> String;

    /// Connect to the daemon
    fn connect(&self) -> Result<Box<dyn IConnection>, ConnectError>;
}
