//! UNIX domain socket transport
//!
//! Connects to the daemon socket named in the configuration. Timeouts are
//! optional and applied by the OS on the connected socket.

use std::io::{Read, Write};
use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::time::Duration;

use abrthook_core::config::DaemonConfig;
use abrthook_core::domain::ConnectError;
use abrthook_core::ports::{IConnection, ICrashTransport};
use tracing::debug;

/// `ICrashTransport` over a UNIX domain socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnixSocketTransport {
    path: String,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
}

impl UnixSocketTransport {
    /// Transport to the socket at `path`, without timeouts
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            read_timeout: None,
            write_timeout: None,
        }
    }

    /// Transport described by the `daemon` configuration section
    pub fn from_config(config: &DaemonConfig) -> Self {
        Self {
            path: config.socket_path.clone(),
            read_timeout: config.read_timeout_ms.map(Duration::from_millis),
            write_timeout: config.write_timeout_ms.map(Duration::from_millis),
        }
    }

    /// Socket path
    pub fn path(&self) -> &str {
        &self.path
    }

    fn open(&self) -> std::io::Result<UnixStream> {
        let stream = UnixStream::connect(&self.path)?;
        stream.set_read_timeout(self.read_timeout)?;
        stream.set_write_timeout(self.write_timeout)?;
        Ok(stream)
    }
}

impl ICrashTransport for UnixSocketTransport {
    fn endpoint(&self) -> String {
        self.path.clone()
    }

    fn connect(&self) -> Result<Box<dyn IConnection>, ConnectError> {
        let stream = self
            .open()
            .map_err(|e| ConnectError::from_io(&e, self.path.as_str()))?;
        debug!(path = %self.path, "Opened daemon socket");
        Ok(Box::new(UnixConnection { stream }))
    }
}

/// An open daemon connection; the socket is shut down on drop
#[derive(Debug)]
pub struct UnixConnection {
    stream: UnixStream,
}

impl Read for UnixConnection {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.stream.read(buf)
    }
}

impl Write for UnixConnection {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.stream.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.stream.flush()
    }
}

impl IConnection for UnixConnection {
    fn close_write(&mut self) -> std::io::Result<()> {
        self.stream.shutdown(Shutdown::Write)
    }
}

impl Drop for UnixConnection {
    fn drop(&mut self) {
        // NotConnected here only means the peer already went away.
        if let Err(e) = self.stream.shutdown(Shutdown::Both) {
            debug!(error = %e, "Daemon socket already closed");
        }
    }
}
