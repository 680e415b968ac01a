//! UNIX socket collector
//!
//! One task per connection: read the request to EOF, decode it, forward the
//! fields and answer with the configured status line. A request that does
//! not decode is answered with `400`.

use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};

use abrthook_core::domain::{format_response, parse_request, ReportField};
use anyhow::{bail, Context, Result};
use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Status the real daemon answers with on success
pub const DEFAULT_STATUS: u16 = 201;

/// Largest request read from one client
pub const DEFAULT_MAX_REQUEST_BYTES: u64 = 1024 * 1024;

/// Status sent back for requests that do not decode
const BAD_REQUEST: u16 = 400;

/// Status sent back for requests over the size limit
const PAYLOAD_TOO_LARGE: u16 = 413;

/// A decoded crash report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceivedReport {
    /// Fields in the order they were received
    pub fields: Vec<(String, String)>,
}

impl ReceivedReport {
    /// Value of a field, if present
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Fields as a JSON object
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(key, value)| (key.clone(), serde_json::Value::String(value.clone())))
            .collect();
        serde_json::Value::Object(map)
    }
}

/// Listening collector
pub struct Collector {
    socket_path: PathBuf,
    status: u16,
    max_request_bytes: u64,
    listener: UnixListener,
}

impl Collector {
    /// Bind the socket, replacing a stale socket left at `path`.
    ///
    /// Fails when `path` is anything but a socket nobody listens on.
    pub fn bind(path: impl Into<PathBuf>, status: u16) -> Result<Self> {
        let socket_path = path.into();
        remove_stale_socket(&socket_path)?;
        let listener = UnixListener::bind(&socket_path)
            .with_context(|| format!("Failed to bind {}", socket_path.display()))?;

        Ok(Self {
            socket_path,
            status,
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
            listener,
        })
    }

    /// Limit the size of a single request
    pub fn with_max_request_bytes(mut self, limit: u64) -> Self {
        self.max_request_bytes = limit;
        self
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// Accept connections until `shutdown` is cancelled.
    ///
    /// Every decoded report is sent on `reports`. The socket file is
    /// removed on return.
    pub async fn run(
        self,
        shutdown: CancellationToken,
        reports: mpsc::UnboundedSender<ReceivedReport>,
    ) -> Result<()> {
        info!(
            path = %self.socket_path.display(),
            status = self.status,
            "Collector listening"
        );

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, _)) => {
                            let reports = reports.clone();
                            let status = self.status;
                            let limit = self.max_request_bytes;
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, status, limit, reports).await {
                                    warn!(error = %e, "Connection failed");
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                        }
                    }
                }
                _ = shutdown.cancelled() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        drop(self.listener);
        if let Err(e) = std::fs::remove_file(&self.socket_path) {
            warn!(path = %self.socket_path.display(), error = %e, "Failed to remove socket");
        }
        Ok(())
    }
}

/// Remove a socket file left behind by a collector that is gone.
fn remove_stale_socket(path: &Path) -> Result<()> {
    let metadata = match std::fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to inspect {}", path.display()))
        }
    };

    if !metadata.file_type().is_socket() {
        bail!("{} exists and is not a socket", path.display());
    }
    if std::os::unix::net::UnixStream::connect(path).is_ok() {
        bail!("{} is in use by a running daemon", path.display());
    }

    warn!(path = %path.display(), "Removing stale socket");
    std::fs::remove_file(path)
        .with_context(|| format!("Failed to remove stale socket {}", path.display()))
}

/// Serve one client.
async fn handle_connection(
    mut stream: UnixStream,
    status: u16,
    limit: u64,
    reports: mpsc::UnboundedSender<ReceivedReport>,
) -> Result<()> {
    let mut request = Vec::new();
    (&mut stream)
        .take(limit.saturating_add(1))
        .read_to_end(&mut request)
        .await
        .context("Failed to read request")?;
    debug!(bytes = request.len(), "Request received");

    let status = if request.len() as u64 > limit {
        warn!(limit, "Rejecting oversized request");
        PAYLOAD_TOO_LARGE
    } else {
        decode(&request, status, &reports)
    };

    stream
        .write_all(format_response(status).as_bytes())
        .await
        .context("Failed to write response")?;
    stream.shutdown().await.context("Failed to close connection")?;
    Ok(())
}

/// Decode a request and forward it; returns the status to answer with.
fn decode(
    request: &[u8],
    status: u16,
    reports: &mpsc::UnboundedSender<ReceivedReport>,
) -> u16 {
    match parse_request(request) {
        Ok(fields) => {
            let report = ReceivedReport { fields };
            info!(
                pid = report.get(ReportField::Pid.as_str()).unwrap_or_default(),
                executable = report.get(ReportField::Executable.as_str()).unwrap_or_default(),
                reason = report.get(ReportField::Reason.as_str()).unwrap_or_default(),
                "Crash report received"
            );
            // The receiver is gone only during shutdown.
            let _ = reports.send(report);
            status
        }
        Err(e) => {
            warn!(error = %e, "Rejecting malformed request");
            BAD_REQUEST
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ReceivedReport {
        ReceivedReport {
            fields: vec![
                ("PID".to_string(), "42".to_string()),
                ("EXECUTABLE".to_string(), "/usr/bin/app".to_string()),
            ],
        }
    }

    #[test]
    fn get_finds_field() {
        let report = sample();
        assert_eq!(report.get("PID"), Some("42"));
        assert_eq!(report.get("REASON"), None);
    }

    #[test]
    fn to_json_is_an_object_of_fields() {
        let json = sample().to_json();
        assert_eq!(json["EXECUTABLE"], "/usr/bin/app");
        assert_eq!(json["PID"], "42");
    }

    #[tokio::test]
    async fn bind_replaces_stale_socket() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abrt.socket");
        // Dropping the listener leaves the socket file behind.
        drop(std::os::unix::net::UnixListener::bind(&path).unwrap());
        assert!(path.exists());

        let collector = Collector::bind(&path, DEFAULT_STATUS).unwrap();
        assert_eq!(collector.socket_path(), path.as_path());
        assert_eq!(collector.status(), 201);
    }

    #[tokio::test]
    async fn bind_refuses_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("important.txt");
        std::fs::write(&path, b"user data").unwrap();

        let err = Collector::bind(&path, DEFAULT_STATUS).err().unwrap();
        assert!(err.to_string().contains("is not a socket"));
        assert_eq!(std::fs::read(&path).unwrap(), b"user data");
    }

    #[tokio::test]
    async fn bind_refuses_live_socket() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abrt.socket");
        let _daemon = std::os::unix::net::UnixListener::bind(&path).unwrap();

        let err = Collector::bind(&path, DEFAULT_STATUS).err().unwrap();
        assert!(err.to_string().contains("in use"));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn run_removes_socket_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abrt.socket");
        let collector = Collector::bind(&path, DEFAULT_STATUS).unwrap();
        let (tx, _rx) = mpsc::unbounded_channel();

        let token = CancellationToken::new();
        token.cancel();
        collector.run(token, tx).await.unwrap();

        assert!(!path.exists());
    }
}
