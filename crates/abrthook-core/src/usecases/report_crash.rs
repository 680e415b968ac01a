//! Report crash use case
//!
//! Drives a single unhandled error through the reporting pipeline:
//!
//! 1. Render the error and work out the executable that raised it
//! 2. Log a notice that the error was detected (always)
//! 3. Skip relative-path executables and inline scripts
//! 4. Build and encode the report
//! 5. Exchange it with the daemon over one scoped connection
//! 6. Classify the answer and log any failure
//!
//! Nothing here returns an error: every failure ends as one log line.

use std::sync::Arc;

use tracing::debug;

use crate::config::ReportConfig;
use crate::domain::{
    classify_response, encode_request, formatter, ErrorSource, Report, TransportOutcome,
};
use crate::ports::{IConnection, ICrashTransport, ILogSink};

/// Name of the peer used in log lines
pub const DAEMON_NAME: &str = "ABRT daemon";

/// Why a report was not sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The executable path is not absolute
    RelativeExecutable,
    /// The error was raised by an inline (one-line) script
    InlineScript,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::RelativeExecutable => write!(f, "relative executable path"),
            SkipReason::InlineScript => write!(f, "inline script"),
        }
    }
}

/// What `handle` did with an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportDisposition {
    /// Filtered out before any transport attempt
    Skipped(SkipReason),
    /// A transport attempt was made
    Attempted(TransportOutcome),
}

/// Everything known about a report before it is sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedReport {
    /// Multi-line rendering of the error
    pub rendered: String,
    /// Executable that raised the error
    pub executable: String,
    /// Set when the report is not eligible for sending
    pub skip: Option<SkipReason>,
    /// The report, present only when eligible
    pub report: Option<Report>,
}

/// The crash reporter
pub struct ReportCrashUseCase {
    settings: ReportConfig,
    program_name: String,
    transport: Arc<dyn ICrashTransport>,
    sink: Arc<dyn ILogSink>,
}

impl ReportCrashUseCase {
    /// Create a new reporter.
    ///
    /// `program_name` is the host's own program name, used as the
    /// executable when an error carries no backtrace.
    pub fn new(
        settings: ReportConfig,
        program_name: impl Into<String>,
        transport: Arc<dyn ICrashTransport>,
        sink: Arc<dyn ILogSink>,
    ) -> Self {
        Self {
            settings,
            program_name: program_name.into(),
            transport,
            sink,
        }
    }

    /// Program name used when an error has no backtrace
    pub fn program_name(&self) -> &str {
        &self.program_name
    }

    /// Report settings in use
    pub fn settings(&self) -> &ReportConfig {
        &self.settings
    }

    /// Report one unhandled error. Never fails and never panics.
    pub fn handle(&self, error: &dyn ErrorSource) -> ReportDisposition {
        let prepared = self.prepare(error);

        self.sink.notice(&format!(
            "detected unhandled {} exception in '{}'",
            self.settings.language, prepared.executable
        ));

        let report = match (prepared.skip, prepared.report) {
            (None, Some(report)) => report,
            (skip, _) => {
                let reason = skip.unwrap_or(SkipReason::RelativeExecutable);
                debug!(executable = %prepared.executable, %reason, "Not reporting crash");
                return ReportDisposition::Skipped(reason);
            }
        };

        let outcome = self.deliver(&report);
        self.log_outcome(&outcome);
        ReportDisposition::Attempted(outcome)
    }

    /// Render, filter and build the report without any I/O.
    pub fn prepare(&self, error: &dyn ErrorSource) -> PreparedReport {
        let rendered = formatter::format(error);
        let executable = formatter::executable(error, &self.program_name);
        let skip = self.check_eligibility(&executable);

        let report = skip.is_none().then(|| {
            Report::new(
                std::process::id(),
                &executable,
                &self.settings.analyzer,
                &self.settings.basename,
                &rendered,
            )
        });

        PreparedReport {
            rendered,
            executable,
            skip,
            report,
        }
    }

    /// Eligibility policy: `None` when the executable may be reported.
    pub fn check_eligibility(&self, executable: &str) -> Option<SkipReason> {
        if executable == self.settings.inline_script_marker {
            return Some(SkipReason::InlineScript);
        }
        if !executable.starts_with('/') {
            return Some(SkipReason::RelativeExecutable);
        }
        None
    }

    /// Send the report over one connection and classify the answer.
    fn deliver(&self, report: &Report) -> TransportOutcome {
        let mut connection = match self.transport.connect() {
            Ok(connection) => connection,
            Err(e) => return TransportOutcome::ConnectError(e),
        };
        debug!(endpoint = %self.transport.endpoint(), "Connected to crash daemon");

        let request = encode_request(report);
        match exchange(connection.as_mut(), &request) {
            Ok(response) => classify_response(&response),
            Err(e) => TransportOutcome::IoError(e.to_string()),
        }
    }

    fn log_outcome(&self, outcome: &TransportOutcome) {
        match outcome {
            TransportOutcome::Delivered => {
                debug!("Crash report delivered");
            }
            TransportOutcome::ConnectError(e) => {
                self.sink.error(&format!(
                    "can't communicate with {DAEMON_NAME}, is it running? {e}"
                ));
            }
            TransportOutcome::EmptyResponse => {
                self.sink.error(&format!(
                    "error sending data to {DAEMON_NAME}. Empty response received"
                ));
            }
            TransportOutcome::MalformedResponse(raw)
            | TransportOutcome::ErrorStatus(raw)
            | TransportOutcome::IoError(raw) => {
                self.sink
                    .error(&format!("error sending data to {DAEMON_NAME}: {raw}"));
            }
        }
    }
}

/// Write the request, half-close, and read the whole answer.
fn exchange(connection: &mut dyn IConnection, request: &[u8]) -> std::io::Result<String> {
    connection.write_all(request)?;
    connection.flush()?;
    connection.close_write()?;

    let mut response = Vec::new();
    connection.read_to_end(&mut response)?;
    Ok(String::from_utf8_lossy(&response).into_owned())
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read, Write};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::domain::{parse_request, CapturedError, ConnectError, ReportField};
    use crate::ports::LogLevel;

    // ------------------------------------------------------------------
    // Test doubles
    // ------------------------------------------------------------------

    #[derive(Default)]
    struct RecordingSink {
        lines: Mutex<Vec<(LogLevel, String)>>,
    }

    impl RecordingSink {
        fn lines(&self, level: LogLevel) -> Vec<String> {
            self.lines
                .lock()
                .unwrap()
                .iter()
                .filter(|(l, _)| *l == level)
                .map(|(_, m)| m.clone())
                .collect()
        }
    }

    impl ILogSink for RecordingSink {
        fn log(&self, level: LogLevel, message: &str) {
            self.lines.lock().unwrap().push((level, message.to_string()));
        }
    }

    struct MemoryConnection {
        written: Arc<Mutex<Vec<u8>>>,
        closed: Arc<AtomicUsize>,
        response: Cursor<Vec<u8>>,
        fail_writes: bool,
    }

    impl Read for MemoryConnection {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.response.read(buf)
        }
    }

    impl Write for MemoryConnection {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.fail_writes {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "Broken pipe",
                ));
            }
            self.written.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl IConnection for MemoryConnection {
        fn close_write(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Drop for MemoryConnection {
        fn drop(&mut self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct MemoryTransport {
        response: String,
        refuse: Option<ConnectError>,
        fail_writes: bool,
        written: Arc<Mutex<Vec<u8>>>,
        connects: AtomicUsize,
        closed: Arc<AtomicUsize>,
    }

    impl MemoryTransport {
        fn answering(response: &str) -> Self {
            Self {
                response: response.to_string(),
                ..Self::default()
            }
        }

        fn written(&self) -> Vec<u8> {
            self.written.lock().unwrap().clone()
        }
    }

    impl ICrashTransport for MemoryTransport {
        fn endpoint(&self) -> String {
            "memory".to_string()
        }

        fn connect(&self) -> Result<Box<dyn IConnection>, ConnectError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            if let Some(err) = &self.refuse {
                return Err(err.clone());
            }
            Ok(Box::new(MemoryConnection {
                written: Arc::clone(&self.written),
                closed: Arc::clone(&self.closed),
                response: Cursor::new(self.response.clone().into_bytes()),
                fail_writes: self.fail_writes,
            }))
        }
    }

    fn reporter(transport: &Arc<MemoryTransport>, sink: &Arc<RecordingSink>) -> ReportCrashUseCase {
        let settings = ReportConfig {
            language: "Ruby".to_string(),
            analyzer: "Ruby".to_string(),
            basename: "rbhook".to_string(),
            ..ReportConfig::default()
        };
        ReportCrashUseCase::new(
            settings,
            "/bar.rb",
            Arc::clone(transport) as Arc<dyn ICrashTransport>,
            Arc::clone(sink) as Arc<dyn ILogSink>,
        )
    }

    fn sample_error() -> CapturedError {
        CapturedError::new("baz", "RuntimeError").with_frames([
            "/foo/bar.rb:3:in 'block in func'",
            "/foo/bar.rb:2:in 'each'",
            "/foo/bar.rb:2:in 'func'",
            "/foo.rb:2:in '<main>'",
        ])
    }

    // ------------------------------------------------------------------
    // Delivery
    // ------------------------------------------------------------------

    #[test]
    fn handles_exceptions() {
        let transport = Arc::new(MemoryTransport::answering("HTTP/1.1 201 \r\n\r\n"));
        let sink = Arc::new(RecordingSink::default());

        let disposition = reporter(&transport, &sink).handle(&sample_error());

        assert_eq!(
            disposition,
            ReportDisposition::Attempted(TransportOutcome::Delivered)
        );
        let expected = format!(
            "PUT / HTTP/1.1\r\n\r\n\
             PID={}\0\
             EXECUTABLE=/foo.rb\0\
             ANALYZER=Ruby\0\
             TYPE=Ruby\0\
             BASENAME=rbhook\0\
             REASON=/foo/bar.rb:3:in 'block in func': baz (RuntimeError)\0\
             BACKTRACE=/foo/bar.rb:3:in 'block in func': baz (RuntimeError)\n\
             \tfrom /foo/bar.rb:2:in 'each'\n\
             \tfrom /foo/bar.rb:2:in 'func'\n\
             \tfrom /foo.rb:2:in '<main>'\0",
            std::process::id()
        );
        assert_eq!(String::from_utf8(transport.written()).unwrap(), expected);
        assert!(sink.lines(LogLevel::Error).is_empty());
    }

    #[test]
    fn logs_unhandled_exception_notice() {
        let transport = Arc::new(MemoryTransport::answering("HTTP/1.1 201 \r\n\r\n"));
        let sink = Arc::new(RecordingSink::default());

        reporter(&transport, &sink).handle(&sample_error());

        assert_eq!(
            sink.lines(LogLevel::Notice),
            vec!["detected unhandled Ruby exception in '/foo.rb'".to_string()]
        );
    }

    #[test]
    fn does_not_suffer_null_byte_injection() {
        let transport = Arc::new(MemoryTransport::answering("HTTP/1.1 201 \r\n\r\n"));
        let sink = Arc::new(RecordingSink::default());
        let error = CapturedError::new("baz\0bar", "RuntimeError")
            .with_frames(["/foo\0.rb:2:in '<main>'\0INJECTION=injected"]);

        reporter(&transport, &sink).handle(&error);

        let written = transport.written();
        let fields = parse_request(&written).unwrap();
        assert_eq!(fields.len(), ReportField::ALL.len());
        assert!(fields.iter().all(|(name, _)| name != "INJECTION"));
        assert!(fields.iter().all(|(_, value)| !value.contains('\0')));
        assert_eq!(fields[1], ("EXECUTABLE".to_string(), "/foo.rb".to_string()));
        assert!(sink.lines(LogLevel::Error).is_empty());
    }

    #[test]
    fn closes_connection_after_exchange() {
        let transport = Arc::new(MemoryTransport::answering("foo"));
        let sink = Arc::new(RecordingSink::default());

        reporter(&transport, &sink).handle(&sample_error());

        assert_eq!(transport.connects.load(Ordering::SeqCst), 1);
        assert_eq!(transport.closed.load(Ordering::SeqCst), 1);
    }

    // ------------------------------------------------------------------
    // Eligibility
    // ------------------------------------------------------------------

    #[test]
    fn ignores_executables_with_relative_path() {
        let transport = Arc::new(MemoryTransport::answering("HTTP/1.1 201 \r\n\r\n"));
        let sink = Arc::new(RecordingSink::default());
        let error = sample_error().with_frames(["./foo.rb:2:in '<main>'"]);

        let disposition = reporter(&transport, &sink).handle(&error);

        assert_eq!(
            disposition,
            ReportDisposition::Skipped(SkipReason::RelativeExecutable)
        );
        assert_eq!(transport.connects.load(Ordering::SeqCst), 0);
        assert_eq!(sink.lines(LogLevel::Notice).len(), 1);
        assert!(sink.lines(LogLevel::Error).is_empty());
    }

    #[test]
    fn ignores_oneline_scripts() {
        let transport = Arc::new(MemoryTransport::answering("HTTP/1.1 201 \r\n\r\n"));
        let sink = Arc::new(RecordingSink::default());
        let error = sample_error().with_frames(["-e:1:in '/'", "-e:1:in '<main>'"]);

        let disposition = reporter(&transport, &sink).handle(&error);

        assert_eq!(disposition, ReportDisposition::Skipped(SkipReason::InlineScript));
        assert_eq!(transport.connects.load(Ordering::SeqCst), 0);
        assert_eq!(
            sink.lines(LogLevel::Notice),
            vec!["detected unhandled Ruby exception in '-e'".to_string()]
        );
    }

    #[test]
    fn uses_program_name_without_backtrace() {
        let transport = Arc::new(MemoryTransport::answering("HTTP/1.1 201 \r\n\r\n"));
        let sink = Arc::new(RecordingSink::default());
        let error = sample_error().with_backtrace(None);

        let prepared = reporter(&transport, &sink).prepare(&error);

        assert_eq!(prepared.executable, "/bar.rb");
        assert_eq!(prepared.rendered, "baz (RuntimeError)");
        assert!(prepared.skip.is_none());
        let report = prepared.report.unwrap();
        assert_eq!(report.get(ReportField::Reason), "baz (RuntimeError)");
    }

    #[test]
    fn prepare_has_no_report_when_skipped() {
        let transport = Arc::new(MemoryTransport::default());
        let sink = Arc::new(RecordingSink::default());
        let error = sample_error().with_frames(["lib/foo.rb:1:in '<main>'"]);

        let prepared = reporter(&transport, &sink).prepare(&error);

        assert_eq!(prepared.skip, Some(SkipReason::RelativeExecutable));
        assert!(prepared.report.is_none());
        assert!(sink.lines(LogLevel::Notice).is_empty());
    }

    // ------------------------------------------------------------------
    // Failure logging
    // ------------------------------------------------------------------

    #[test]
    fn logs_empty_response() {
        let transport = Arc::new(MemoryTransport::answering(""));
        let sink = Arc::new(RecordingSink::default());

        let disposition = reporter(&transport, &sink).handle(&sample_error());

        assert_eq!(
            disposition,
            ReportDisposition::Attempted(TransportOutcome::EmptyResponse)
        );
        assert_eq!(
            sink.lines(LogLevel::Error),
            vec!["error sending data to ABRT daemon. Empty response received".to_string()]
        );
    }

    #[test]
    fn logs_malformed_response() {
        let transport = Arc::new(MemoryTransport::answering("foo"));
        let sink = Arc::new(RecordingSink::default());

        reporter(&transport, &sink).handle(&sample_error());

        assert_eq!(
            sink.lines(LogLevel::Error),
            vec!["error sending data to ABRT daemon: foo".to_string()]
        );
    }

    #[test]
    fn logs_error_status() {
        let transport = Arc::new(MemoryTransport::answering("HTTP/1.1 400 \r\n\r\n"));
        let sink = Arc::new(RecordingSink::default());

        reporter(&transport, &sink).handle(&sample_error());

        assert_eq!(
            sink.lines(LogLevel::Error),
            vec!["error sending data to ABRT daemon: HTTP/1.1 400 \r\n\r\n".to_string()]
        );
    }

    #[test]
    fn logs_connect_failure() {
        let transport = Arc::new(MemoryTransport {
            refuse: Some(ConnectError::new(
                "No such file or directory",
                "some/non/existing/path/to/socket",
            )),
            ..MemoryTransport::default()
        });
        let sink = Arc::new(RecordingSink::default());

        let disposition = reporter(&transport, &sink).handle(&sample_error());

        assert!(matches!(
            disposition,
            ReportDisposition::Attempted(TransportOutcome::ConnectError(_))
        ));
        assert_eq!(
            sink.lines(LogLevel::Error),
            vec![
                "can't communicate with ABRT daemon, is it running? No such file or directory - connect(2) for some/non/existing/path/to/socket"
                    .to_string()
            ]
        );
    }

    #[test]
    fn logs_write_failure() {
        let transport = Arc::new(MemoryTransport {
            fail_writes: true,
            ..MemoryTransport::default()
        });
        let sink = Arc::new(RecordingSink::default());

        let disposition = reporter(&transport, &sink).handle(&sample_error());

        assert!(matches!(
            disposition,
            ReportDisposition::Attempted(TransportOutcome::IoError(_))
        ));
        assert_eq!(
            sink.lines(LogLevel::Error),
            vec!["error sending data to ABRT daemon: Broken pipe".to_string()]
        );
        assert_eq!(transport.closed.load(Ordering::SeqCst), 1);
    }
}
