//! Log sink adapters
//!
//! - [`SyslogSink`] - the system log, as the ABRT hooks of other runtimes do
//! - [`TracingSink`] - forwards to `tracing` for hosts with their own subscriber
//! - [`MemorySink`] - keeps lines in memory, for tests and embedding

use std::ffi::{CStr, CString};
use std::sync::{Arc, Mutex, OnceLock};

use abrthook_core::config::LoggingConfig;
use abrthook_core::ports::{ILogSink, LogLevel};
use tracing::{error, info};

/// Constant printf template; messages are only ever passed as its argument.
const SYSLOG_FORMAT: &[u8] = b"%s\0";

/// Identity the process-wide system log was opened with
static SYSLOG_IDENT: OnceLock<CString> = OnceLock::new();

/// Build the sink selected by the `logging` configuration section.
pub fn sink_from_config(config: &LoggingConfig) -> Arc<dyn ILogSink> {
    match config.sink.as_str() {
        "tracing" => Arc::new(TracingSink),
        _ => Arc::new(SyslogSink::open(&config.syslog_ident)),
    }
}

/// Convert to a C string, dropping interior NULs.
fn c_string(text: &str) -> CString {
    CString::new(text.replace('\0', "")).unwrap_or_default()
}

/// Writes to syslog(3) under the `user` facility.
///
/// The system log is process-wide: it is opened once, by the first sink,
/// and never closed. Later sinks share that identity.
#[derive(Debug, Clone, Copy)]
pub struct SyslogSink {
    ident: &'static CStr,
}

impl SyslogSink {
    /// Open the system log, or attach to it if it is already open
    pub fn open(ident: &str) -> Self {
        let ident = SYSLOG_IDENT.get_or_init(|| {
            let ident = c_string(ident);
            // SAFETY: the string is stored in a static and outlives every
            // use openlog(3) makes of the pointer.
            unsafe { libc::openlog(ident.as_ptr(), libc::LOG_PID, libc::LOG_USER) };
            ident
        });
        Self {
            ident: ident.as_c_str(),
        }
    }

    /// Identity the log was opened with
    pub fn ident(&self) -> &str {
        self.ident.to_str().unwrap_or_default()
    }
}

impl ILogSink for SyslogSink {
    fn log(&self, level: LogLevel, message: &str) {
        let priority = match level {
            LogLevel::Notice => libc::LOG_NOTICE,
            LogLevel::Error => libc::LOG_ERR,
        };
        let message = c_string(message);
        // SAFETY: both pointers are valid NUL-terminated strings and the
        // template consumes exactly one string argument.
        unsafe {
            libc::syslog(
                priority,
                SYSLOG_FORMAT.as_ptr().cast::<libc::c_char>(),
                message.as_ptr(),
            );
        }
    }
}

/// Forwards report lines to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ILogSink for TracingSink {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Notice => info!(target: "abrthook", "{}", message),
            LogLevel::Error => error!(target: "abrthook", "{}", message),
        }
    }
}

/// Keeps report lines in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<(LogLevel, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All lines, oldest first
    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Lines logged at `level`
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, message)| message)
            .collect()
    }
}

impl ILogSink for MemorySink {
    fn log(&self, level: LogLevel, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push((level, message.to_string()));
        }
    }
}
