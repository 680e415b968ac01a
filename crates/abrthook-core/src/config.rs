//! Configuration module for abrthook.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, environment overrides, validation, defaults, and a builder
//! pattern for programmatic use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable overriding `daemon.socket_path`
pub const SOCKET_ENV_VAR: &str = "ABRTHOOK_SOCKET";

/// Socket the ABRT daemon listens on
pub const DEFAULT_SOCKET_PATH: &str = "/var/run/abrt/abrt.socket";

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for abrthook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub daemon: DaemonConfig,
    pub report: ReportConfig,
    pub logging: LoggingConfig,
}

/// Crash collection daemon endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Path of the daemon's UNIX domain socket.
    pub socket_path: String,
    /// Read timeout on the socket, in milliseconds. `None` blocks indefinitely.
    pub read_timeout_ms: Option<u64>,
    /// Write timeout on the socket, in milliseconds. `None` blocks indefinitely.
    pub write_timeout_ms: Option<u64>,
}

/// Report contents and eligibility policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Runtime name used in the "detected unhandled ... exception" notice.
    pub language: String,
    /// Value of the `ANALYZER` and `TYPE` fields.
    pub analyzer: String,
    /// Value of the `BASENAME` field, identifying this hook.
    pub basename: String,
    /// Entry-frame file name that marks inline (one-line) script execution.
    pub inline_script_marker: String,
    /// Overrides the program name used when an error carries no backtrace.
    pub program_name: Option<String>,
    /// Report only panics raised on the main thread. Panics on other
    /// threads are usually caught by `join` or a task runtime.
    pub main_thread_only: bool,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level for `tracing`: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Where crash notices and delivery errors go: `syslog` or `tracing`.
    pub sink: String,
    /// Identity used when opening syslog.
    pub syslog_ident: String,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/abrthook/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("abrthook")
            .join("config.yaml")
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides looked up through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(SOCKET_ENV_VAR).filter(|p| !p.is_empty()) {
            self.daemon.socket_path = path;
        }
    }
}

// ---------------------------------------------------------------------------
// Config::default()
// ---------------------------------------------------------------------------

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            socket_path: DEFAULT_SOCKET_PATH.to_string(),
            read_timeout_ms: None,
            write_timeout_ms: None,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            language: "Rust".to_string(),
            analyzer: "Rust".to_string(),
            basename: "rshook".to_string(),
            inline_script_marker: "-e".to_string(),
            program_name: None,
            main_thread_only: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            sink: "syslog".to_string(),
            syslog_ident: "abrt".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"daemon.socket_path"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid values for `logging.sink`.
pub const VALID_SINKS: &[&str] = &["syslog", "tracing"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- daemon ---
        if self.daemon.socket_path.is_empty() {
            errors.push(ValidationError {
                field: "daemon.socket_path".into(),
                message: "must not be empty".into(),
            });
        }
        if self.daemon.read_timeout_ms == Some(0) {
            errors.push(ValidationError {
                field: "daemon.read_timeout_ms".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.daemon.write_timeout_ms == Some(0) {
            errors.push(ValidationError {
                field: "daemon.write_timeout_ms".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- report ---
        let report_fields = [
            ("report.language", &self.report.language),
            ("report.analyzer", &self.report.analyzer),
            ("report.basename", &self.report.basename),
            ("report.inline_script_marker", &self.report.inline_script_marker),
        ];
        for (field, value) in report_fields {
            if value.is_empty() {
                errors.push(ValidationError {
                    field: field.into(),
                    message: "must not be empty".into(),
                });
            } else if value.contains('\0') {
                errors.push(ValidationError {
                    field: field.into(),
                    message: "must not contain NUL bytes".into(),
                });
            }
        }
        if self.report.basename.contains('/') {
            errors.push(ValidationError {
                field: "report.basename".into(),
                message: format!("must not contain '/': {}", self.report.basename),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }
        if !VALID_SINKS.contains(&self.logging.sink.as_str()) {
            errors.push(ValidationError {
                field: "logging.sink".into(),
                message: format!(
                    "invalid sink '{}'; valid options: {}",
                    self.logging.sink,
                    VALID_SINKS.join(", ")
                ),
            });
        }
        if self.logging.syslog_ident.is_empty() {
            errors.push(ValidationError {
                field: "logging.syslog_ident".into(),
                message: "must not be empty".into(),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use abrthook_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .socket_path("/run/abrt/abrt.socket")
///     .logging_sink("tracing")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- daemon ---

    pub fn socket_path(mut self, path: impl Into<String>) -> Self {
        self.config.daemon.socket_path = path.into();
        self
    }

    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.daemon.read_timeout_ms = Some(ms);
        self
    }

    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.daemon.write_timeout_ms = Some(ms);
        self
    }

    // --- report ---

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.config.report.language = language.into();
        self
    }

    pub fn analyzer(mut self, analyzer: impl Into<String>) -> Self {
        self.config.report.analyzer = analyzer.into();
        self
    }

    pub fn basename(mut self, basename: impl Into<String>) -> Self {
        self.config.report.basename = basename.into();
        self
    }

    pub fn inline_script_marker(mut self, marker: impl Into<String>) -> Self {
        self.config.report.inline_script_marker = marker.into();
        self
    }

    pub fn program_name(mut self, name: impl Into<String>) -> Self {
        self.config.report.program_name = Some(name.into());
        self
    }

    pub fn main_thread_only(mut self, enabled: bool) -> Self {
        self.config.report.main_thread_only = enabled;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_sink(mut self, sink: impl Into<String>) -> Self {
        self.config.logging.sink = sink.into();
        self
    }

    pub fn syslog_ident(mut self, ident: impl Into<String>) -> Self {
        self.config.logging.syslog_ident = ident.into();
        self
    }

    /// Consume the builder and return the configuration (unvalidated).
    pub fn build(self) -> Config {
        self.config
    }

    /// Consume the builder, validate, and return the configuration or errors.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let errors = self.config.validate();
        if errors.is_empty() {
            Ok(self.config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
