//! Crash hook for Rust programs
//!
//! Wires the reporter to the UNIX socket transport and a log sink, and
//! installs it as the process panic hook.

use std::path::PathBuf;
use std::sync::Arc;

use abrthook_core::config::{Config, ReportConfig};
use abrthook_core::domain::ErrorSource;
use abrthook_core::ports::{ICrashTransport, ILogSink};
use abrthook_core::usecases::{ReportCrashUseCase, ReportDisposition};
use abrthook_transport::UnixSocketTransport;
use tracing::info;

use crate::capture::{capture_anyhow, capture_error, capture_panic};
use crate::sinks::sink_from_config;

/// Reports unhandled errors of this process to the ABRT daemon
#[derive(Clone)]
pub struct CrashHook {
    reporter: Arc<ReportCrashUseCase>,
}

impl CrashHook {
    /// Build a hook from configuration.
    pub fn from_config(config: &Config) -> Self {
        let transport = Arc::new(UnixSocketTransport::from_config(&config.daemon));
        let sink = sink_from_config(&config.logging);
        let program_name = resolve_program_name(&config.report);
        Self::with_parts(config, program_name, transport, sink)
    }

    /// Build a hook from the default configuration file and the environment.
    pub fn from_default_config() -> Self {
        let mut config = Config::load_or_default(&Config::default_path());
        config.apply_env_overrides();
        Self::from_config(&config)
    }

    /// Build a hook around explicit adapters
    pub fn with_parts(
        config: &Config,
        program_name: impl Into<String>,
        transport: Arc<dyn ICrashTransport>,
        sink: Arc<dyn ILogSink>,
    ) -> Self {
        let reporter = ReportCrashUseCase::new(config.report.clone(), program_name, transport, sink);
        Self {
            reporter: Arc::new(reporter),
        }
    }

    /// Binary the reports are attributed to
    pub fn program_name(&self) -> &str {
        self.reporter.program_name()
    }

    /// Report an already captured error
    pub fn handle(&self, error: &dyn ErrorSource) -> ReportDisposition {
        self.reporter.handle(error)
    }

    /// Report an `anyhow::Error`, typically returned from `main`
    pub fn report_anyhow(&self, error: &anyhow::Error) -> ReportDisposition {
        self.handle(&capture_anyhow(error, self.program_name()))
    }

    /// Report any `std::error::Error` with the current stack
    pub fn report_error<E>(&self, error: &E) -> ReportDisposition
    where
        E: std::error::Error + ?Sized,
    {
        self.handle(&capture_error(error, self.program_name()))
    }

    /// Whether a panic raised on the named thread is reported
    pub fn reports_thread(&self, thread_name: Option<&str>) -> bool {
        !self.reporter.settings().main_thread_only || thread_name == Some("main")
    }

    /// Install as the panic hook.
    ///
    /// Chains with the existing panic hook so default behavior (stderr output)
    /// is preserved.
    ///
    /// The hook runs before unwinding, so it also sees panics that are later
    /// caught by `catch_unwind`, a thread `join` or a task runtime. Set
    /// `report.main_thread_only` to report only panics of the main thread.
    pub fn install(self) {
        let previous_hook = std::panic::take_hook();
        let program_name = self.program_name().to_string();

        std::panic::set_hook(Box::new(move |panic_info| {
            if self.reports_thread(std::thread::current().name()) {
                let backtrace = std::backtrace::Backtrace::force_capture();
                let captured = capture_panic(
                    panic_info.payload(),
                    panic_info.location(),
                    &backtrace,
                    self.program_name(),
                );
                self.handle(&captured);
            }

            // Call the previous panic hook
            previous_hook(panic_info);
        }));

        info!(program = %program_name, "Crash hook installed");
    }
}

/// Program name reported for errors without a backtrace.
///
/// `report.program_name` when configured, otherwise the path of the running
/// executable, otherwise `argv[0]`.
pub fn resolve_program_name(settings: &ReportConfig) -> String {
    if let Some(name) = &settings.program_name {
        return name.clone();
    }
    std::env::current_exe()
        .ok()
        .or_else(|| std::env::args_os().next().map(PathBuf::from))
        .map(|path| path.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Install a crash hook built from the default configuration file.
pub fn install_crash_hook() {
    CrashHook::from_default_config().install();
}
