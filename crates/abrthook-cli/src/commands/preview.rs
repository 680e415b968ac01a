//! Preview command - Show what would be sent, without any I/O
//!
//! Prints the rendering, the executable, the eligibility decision and the
//! encoded request with control characters escaped.

use std::sync::Arc;

use abrthook::hook::resolve_program_name;
use abrthook::TracingSink;
use abrthook_core::config::Config;
use abrthook_core::domain::encode_request;
use abrthook_core::usecases::{PreparedReport, ReportCrashUseCase};
use abrthook_transport::UnixSocketTransport;
use anyhow::Result;

use super::{load_config, ErrorArgs};
use crate::output::{Mark, Output, OutputFormat};

/// Arguments for the preview subcommand
#[derive(Debug, clap::Args)]
pub struct PreviewCommand {
    #[command(flatten)]
    pub error: ErrorArgs,
}

impl PreviewCommand {
    pub fn execute(&self, config_path: Option<&str>, format: OutputFormat) -> Result<()> {
        let mut output = Output::stdout(format);

        let mut config = load_config(config_path)?;
        self.error.apply(&mut config);

        let prepared = prepare(&config, &self.error);
        let request = prepared.report.as_ref().map(encode_request);

        if output.is_json() {
            output.document(&serde_json::json!({
                "rendered": prepared.rendered,
                "executable": prepared.executable,
                "eligible": prepared.skip.is_none(),
                "skip_reason": prepared.skip.map(|reason| reason.to_string()),
                "request": request.as_deref().map(escape_request),
            }))?;
            return Ok(());
        }

        output.block("Rendering", &prepared.rendered)?;
        output.line(Mark::Plain, format_args!("Executable: {}", prepared.executable))?;
        match (prepared.skip, request) {
            (Some(reason), _) => output.line(Mark::Warn, format_args!("Not eligible: {}", reason))?,
            (None, Some(request)) => {
                output.line(
                    Mark::Ok,
                    format_args!("Eligible, would be sent to {}", config.daemon.socket_path),
                )?;
                output.block("Request", &escape_request(&request))?;
            }
            (None, None) => {}
        }

        Ok(())
    }
}

/// Prepare the report with no transport or log side effects.
fn prepare(config: &Config, error: &ErrorArgs) -> PreparedReport {
    let program_name = resolve_program_name(&config.report);
    let reporter = ReportCrashUseCase::new(
        config.report.clone(),
        program_name,
        Arc::new(UnixSocketTransport::from_config(&config.daemon)),
        Arc::new(TracingSink),
    );
    reporter.prepare(&error.captured())
}

/// Escape the request, one line per field.
pub fn escape_request(request: &[u8]) -> String {
    String::from_utf8_lossy(request)
        .split_inclusive('\0')
        .map(|field| {
            let mut escaped = String::with_capacity(field.len());
            for c in field.chars() {
                match c {
                    '\0' => escaped.push_str("\\0"),
                    '\r' => escaped.push_str("\\r"),
                    '\n' => escaped.push_str("\\n"),
                    '\t' => escaped.push_str("\\t"),
                    c => escaped.push(c),
                }
            }
            escaped
        })
        .collect::<Vec<_>>()
        .join("\n")
}
