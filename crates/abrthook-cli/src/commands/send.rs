//! Send command - Report a synthetic error through the real reporter
//!
//! Builds the crash hook exactly as an application would, so the notice
//! and any failure go to the configured log sink as well.

use abrthook::CrashHook;
use abrthook_core::usecases::ReportDisposition;
use anyhow::{bail, Result};
use tracing::info;

use super::{load_config, ErrorArgs};
use crate::output::{Output, OutputFormat};

/// Arguments for the send subcommand
#[derive(Debug, clap::Args)]
pub struct SendCommand {
    #[command(flatten)]
    pub error: ErrorArgs,
}

impl SendCommand {
    pub fn execute(&self, config_path: Option<&str>, format: OutputFormat) -> Result<()> {
        let mut output = Output::stdout(format);

        let mut config = load_config(config_path)?;
        self.error.apply(&mut config);

        info!(socket = %config.daemon.socket_path, "Sending crash report");

        let hook = CrashHook::from_config(&config);
        let disposition = hook.handle(&self.error.captured());
        output.disposition(&disposition, &config.daemon.socket_path)?;

        match disposition {
            ReportDisposition::Attempted(outcome) if !outcome.is_delivered() => {
                bail!("Report not delivered: {}", outcome)
            }
            _ => Ok(()),
        }
    }
}
