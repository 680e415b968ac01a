//! abrthookctl - Command-line interface for abrthook
//!
//! Provides commands for:
//! - Sending a synthetic crash report to the ABRT daemon
//! - Previewing the report and wire request without sending it
//! - Inspecting and validating configuration

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    completions::CompletionsCommand, config::ConfigCommand, preview::PreviewCommand,
    send::SendCommand,
};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(
    name = "abrthookctl",
    version,
    about = "Send and inspect ABRT crash reports"
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Report a synthetic error to the ABRT daemon
    Send(SendCommand),
    /// Show the report for an error without sending it
    Preview(PreviewCommand),
    /// View and validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Generate shell completions
    Completions(CompletionsCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Send(cmd) => cmd.execute(config_path, format),
        Commands::Preview(cmd) => cmd.execute(config_path, format),
        Commands::Config(cmd) => cmd.execute(config_path, format),
        Commands::Completions(cmd) => cmd.execute(),
    }
}
