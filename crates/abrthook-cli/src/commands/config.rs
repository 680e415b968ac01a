//! Config command - View and validate abrthook configuration
//!
//! `show` prints the effective configuration (file, defaults and the
//! `ABRTHOOK_SOCKET` override), `validate` checks the file itself and
//! `path` prints where it is looked up.

use abrthook_core::config::Config;
use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;

use super::{config_path, load_config};
use crate::output::{Mark, Output, OutputFormat};

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show,
    /// Validate the configuration file
    Validate,
    /// Print the configuration file path
    Path,
}

impl ConfigCommand {
    pub fn execute(&self, explicit: Option<&str>, format: OutputFormat) -> Result<()> {
        match self {
            ConfigCommand::Show => execute_show(explicit, format),
            ConfigCommand::Validate => execute_validate(explicit, format),
            ConfigCommand::Path => execute_path(explicit, format),
        }
    }
}

fn execute_show(explicit: Option<&str>, format: OutputFormat) -> Result<()> {
    let mut output = Output::stdout(format);
    let path = config_path(explicit);
    let config = load_config(explicit)?;

    info!(config_path = %path.display(), "Showing configuration");

    if output.is_json() {
        let json =
            serde_json::to_value(&config).context("Failed to serialize configuration to JSON")?;
        output.document(&json)?;
    } else {
        let yaml =
            serde_yaml::to_string(&config).context("Failed to serialize configuration to YAML")?;
        output.line(Mark::Ok, format_args!("Configuration ({})", path.display()))?;
        output.block("Effective settings", &yaml)?;
    }

    Ok(())
}

fn execute_validate(explicit: Option<&str>, format: OutputFormat) -> Result<()> {
    let mut output = Output::stdout(format);
    let path = config_path(explicit);

    if !path.exists() {
        output.document(&serde_json::json!({
            "valid": true,
            "config_path": path.display().to_string(),
            "exists": false,
            "errors": [],
        }))?;
        output.line(
            Mark::Plain,
            format_args!("Configuration file not found at {}", path.display()),
        )?;
        output.line(Mark::Plain, "Using default configuration.")?;
        return Ok(());
    }

    let errors: Vec<String> = match Config::load(&path) {
        Ok(config) => {
            info!(config_path = %path.display(), "Validating configuration");
            config
                .validate()
                .iter()
                .map(|error| format!("{} - {}", error.field, error.message))
                .collect()
        }
        Err(e) => vec![format!("Failed to parse configuration: {:#}", e)],
    };

    output.document(&serde_json::json!({
        "valid": errors.is_empty(),
        "config_path": path.display().to_string(),
        "exists": true,
        "errors": errors,
    }))?;

    if errors.is_empty() {
        output.line(Mark::Ok, "Configuration is valid")?;
        output.line(Mark::Plain, format_args!("File: {}", path.display()))?;
    } else {
        output.line(
            Mark::Fail,
            format_args!(
                "Configuration has {} error{}:",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" }
            ),
        )?;
        output.line(Mark::Plain, format_args!("File: {}", path.display()))?;
        for error in &errors {
            output.line(Mark::Plain, format_args!("  {}", error))?;
        }
    }

    Ok(())
}

fn execute_path(explicit: Option<&str>, format: OutputFormat) -> Result<()> {
    let path = config_path(explicit);
    let mut output = Output::stdout(format);
    if output.is_json() {
        output.document(&serde_json::json!({
            "config_path": path.display().to_string(),
            "exists": path.exists(),
        }))?;
    } else {
        println!("{}", path.display());
    }
    Ok(())
}
