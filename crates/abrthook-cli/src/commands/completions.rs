//! Completions command - Print a shell completion script for abrthookctl

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::Shell;

/// Arguments for the completions subcommand
#[derive(Debug, clap::Args)]
pub struct CompletionsCommand {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsCommand {
    pub fn execute(&self) -> Result<()> {
        let mut stdout = io::stdout().lock();
        write_completions(self.shell, &mut stdout);
        stdout.flush().context("Failed to write completions")
    }
}

/// Write the completion script for `shell`.
pub fn write_completions(shell: Shell, out: &mut impl Write) {
    let mut cmd = crate::Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, out);
}
