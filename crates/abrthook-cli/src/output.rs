//! Console output for abrthookctl
//!
//! Commands print through [`Output`]. In `--json` mode only whole documents
//! are written; marked lines and blocks are human-mode only.

use std::fmt::Display;
use std::io::{self, Write};

use abrthook_core::usecases::ReportDisposition;

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        matches!(self, OutputFormat::Json)
    }
}

/// Leading marker of a human line
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mark {
    Ok,
    Warn,
    Fail,
    /// Indented, unmarked
    Plain,
}

impl Mark {
    fn prefix(self) -> &'static str {
        match self {
            Mark::Ok => "\u{2713} ",
            Mark::Warn => "\u{26a0} ",
            Mark::Fail => "\u{2717} ",
            Mark::Plain => "  ",
        }
    }
}

/// Command output in the selected format
pub struct Output<W> {
    format: OutputFormat,
    out: W,
}

impl Output<io::Stdout> {
    pub fn stdout(format: OutputFormat) -> Self {
        Self::new(format, io::stdout())
    }
}

impl<W: Write> Output<W> {
    pub fn new(format: OutputFormat, out: W) -> Self {
        Self { format, out }
    }

    pub fn is_json(&self) -> bool {
        self.format.is_json()
    }

    /// Write one marked line
    pub fn line(&mut self, mark: Mark, text: impl Display) -> io::Result<()> {
        if self.is_json() {
            return Ok(());
        }
        writeln!(self.out, "{}{}", mark.prefix(), text)
    }

    /// Write a titled block, each line indented
    pub fn block(&mut self, title: &str, text: &str) -> io::Result<()> {
        if self.is_json() {
            return Ok(());
        }
        writeln!(self.out, "{}:", title)?;
        for line in text.lines() {
            writeln!(self.out, "    {}", line)?;
        }
        Ok(())
    }

    /// Write a pretty-printed JSON document
    pub fn document(&mut self, value: &serde_json::Value) -> io::Result<()> {
        if !self.is_json() {
            return Ok(());
        }
        serde_json::to_writer_pretty(&mut self.out, value)?;
        writeln!(self.out)
    }

    /// Result of handing a report to the daemon.
    ///
    /// A failed attempt has no human line; the caller returns it as an error.
    pub fn disposition(&mut self, disposition: &ReportDisposition, socket: &str) -> io::Result<()> {
        if self.is_json() {
            return self.document(&disposition_json(disposition, socket));
        }
        match disposition {
            ReportDisposition::Skipped(reason) => {
                self.line(Mark::Warn, format_args!("Report not sent: {}", reason))
            }
            ReportDisposition::Attempted(outcome) if outcome.is_delivered() => {
                self.line(Mark::Ok, format_args!("Report delivered to {}", socket))
            }
            ReportDisposition::Attempted(_) => Ok(()),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// JSON description of a disposition
pub fn disposition_json(disposition: &ReportDisposition, socket: &str) -> serde_json::Value {
    match disposition {
        ReportDisposition::Skipped(reason) => serde_json::json!({
            "sent": false,
            "skipped": reason.to_string(),
        }),
        ReportDisposition::Attempted(outcome) => serde_json::json!({
            "sent": true,
            "socket": socket,
            "delivered": outcome.is_delivered(),
            "outcome": outcome.to_string(),
        }),
    }
}
