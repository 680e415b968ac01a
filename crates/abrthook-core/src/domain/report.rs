//! Crash report model
//!
//! A report is an ordered set of fixed fields. Every value is sanitized
//! when the report is built: the wire format terminates fields with a NUL
//! byte, so a NUL inside a message or a frame could otherwise smuggle in
//! extra fields.

use std::fmt::{self, Display, Formatter};

/// Field terminator of the wire format
pub const FIELD_TERMINATOR: char = '\0';

/// Names of the report fields, in wire order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportField {
    Pid,
    Executable,
    Analyzer,
    Type,
    Basename,
    Reason,
    Backtrace,
}

impl ReportField {
    /// All fields in the order they are sent
    pub const ALL: [ReportField; 7] = [
        ReportField::Pid,
        ReportField::Executable,
        ReportField::Analyzer,
        ReportField::Type,
        ReportField::Basename,
        ReportField::Reason,
        ReportField::Backtrace,
    ];

    /// Wire name of the field
    pub const fn as_str(&self) -> &'static str {
        match self {
            ReportField::Pid => "PID",
            ReportField::Executable => "EXECUTABLE",
            ReportField::Analyzer => "ANALYZER",
            ReportField::Type => "TYPE",
            ReportField::Basename => "BASENAME",
            ReportField::Reason => "REASON",
            ReportField::Backtrace => "BACKTRACE",
        }
    }
}

impl Display for ReportField {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A crash report ready to be encoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    values: [String; 7],
}

impl Report {
    /// Build a report for one crash.
    ///
    /// `analyzer` fills both `ANALYZER` and `TYPE`. `REASON` is the first
    /// line of `rendered`, `BACKTRACE` the whole of it.
    pub fn new(
        pid: u32,
        executable: &str,
        analyzer: &str,
        basename: &str,
        rendered: &str,
    ) -> Self {
        let reason = rendered.lines().next().unwrap_or_default();
        Self {
            values: [
                pid.to_string(),
                sanitize(executable),
                sanitize(analyzer),
                sanitize(analyzer),
                sanitize(basename),
                sanitize(reason),
                sanitize(rendered),
            ],
        }
    }

    /// Value of a single field
    pub fn get(&self, field: ReportField) -> &str {
        &self.values[field as usize]
    }

    /// Fields with their values, in wire order
    pub fn fields(&self) -> impl Iterator<Item = (ReportField, &str)> {
        ReportField::ALL
            .iter()
            .zip(self.values.iter())
            .map(|(field, value)| (*field, value.as_str()))
    }
}

/// Remove every field terminator from an untrusted value.
pub fn sanitize(value: &str) -> String {
    value.replace(FIELD_TERMINATOR, "")
}
