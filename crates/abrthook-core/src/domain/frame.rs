//! Backtrace frames
//!
//! A frame is kept as the location string it was captured as
//! (`file:line:in 'method'`). The file path is recovered on demand.

use std::fmt::{self, Display, Formatter};

/// A single backtrace entry, e.g. `/foo/bar.rb:3:in 'block in func'`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StackFrame(String);

impl StackFrame {
    /// Wrap an already formatted location string
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    /// Build a location from its parts.
    ///
    /// Without a line number the location reads `file:in 'method'`.
    pub fn from_parts(file: &str, line: Option<u32>, method: &str) -> Self {
        match line {
            Some(line) => Self(format!("{file}:{line}:in '{method}'")),
            None => Self(format!("{file}:in '{method}'")),
        }
    }

    /// The full location string
    pub fn location(&self) -> &str {
        &self.0
    }

    /// The file path segment, with the `:line:in '...'` suffix stripped.
    ///
    /// A location without any recognisable suffix is returned whole.
    pub fn file(&self) -> &str {
        let location = self.0.as_str();
        for (idx, _) in location.match_indices(':') {
            if is_location_suffix(&location[idx + 1..]) {
                return &location[..idx];
            }
        }
        location
    }
}

/// Whether `rest` (the text after a `:`) starts a `line[:in ...]` or `in ...` suffix.
fn is_location_suffix(rest: &str) -> bool {
    if rest.starts_with("in ") {
        return true;
    }
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return false;
    }
    let after = &rest[digits..];
    after.is_empty() || after.starts_with(':')
}

impl Display for StackFrame {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for StackFrame {
    fn from(location: String) -> Self {
        Self(location)
    }
}

impl From<&str> for StackFrame {
    fn from(location: &str) -> Self {
        Self(location.to_string())
    }
}
