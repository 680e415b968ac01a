//! Exception formatter
//!
//! Renders a captured error the way an interpreter prints an uncaught
//! exception, and works out which executable raised it.

use super::captured_error::ErrorSource;

/// Render the error as a multi-line report.
///
/// The first frame is promoted to the header line
/// (`"<frame>: <message> (<kind>)"`); every other frame follows on its
/// own `"\tfrom <frame>"` line. Without frames the header is just
/// `"<message> (<kind>)"`.
pub fn format(error: &dyn ErrorSource) -> String {
    let frames = error.backtrace().unwrap_or_default();

    let mut lines = Vec::with_capacity(frames.len().max(1));
    match frames.split_first() {
        Some((top, rest)) => {
            lines.push(format!("{top}: {} ({})", error.message(), error.kind()));
            lines.extend(rest.iter().map(|frame| format!("\tfrom {frame}")));
        }
        None => lines.push(format!("{} ({})", error.message(), error.kind())),
    }

    lines.join("\n")
}

/// Path of the executable that raised the error.
///
/// This is the file of the outermost (last) frame. When no backtrace is
/// available, `program_name` is returned instead.
pub fn executable(error: &dyn ErrorSource, program_name: &str) -> String {
    error
        .backtrace()
        .and_then(|frames| frames.last())
        .map(|frame| frame.file().to_string())
        .unwrap_or_else(|| program_name.to_string())
}
