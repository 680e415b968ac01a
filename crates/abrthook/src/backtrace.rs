//! Rust backtrace parsing
//!
//! Turns the text of a `std::backtrace::Backtrace` into stack frames:
//!
//! ```text
//!    0: app::lookup
//!              at ./src/lib.rs:10:5
//!    1: app::main
//!              at ./src/main.rs:4:5
//!    2: <unknown>
//! ```
//!
//! Only the frames std itself would show in a short backtrace are kept:
//! the panic machinery above `__rust_end_short_backtrace` and the runtime
//! below `__rust_begin_short_backtrace` are dropped. Leading frames of the
//! capture itself (std's backtrace code, this crate's adapters, `anyhow`
//! constructors) are dropped too, so the first frame is the caller's. The
//! outermost frame is always the program's entry point, attributed to the
//! binary.

use std::backtrace::{Backtrace, BacktraceStatus};

use abrthook_core::domain::StackFrame;

/// Marker frame closing the panic machinery
const END_SHORT_BACKTRACE: &str = "__rust_end_short_backtrace";

/// Marker frame opening the runtime start-up code
const BEGIN_SHORT_BACKTRACE: &str = "__rust_begin_short_backtrace";

/// Method name of the synthetic entry-point frame
pub const ENTRY_POINT: &str = "<main>";

/// A symbol parsed out of backtrace text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub symbol: String,
    pub file: Option<String>,
    pub line: Option<u32>,
}

/// Parse the `Display` output of a backtrace.
///
/// Inlined symbols, printed without an index, become frames of their own.
pub fn parse_backtrace_text(text: &str) -> Vec<RawFrame> {
    let mut frames: Vec<RawFrame> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(location) = line.strip_prefix("at ") {
            if let Some(frame) = frames.last_mut().filter(|f| f.file.is_none()) {
                let (file, line) = parse_location(location);
                frame.file = Some(file);
                frame.line = line;
            }
            continue;
        }

        let symbol = match line.split_once(": ") {
            Some((index, rest)) if index.bytes().all(|b| b.is_ascii_digit()) => rest,
            _ => line,
        };
        frames.push(RawFrame {
            symbol: strip_symbol_hash(symbol.trim()).to_string(),
            file: None,
            line: None,
        });
    }

    frames
}

/// Split `path:line:column` into the path and the line.
fn parse_location(location: &str) -> (String, Option<u32>) {
    let mut parts = location.rsplitn(3, ':');
    let last = parts.next();
    let middle = parts.next();
    let first = parts.next();

    match (first, middle, last) {
        (Some(file), Some(line), Some(column))
            if line.parse::<u32>().is_ok() && column.parse::<u32>().is_ok() =>
        {
            (file.to_string(), line.parse().ok())
        }
        _ => match location.rsplit_once(':') {
            Some((file, line)) if line.parse::<u32>().is_ok() => {
                (file.to_string(), line.parse().ok())
            }
            _ => (location.to_string(), None),
        },
    }
}

/// Drop the `::h0123456789abcdef` disambiguator of a symbol name.
fn strip_symbol_hash(symbol: &str) -> &str {
    match symbol.rsplit_once("::h") {
        Some((name, hash))
            if hash.len() == 16 && hash.bytes().all(|b| b.is_ascii_hexdigit()) =>
        {
            name
        }
        _ => symbol,
    }
}

/// Whether a frame belongs to the code that starts a panic.
fn is_panic_entry(symbol: &str) -> bool {
    symbol.ends_with("rust_begin_unwind")
        || symbol.starts_with("core::panicking::")
        || symbol.starts_with("std::panicking::begin_panic")
}

/// Symbol prefixes of code that records a backtrace on behalf of the caller
const CAPTURE_PREFIXES: &[&str] = &[
    "std::backtrace::",
    "std::backtrace_rs::",
    "abrthook::backtrace::",
    "abrthook::capture::",
    "abrthook::hook::",
    "anyhow::",
    "<anyhow::",
];

/// Whether a frame belongs to the code capturing the backtrace.
fn is_capture_frame(symbol: &str) -> bool {
    CAPTURE_PREFIXES
        .iter()
        .any(|prefix| symbol.starts_with(prefix))
        || symbol.contains(" as anyhow::")
        // `?` converting into `anyhow::Error`
        || (symbol.starts_with("<core::result::Result<") && symbol.contains("FromResidual"))
}

/// Drop the leading frames recorded by the capture itself.
pub fn skip_capture_frames(mut frames: Vec<RawFrame>) -> Vec<RawFrame> {
    let skipped = frames
        .iter()
        .take_while(|f| is_capture_frame(&f.symbol))
        .count();
    frames.drain(..skipped);
    frames
}

/// Keep the frames std shows in a short backtrace.
pub fn short_frames(frames: Vec<RawFrame>) -> Vec<RawFrame> {
    let start = frames
        .iter()
        .position(|f| f.symbol.contains(END_SHORT_BACKTRACE))
        .map(|idx| {
            let skipped = frames[idx + 1..]
                .iter()
                .take_while(|f| is_panic_entry(&f.symbol))
                .count();
            idx + 1 + skipped
        })
        .unwrap_or(0);

    let end = frames[start..]
        .iter()
        .position(|f| f.symbol.contains(BEGIN_SHORT_BACKTRACE))
        .map_or(frames.len(), |idx| start + idx);

    frames[start..end].to_vec()
}

/// Convert parsed frames into stack frames, ending with the entry point.
///
/// Frames without a resolved source file are attributed to `binary`.
pub fn to_stack_frames(frames: &[RawFrame], binary: &str) -> Vec<StackFrame> {
    frames
        .iter()
        .map(|frame| match &frame.file {
            Some(file) => StackFrame::from_parts(file, frame.line, &frame.symbol),
            None => StackFrame::from_parts(binary, None, &frame.symbol),
        })
        .chain(std::iter::once(StackFrame::from_parts(
            binary,
            None,
            ENTRY_POINT,
        )))
        .collect()
}

/// Stack frames of a captured backtrace, `None` when nothing was captured.
pub fn stack_frames(backtrace: &Backtrace, binary: &str) -> Option<Vec<StackFrame>> {
    if backtrace.status() != BacktraceStatus::Captured {
        return None;
    }
    let parsed = parse_backtrace_text(&backtrace.to_string());
    let frames = skip_capture_frames(short_frames(parsed));
    Some(to_stack_frames(&frames, binary))
}
