//! abrthook - Report Rust crashes to the ABRT daemon
//!
//! Provides:
//! - `CrashHook`: panic hook and explicit error reporting
//! - `capture_*`: conversion of panics and errors into captured errors
//! - `backtrace`: stack frames from `std::backtrace::Backtrace`
//! - `SyslogSink` / `TracingSink` / `MemorySink`: log sink adapters
//!
//! ```no_run
//! fn main() {
//!     abrthook::install_crash_hook();
//!     // ...
//! }
//! ```

pub mod backtrace;
pub mod capture;
pub mod hook;
pub mod sinks;

pub use capture::{capture_anyhow, capture_error, capture_panic, panic_message};
pub use hook::{install_crash_hook, resolve_program_name, CrashHook};
pub use sinks::{sink_from_config, MemorySink, SyslogSink, TracingSink};
