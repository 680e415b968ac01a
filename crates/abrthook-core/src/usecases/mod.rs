//! Use cases (application services)
//!
//! Use cases orchestrate domain logic through port interfaces.
//!
//! - [`ReportCrashUseCase`] - Format, filter, send and log one crash report

pub mod report_crash;

pub use report_crash::{
    PreparedReport, ReportCrashUseCase, ReportDisposition, SkipReason, DAEMON_NAME,
};
