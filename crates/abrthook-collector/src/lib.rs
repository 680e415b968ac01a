//! abrthook Collector - A stand-in for the ABRT daemon
//!
//! Listens on a UNIX socket, decodes each crash report request and answers
//! with a fixed HTTP status. Meant for exercising the reporting path on
//! machines without ABRT.

pub mod collector;

pub use collector::{Collector, ReceivedReport, DEFAULT_MAX_REQUEST_BYTES, DEFAULT_STATUS};
