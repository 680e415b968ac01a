//! abrthook Core - Crash report formatting and reporting policy
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain** - `StackFrame`, `CapturedError`, `Report`, the exception formatter
//!   and the ABRT wire protocol (`encode_request`, `parse_request`, `classify_response`)
//! - **Use cases** - `ReportCrashUseCase`, the crash reporter pipeline
//! - **Port definitions** - Traits for adapters: `ILogSink`, `ICrashTransport`, `IConnection`
//! - **Configuration** - YAML configuration with validation and a builder
//!
//! # Architecture
//!
//! The domain module is pure: it never touches sockets or the system log.
//! Ports define the trait interfaces that the transport and facade crates
//! implement. The use case drives a single report through those ports.

pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;
