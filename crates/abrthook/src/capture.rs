//! Adapters from Rust errors to `CapturedError`
//!
//! A panic is Rust's unhandled error: its payload becomes the message and
//! the kind is `panic`. `anyhow::Error` values reported explicitly keep
//! their whole context chain in the message.

use std::any::Any;
use std::backtrace::Backtrace;
use std::panic::Location;

use abrthook_core::domain::CapturedError;

use crate::backtrace::stack_frames;

/// Kind reported for panics
pub const PANIC_KIND: &str = "panic";

/// Kind reported for `anyhow::Error` values
pub const ERROR_KIND: &str = "error";

/// Message of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}

/// Capture a panic.
///
/// When no backtrace could be recorded, the panic location is appended to
/// the message so that it is not lost.
pub fn capture_panic(
    payload: &(dyn Any + Send),
    location: Option<&Location<'_>>,
    backtrace: &Backtrace,
    binary: &str,
) -> CapturedError {
    let frames = stack_frames(backtrace, binary);
    let mut message = panic_message(payload);
    if frames.is_none() {
        if let Some(location) = location {
            message = format!("{message} at {location}");
        }
    }
    CapturedError::new(message, PANIC_KIND).with_backtrace(frames)
}

/// Capture an `anyhow::Error` with its own backtrace.
pub fn capture_anyhow(error: &anyhow::Error, binary: &str) -> CapturedError {
    let frames = stack_frames(error.backtrace(), binary);
    CapturedError::new(format!("{error:#}"), ERROR_KIND).with_backtrace(frames)
}

/// Capture any `std::error::Error`, recording the current stack.
pub fn capture_error<E>(error: &E, binary: &str) -> CapturedError
where
    E: std::error::Error + ?Sized,
{
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    let frames = stack_frames(&Backtrace::force_capture(), binary);
    CapturedError::new(message, ERROR_KIND).with_backtrace(frames)
}

#[cfg(test)]
mod tests {
    use abrthook_core::domain::ErrorSource;

    use super::*;

    #[test]
    fn test_panic_message_from_str() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
    }

    #[test]
    fn test_panic_message_from_string() {
        let payload: Box<dyn Any + Send> = Box::new(String::from("boom 42"));
        assert_eq!(panic_message(payload.as_ref()), "boom 42");
    }

    #[test]
    fn test_panic_message_unknown_payload() {
        let payload: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(payload.as_ref()), "Box<dyn Any>");
    }

    #[test]
    fn test_capture_panic_without_backtrace_keeps_location() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        let location = Location::caller();
        let captured = capture_panic(
            payload.as_ref(),
            Some(location),
            &Backtrace::disabled(),
            "/usr/bin/app",
        );
        assert_eq!(captured.kind(), "panic");
        assert!(captured.backtrace().is_none());
        assert!(captured.message().starts_with("boom at "));
        assert!(captured.message().contains("capture.rs"));
    }

    #[test]
    fn test_capture_panic_with_backtrace_ends_at_binary() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        let captured = capture_panic(
            payload.as_ref(),
            None,
            &Backtrace::force_capture(),
            "/usr/bin/app",
        );
        assert_eq!(captured.message(), "boom");
        // Capture may be unsupported on the build platform.
        if let Some(frames) = captured.backtrace() {
            assert_eq!(frames.last().unwrap().file(), "/usr/bin/app");
        }
    }

    #[derive(Debug)]
    struct WriteFailed(std::io::Error);

    impl std::fmt::Display for WriteFailed {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "writing journal")
        }
    }

    impl std::error::Error for WriteFailed {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_capture_error_includes_sources() {
        let err = WriteFailed(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        let captured = capture_error(&err, "/usr/bin/app");
        assert_eq!(captured.kind(), "error");
        assert_eq!(captured.message(), "writing journal: disk full");
    }

    #[test]
    fn test_capture_anyhow_uses_context_chain() {
        let err = anyhow::anyhow!("connection reset").context("syncing journal");
        let captured = capture_anyhow(&err, "/usr/bin/app");
        assert_eq!(captured.message(), "syncing journal: connection reset");
        assert_eq!(captured.kind(), "error");
    }
}
