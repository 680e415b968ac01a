//! The captured error value
//!
//! Anything that can report a message, a kind name and an optional
//! backtrace can be fed to the reporter through [`ErrorSource`]. Host
//! specific errors (panics, `anyhow::Error`, ...) are converted into a
//! [`CapturedError`] by adapters at the boundary where they are caught.

use super::frame::StackFrame;

/// Read-only view of an error being reported
pub trait ErrorSource {
    /// Error message. May contain any character, NUL included.
    fn message(&self) -> &str;

    /// Kind of the error, e.g. a class or type name
    fn kind(&self) -> &str;

    /// Captured frames, most recent call first.
    ///
    /// `None` means no backtrace was recorded, which is distinct from
    /// a recorded but empty backtrace.
    fn backtrace(&self) -> Option<&[StackFrame]>;
}

/// An error captured by an installed handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedError {
    message: String,
    kind: String,
    frames: Option<Vec<StackFrame>>,
}

impl CapturedError {
    /// Create a captured error without a backtrace
    pub fn new(message: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: kind.into(),
            frames: None,
        }
    }

    /// Attach a backtrace
    #[must_use]
    pub fn with_frames<I, F>(mut self, frames: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<StackFrame>,
    {
        self.frames = Some(frames.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the backtrace, `None` marking it as not recorded
    #[must_use]
    pub fn with_backtrace(mut self, frames: Option<Vec<StackFrame>>) -> Self {
        self.frames = frames;
        self
    }
}

impl ErrorSource for CapturedError {
    fn message(&self) -> &str {
        &self.message
    }

    fn kind(&self) -> &str {
        &self.kind
    }

    fn backtrace(&self) -> Option<&[StackFrame]> {
        self.frames.as_deref()
    }
}
