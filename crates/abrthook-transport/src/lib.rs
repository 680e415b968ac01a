//! abrthook Transport - UNIX socket communication with the ABRT daemon
//!
//! Provides [`UnixSocketTransport`], the `ICrashTransport` adapter used in
//! production. Each report opens one [`UnixConnection`], which shuts the
//! socket down when dropped.

pub mod unix;

pub use unix::{UnixConnection, UnixSocketTransport};
