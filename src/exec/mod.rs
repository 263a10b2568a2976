// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running command strings, using
//! `tokio::process::Command`, and exposing each child through a handle that
//! can be drained without waiting.
//!
//! - [`shell`] turns a command string into a piped `Command`.
//! - [`pump`] moves bytes from child pipes into channels in the background.
//! - [`handle`] owns one child: liveness, draining, stdin, timeout, close.

pub mod handle;
pub mod pump;
pub mod shell;

pub use handle::{ClosedProcess, ProcessHandle, ProcessStatus};
pub use shell::Shell;
