// src/exec/handle.rs

//! A single spawned command and its three standard streams.

use std::time::{Duration, Instant};

use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin};
use tracing::{debug, info, warn};

use crate::errors::{MultitaskError, Result};
use crate::exec::pump::{StreamKind, StreamPump};
use crate::exec::shell::Shell;

/// How long the pumps get to flush once the child has been reaped.
const PUMP_FLUSH_WINDOW: Duration = Duration::from_millis(100);

/// OS-level view of a running or finished child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessStatus {
    pub pid: Option<u32>,
    pub running: bool,
    pub exit_code: Option<i32>,
}

/// What is left of a handle after [`ProcessHandle::close`].
///
/// `stdout` and `stderr` carry the bytes that arrived after the last
/// `listen` / `get_error` call, so nothing the child wrote is lost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedProcess {
    pub exit_code: Option<i32>,
    pub killed: bool,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Owned handle to one child process.
///
/// - stdout is the liveness channel: it is drained on every
///   [`is_active`](Self::is_active) call and buffered until
///   [`listen`](Self::listen) hands it out.
/// - stderr is only drained on request via [`get_error`](Self::get_error).
/// - [`close`](Self::close) consumes the handle, so nothing can touch the
///   process after it has been reaped.
#[derive(Debug)]
pub struct ProcessHandle {
    command: String,
    child: Child,
    pid: Option<u32>,
    stdin: Option<ChildStdin>,
    stdout: StreamPump,
    stderr: StreamPump,
    pending_output: Vec<u8>,
    started_at: Instant,
    timeout: Option<Duration>,
}

impl ProcessHandle {
    /// Start `command` through `shell` with all three streams piped.
    ///
    /// `timeout` is the wall-clock budget used by [`is_busy`](Self::is_busy);
    /// `None` means the handle never becomes busy. Must be called from within
    /// a Tokio runtime.
    pub fn spawn(command: &str, timeout: Option<Duration>, shell: &Shell) -> Result<Self> {
        let spawn_err = |source: std::io::Error| MultitaskError::Spawn {
            command: command.to_string(),
            source,
        };

        let mut child = shell.command(command).spawn().map_err(spawn_err)?;

        let missing_pipe = |name: &str| {
            spawn_err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                format!("child {name} was not captured"),
            ))
        };
        let stdin = child.stdin.take().ok_or_else(|| missing_pipe("stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| missing_pipe("stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| missing_pipe("stderr"))?;

        let pid = child.id();
        info!(pid = ?pid, command = %command, timeout = ?timeout, "spawned process");

        Ok(Self {
            command: command.to_string(),
            pid,
            stdin: Some(stdin),
            stdout: StreamPump::spawn(stdout, StreamKind::Stdout, command),
            stderr: StreamPump::spawn(stderr, StreamKind::Stderr, command),
            child,
            pending_output: Vec::new(),
            started_at: Instant::now(),
            timeout,
        })
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Whether stdout is still open.
    ///
    /// Buffers any stdout that is available first, so checking liveness never
    /// drops data. The answer is about the stream, not the process: a child
    /// that closed stdout but keeps running counts as inactive.
    pub fn is_active(&mut self) -> bool {
        self.stdout.drain_into(&mut self.pending_output);
        !self.stdout.is_eof()
    }

    /// Hand out and clear all stdout collected so far. Never waits.
    pub fn listen(&mut self) -> Vec<u8> {
        self.stdout.drain_into(&mut self.pending_output);
        std::mem::take(&mut self.pending_output)
    }

    /// Return the stderr bytes available right now. Nothing is kept between
    /// calls.
    pub fn get_error(&mut self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.stderr.drain_into(&mut buf);
        buf
    }

    /// Write `text` to the child's stdin.
    ///
    /// Best effort: returns `false` if stdin is closed or the write failed.
    /// After a failed write stdin is dropped and later calls are no-ops.
    pub async fn tell(&mut self, text: &str) -> bool {
        let Some(stdin) = self.stdin.as_mut() else {
            debug!(
                pid = ?self.pid,
                command = %self.command,
                "stdin already closed; dropping input"
            );
            return false;
        };

        let written = match stdin.write_all(text.as_bytes()).await {
            Ok(()) => stdin.flush().await,
            Err(e) => Err(e),
        };

        match written {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    pid = ?self.pid,
                    command = %self.command,
                    error = %e,
                    "failed to write to child stdin"
                );
                self.stdin = None;
                false
            }
        }
    }

    /// Close the child's stdin so it sees end-of-input.
    pub fn close_input(&mut self) {
        if self.stdin.take().is_some() {
            debug!(pid = ?self.pid, command = %self.command, "closed child stdin");
        }
    }

    /// Whether the wall-clock budget has been used up.
    pub fn is_busy(&self) -> bool {
        self.timeout
            .is_some_and(|timeout| self.started_at.elapsed() > timeout)
    }

    /// Query the OS for the child's state.
    pub fn status(&mut self) -> Result<ProcessStatus> {
        let exited = self.child.try_wait()?;
        Ok(ProcessStatus {
            pid: self.pid,
            running: exited.is_none(),
            exit_code: exited.and_then(|status| status.code()),
        })
    }

    /// Terminate and reap the child.
    ///
    /// Waits up to `grace` for the child to exit by itself, kills it if it is
    /// still running, then waits for the OS to reap it. Pass
    /// `Duration::ZERO` to kill straight away.
    pub async fn close(mut self, grace: Duration) -> Result<ClosedProcess> {
        self.stdin = None;

        let exited = if grace.is_zero() {
            self.child.try_wait()?
        } else {
            match tokio::time::timeout(grace, self.child.wait()).await {
                Ok(status) => Some(status?),
                Err(_) => None,
            }
        };

        let (status, killed) = match exited {
            Some(status) => (status, false),
            None => {
                debug!(pid = ?self.pid, command = %self.command, "killing child");
                self.child.kill().await?;
                (self.child.wait().await?, true)
            }
        };

        let mut stdout = std::mem::take(&mut self.pending_output);
        stdout.extend(self.stdout.finish(PUMP_FLUSH_WINDOW).await);
        let stderr = self.stderr.finish(PUMP_FLUSH_WINDOW).await;

        let exit_code = status.code();
        info!(
            pid = ?self.pid,
            command = %self.command,
            exit_code = ?exit_code,
            killed,
            elapsed_ms = self.started_at.elapsed().as_millis() as u64,
            "process closed"
        );

        Ok(ClosedProcess {
            exit_code,
            killed,
            stdout,
            stderr,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    async fn wait_until_inactive(handle: &mut ProcessHandle) {
        for _ in 0..500 {
            if !handle.is_active() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("stdout never reached end of stream");
    }

    #[tokio::test]
    async fn listen_drains_and_clears() {
        let mut handle = ProcessHandle::spawn("printf abc", None, &Shell::default()).unwrap();
        wait_until_inactive(&mut handle).await;

        assert_eq!(handle.listen(), b"abc");
        assert!(handle.listen().is_empty());

        let closed = handle.close(Duration::from_secs(1)).await.unwrap();
        assert_eq!(closed.exit_code, Some(0));
        assert!(!closed.killed);
        assert!(closed.stdout.is_empty());
    }

    #[tokio::test]
    async fn stderr_is_not_buffered_by_liveness_checks() {
        let mut handle =
            ProcessHandle::spawn("printf oops >&2", None, &Shell::default()).unwrap();
        wait_until_inactive(&mut handle).await;
        // Give stderr's pump a moment; it is independent of stdout.
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(handle.listen().is_empty());
        assert_eq!(handle.get_error(), b"oops");
        assert!(handle.get_error().is_empty());
        handle.close(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn busy_only_after_budget_elapses() {
        let handle = ProcessHandle::spawn(
            "sleep 5",
            Some(Duration::from_millis(100)),
            &Shell::default(),
        )
        .unwrap();
        assert!(!handle.is_busy());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(handle.is_busy());

        let closed = handle.close(Duration::ZERO).await.unwrap();
        assert!(closed.killed);
    }

    #[tokio::test]
    async fn no_budget_never_busy() {
        let handle = ProcessHandle::spawn("sleep 5", None, &Shell::default()).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!handle.is_busy());
        handle.close(Duration::ZERO).await.unwrap();
    }

    #[tokio::test]
    async fn status_reports_running_then_exit_code() {
        let mut handle = ProcessHandle::spawn("exit 3", None, &Shell::default()).unwrap();
        assert!(handle.pid().is_some());

        let mut status = handle.status().unwrap();
        for _ in 0..500 {
            if !status.running {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            status = handle.status().unwrap();
        }

        assert!(!status.running);
        assert_eq!(status.exit_code, Some(3));
        assert_eq!(status.pid, handle.pid());

        let closed = handle.close(Duration::from_secs(1)).await.unwrap();
        assert_eq!(closed.exit_code, Some(3));
    }

    #[tokio::test]
    async fn tell_feeds_stdin() {
        let mut handle = ProcessHandle::spawn("cat", None, &Shell::default()).unwrap();
        assert!(handle.tell("ping\n").await);
        handle.close_input();
        assert!(!handle.tell("late").await);

        wait_until_inactive(&mut handle).await;
        assert_eq!(handle.listen(), b"ping\n");
        handle.close(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn tell_to_an_exited_child_fails_and_drops_stdin() {
        let mut handle = ProcessHandle::spawn("exit 0", None, &Shell::default()).unwrap();
        wait_until_inactive(&mut handle).await;

        // Broken pipe: nobody is reading any more.
        assert!(!handle.tell("x").await);
        assert!(handle.stdin.is_none());
        assert!(!handle.tell("again").await);

        let closed = handle.close(Duration::from_secs(1)).await.unwrap();
        assert_eq!(closed.exit_code, Some(0));
    }

    #[tokio::test]
    async fn close_returns_output_not_yet_listened_to() {
        let mut handle =
            ProcessHandle::spawn("printf out; printf err >&2", None, &Shell::default()).unwrap();
        wait_until_inactive(&mut handle).await;

        let closed = handle.close(Duration::from_secs(1)).await.unwrap();
        assert_eq!(closed.stdout, b"out");
        assert_eq!(closed.stderr, b"err");
    }

    #[tokio::test]
    async fn spawn_failure_is_reported() {
        let shell = Shell::new("/definitely/not/a/shell", vec!["-c".to_string()]);
        let err = ProcessHandle::spawn("echo hi", None, &shell).unwrap_err();
        assert!(matches!(err, MultitaskError::Spawn { ref command, .. } if command == "echo hi"));
    }
}
