// src/exec/pump.rs

//! Background readers for child pipes.
//!
//! Each read pipe of a child gets one Tokio task that copies whatever the
//! child writes into an unbounded channel. The owning handle drains that
//! channel with `try_recv`, so a drain never waits for the child. Once the
//! pipe reports end-of-stream the task exits, the sender is dropped, and the
//! channel reports `Disconnected` after the last chunk has been consumed.
//!
//! Because the pump always keeps reading, a child can never stall on a full
//! OS pipe buffer, no matter how rarely the handle is drained.

use std::fmt;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

const CHUNK_SIZE: usize = 8 * 1024;

/// Which standard stream a pump is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Stdout => f.write_str("stdout"),
            StreamKind::Stderr => f.write_str("stderr"),
        }
    }
}

#[derive(Debug)]
pub struct StreamPump {
    kind: StreamKind,
    label: String,
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
    task: Option<JoinHandle<()>>,
    eof: bool,
}

impl StreamPump {
    /// Start pumping `reader` in a background task.
    ///
    /// `label` is only used for log fields.
    pub fn spawn<R>(reader: R, kind: StreamKind, label: impl Into<String>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let label = label.into();
        let (tx, rx) = mpsc::unbounded_channel::<Vec<u8>>();

        let task_label = label.clone();
        let task = tokio::spawn(async move {
            let mut reader = reader;
            let mut buf = vec![0u8; CHUNK_SIZE];

            loop {
                match reader.read(&mut buf).await {
                    Ok(0) => break,
                    Ok(n) => {
                        trace!(command = %task_label, stream = %kind, bytes = n, "read chunk");
                        if tx.send(buf[..n].to_vec()).is_err() {
                            // Receiver gone: the handle was closed or dropped.
                            break;
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        warn!(
                            command = %task_label,
                            stream = %kind,
                            error = %e,
                            "pipe read failed; treating as end of stream"
                        );
                        break;
                    }
                }
            }

            debug!(command = %task_label, stream = %kind, "pump reached end of stream");
        });

        Self {
            kind,
            label,
            rx,
            task: Some(task),
            eof: false,
        }
    }

    /// Move every chunk that is available right now into `buf`.
    ///
    /// Returns the number of bytes appended. Never waits.
    pub fn drain_into(&mut self, buf: &mut Vec<u8>) -> usize {
        let mut appended = 0;
        loop {
            match self.rx.try_recv() {
                Ok(chunk) => {
                    appended += chunk.len();
                    buf.extend_from_slice(&chunk);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.eof = true;
                    break;
                }
            }
        }
        appended
    }

    /// Whether the pipe has reached end-of-stream and every chunk has been
    /// drained. Only updated by [`drain_into`](Self::drain_into).
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Wait up to `window` for the pump to hit end-of-stream, then return
    /// everything still queued.
    ///
    /// Used after the child has been reaped. A pipe that stays open past the
    /// window (typically held by a grandchild) is abandoned.
    pub async fn finish(mut self, window: Duration) -> Vec<u8> {
        if let Some(task) = self.task.take() {
            let abort = task.abort_handle();
            if tokio::time::timeout(window, task).await.is_err() {
                debug!(
                    command = %self.label,
                    stream = %self.kind,
                    "pipe still open after child exit; abandoning pump"
                );
                abort.abort();
            }
        }

        let mut rest = Vec::new();
        self.drain_into(&mut rest);
        rest
    }
}

impl Drop for StreamPump {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
