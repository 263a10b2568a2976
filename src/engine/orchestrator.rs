// src/engine/orchestrator.rs

//! Running many commands at once and collecting what they print.
//!
//! The orchestrator spawns every command up front, then repeatedly walks the
//! set of still-active handles:
//!
//! - stdout and stderr are drained into per-key buffers on every pass;
//! - a handle whose stdout reached end-of-stream stays in the set until its
//!   process exits or `exit_grace` runs out, then gets one last drain and is
//!   closed (reaped) as `Completed`;
//! - a handle that outlived its timeout is killed and recorded as `TimedOut`.
//!
//! Retirements are collected during a pass and applied after it, so the
//! active set never changes while it is being walked. No close ever waits
//! on a running child, so one lingering process cannot hold back the
//! timeout checks of the others.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::engine::outcome::{CommandOutcome, CommandReport};
use crate::errors::Result;
use crate::exec::{ProcessHandle, ProcessStatus, Shell};
use crate::types::{CommandSpec, effective_timeout};

/// Knobs for an [`Orchestrator`].
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Default wall-clock budget per command, counted from spawn.
    ///
    /// `None` means no timeout is enforced: a command whose stdout never
    /// closes keeps [`Orchestrator::run`] going forever.
    pub timeout: Option<Duration>,

    /// Sleep between passes that moved no data.
    pub poll_interval: Duration,

    /// How long to wait for a process to exit on its own after its stdout
    /// closed, before it is killed.
    ///
    /// With `Duration::ZERO` a process that has not been reaped by the pass
    /// that sees its end-of-stream is killed and loses its exit code.
    pub exit_grace: Duration,

    pub shell: Shell,
}

impl OrchestratorOptions {
    /// Set the default timeout; `Duration::ZERO` disables it.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = effective_timeout(timeout);
        self
    }
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            poll_interval: Duration::from_millis(10),
            exit_grace: Duration::from_millis(500),
            shell: Shell::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Retirement {
    Finished,
    TimedOut,
}

/// Registry of concurrently running commands keyed by `K`.
#[derive(Debug)]
pub struct Orchestrator<K> {
    commands: BTreeMap<K, CommandSpec>,
    handles: BTreeMap<K, ProcessHandle>,
    outputs: BTreeMap<K, Vec<u8>>,
    errors: BTreeMap<K, Vec<u8>>,
    outcomes: BTreeMap<K, CommandOutcome>,
    /// When each handle's stdout was first seen at end-of-stream.
    eof_since: BTreeMap<K, Instant>,
    options: OrchestratorOptions,
}

impl<K> Orchestrator<K>
where
    K: Ord + Clone + Debug,
{
    /// Spawn every command immediately.
    ///
    /// A command that fails to spawn is recorded as
    /// [`CommandOutcome::SpawnFailed`] and does not affect the others. Must be
    /// called from within a Tokio runtime.
    pub fn new<I, C>(commands: I, options: OrchestratorOptions) -> Self
    where
        I: IntoIterator<Item = (K, C)>,
        C: Into<CommandSpec>,
    {
        let commands: BTreeMap<K, CommandSpec> = commands
            .into_iter()
            .map(|(key, cmd)| (key, cmd.into()))
            .collect();

        let mut handles = BTreeMap::new();
        let mut outputs = BTreeMap::new();
        let mut errors = BTreeMap::new();
        let mut outcomes = BTreeMap::new();

        for (key, spec) in &commands {
            outputs.insert(key.clone(), Vec::new());
            errors.insert(key.clone(), Vec::new());

            let timeout = spec.timeout.map_or(options.timeout, effective_timeout);
            match ProcessHandle::spawn(&spec.command, timeout, &options.shell) {
                Ok(handle) => {
                    handles.insert(key.clone(), handle);
                }
                Err(e) => {
                    error!(
                        key = ?key,
                        command = %spec.command,
                        error = %e,
                        "failed to spawn command"
                    );
                    outcomes.insert(
                        key.clone(),
                        CommandOutcome::SpawnFailed {
                            reason: e.to_string(),
                        },
                    );
                }
            }
        }

        info!(
            commands = commands.len(),
            spawned = handles.len(),
            "orchestrator started"
        );

        Self {
            commands,
            handles,
            outputs,
            errors,
            outcomes,
            eof_since: BTreeMap::new(),
            options,
        }
    }

    /// Spawn every command with a timeout given in whole seconds; `0` means
    /// no timeout.
    pub fn with_timeout_secs<I, C>(commands: I, timeout_secs: u64) -> Self
    where
        I: IntoIterator<Item = (K, C)>,
        C: Into<CommandSpec>,
    {
        let options =
            OrchestratorOptions::default().with_timeout(Duration::from_secs(timeout_secs));
        Self::new(commands, options)
    }

    /// Poll until every command has finished or timed out, then return the
    /// collected stdout text per key.
    pub async fn run(&mut self) -> BTreeMap<K, String> {
        let mut passes: u64 = 0;

        while !self.handles.is_empty() {
            passes += 1;
            if self.poll_pass().await {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(self.options.poll_interval).await;
            }
        }

        debug!(passes, "all commands left the active set");
        self.outputs()
    }

    /// One walk over the active set. Returns whether anything happened.
    async fn poll_pass(&mut self) -> bool {
        let keys: Vec<K> = self.handles.keys().cloned().collect();
        let mut moved = false;
        let mut retiring: Vec<(K, Retirement)> = Vec::new();

        for key in keys {
            let Some(handle) = self.handles.get_mut(&key) else {
                continue;
            };

            let active = handle.is_active();
            let output = handle.listen();
            let error = handle.get_error();
            let busy = active && handle.is_busy();
            let exited = !active
                && !matches!(handle.status(), Ok(ProcessStatus { running: true, .. }));

            moved |= !output.is_empty() || !error.is_empty();
            self.append(&key, &output, &error);

            if !active {
                let since = *self
                    .eof_since
                    .entry(key.clone())
                    .or_insert_with(Instant::now);
                if exited || since.elapsed() >= self.options.exit_grace {
                    retiring.push((key, Retirement::Finished));
                }
            } else if busy {
                retiring.push((key, Retirement::TimedOut));
            }
        }

        moved |= !retiring.is_empty();
        for (key, reason) in retiring {
            self.retire(key, reason).await;
        }

        moved
    }

    async fn retire(&mut self, key: K, reason: Retirement) {
        self.eof_since.remove(&key);
        let Some(handle) = self.handles.remove(&key) else {
            return;
        };

        let elapsed = handle.elapsed();
        if reason == Retirement::TimedOut {
            warn!(
                key = ?key,
                command = %handle.command(),
                elapsed_ms = elapsed.as_millis() as u64,
                "timeout elapsed; terminating command"
            );
        }

        // The exit grace has already been waited out across passes.
        let outcome = match handle.close(Duration::ZERO).await {
            Ok(closed) => {
                self.append(&key, &closed.stdout, &closed.stderr);
                match reason {
                    Retirement::Finished => CommandOutcome::Completed {
                        exit_code: closed.exit_code,
                        killed: closed.killed,
                    },
                    Retirement::TimedOut => CommandOutcome::TimedOut {
                        elapsed,
                        exit_code: closed.exit_code,
                    },
                }
            }
            Err(e) => {
                error!(key = ?key, error = %e, "failed to close command");
                CommandOutcome::ReapFailed {
                    reason: e.to_string(),
                }
            }
        };

        info!(key = ?key, outcome = %outcome, "command left the active set");
        self.outcomes.insert(key, outcome);
    }

    /// Kill and reap every command that is still active, keeping whatever
    /// output they produced. Their outcome becomes
    /// [`CommandOutcome::Interrupted`].
    pub async fn terminate_all(&mut self) {
        let keys: Vec<K> = self.handles.keys().cloned().collect();
        if !keys.is_empty() {
            warn!(active = keys.len(), "terminating all active commands");
        }

        for key in keys {
            let Some(mut handle) = self.handles.remove(&key) else {
                continue;
            };

            let output = handle.listen();
            let error = handle.get_error();
            self.append(&key, &output, &error);

            match handle.close(Duration::ZERO).await {
                Ok(closed) => self.append(&key, &closed.stdout, &closed.stderr),
                Err(e) => warn!(key = ?key, error = %e, "failed to reap interrupted command"),
            }
            self.outcomes.insert(key, CommandOutcome::Interrupted);
        }
        self.eof_since.clear();

        // A `run` future dropped mid-close leaves its key without an outcome.
        for key in self.commands.keys() {
            self.outcomes
                .entry(key.clone())
                .or_insert(CommandOutcome::Interrupted);
        }
    }

    fn append(&mut self, key: &K, output: &[u8], error: &[u8]) {
        if !output.is_empty() {
            if let Some(buf) = self.outputs.get_mut(key) {
                buf.extend_from_slice(output);
            }
        }
        if !error.is_empty() {
            if let Some(buf) = self.errors.get_mut(key) {
                buf.extend_from_slice(error);
            }
        }
    }

    /// Write `text` to the stdin of an active command.
    ///
    /// Returns `false` if the key is not active or the write failed.
    pub async fn tell(&mut self, key: &K, text: &str) -> bool {
        match self.handles.get_mut(key) {
            Some(handle) => handle.tell(text).await,
            None => false,
        }
    }

    /// Close the stdin of an active command. Returns `false` if the key is
    /// not active.
    pub fn close_input(&mut self, key: &K) -> bool {
        match self.handles.get_mut(key) {
            Some(handle) => {
                handle.close_input();
                true
            }
            None => false,
        }
    }

    /// OS status of an active command.
    pub fn status(&mut self, key: &K) -> Option<Result<ProcessStatus>> {
        self.handles.get_mut(key).map(ProcessHandle::status)
    }

    pub fn commands(&self) -> &BTreeMap<K, CommandSpec> {
        &self.commands
    }

    /// Collected stdout per key, decoded as UTF-8 (lossy).
    pub fn outputs(&self) -> BTreeMap<K, String> {
        to_text(&self.outputs)
    }

    /// Collected stderr per key, decoded as UTF-8 (lossy).
    pub fn errors(&self) -> BTreeMap<K, String> {
        to_text(&self.errors)
    }

    pub fn output_bytes(&self, key: &K) -> Option<&[u8]> {
        self.outputs.get(key).map(Vec::as_slice)
    }

    pub fn error_bytes(&self, key: &K) -> Option<&[u8]> {
        self.errors.get(key).map(Vec::as_slice)
    }

    pub fn outcome(&self, key: &K) -> Option<&CommandOutcome> {
        self.outcomes.get(key)
    }

    pub fn outcomes(&self) -> &BTreeMap<K, CommandOutcome> {
        &self.outcomes
    }

    /// Keys whose commands have not yet left the active set.
    pub fn active_keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.handles.keys()
    }

    pub fn is_finished(&self) -> bool {
        self.handles.is_empty()
    }

    /// One report per key, in key order.
    pub fn reports(&self) -> Vec<CommandReport<K>> {
        self.commands
            .iter()
            .map(|(key, spec)| CommandReport {
                key: key.clone(),
                command: spec.command.clone(),
                output: self
                    .output_bytes(key)
                    .map(lossy)
                    .unwrap_or_default(),
                error: self.error_bytes(key).map(lossy).unwrap_or_default(),
                outcome: self.outcomes.get(key).cloned(),
            })
            .collect()
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn to_text<K: Ord + Clone>(buffers: &BTreeMap<K, Vec<u8>>) -> BTreeMap<K, String> {
    buffers
        .iter()
        .map(|(key, bytes)| (key.clone(), lossy(bytes)))
        .collect()
}
