// src/engine/outcome.rs

//! How each command left the active set.

use std::fmt;
use std::time::Duration;

/// Terminal state of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// stdout reached end-of-stream and the process was reaped.
    ///
    /// `killed` is set when the process was still running once its exit
    /// grace ran out and had to be killed.
    Completed {
        exit_code: Option<i32>,
        killed: bool,
    },
    /// The timeout budget ran out; the process was killed.
    TimedOut {
        elapsed: Duration,
        exit_code: Option<i32>,
    },
    /// The process could not be started.
    SpawnFailed { reason: String },
    /// Waiting on or killing the process failed.
    ReapFailed { reason: String },
    /// Terminated by [`Orchestrator::terminate_all`](crate::engine::Orchestrator::terminate_all).
    Interrupted,
}

impl CommandOutcome {
    /// `true` only for a command that exited by itself with exit code 0.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            CommandOutcome::Completed {
                exit_code: Some(0),
                killed: false,
            }
        )
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, CommandOutcome::TimedOut { .. })
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            CommandOutcome::Completed { exit_code, .. }
            | CommandOutcome::TimedOut { exit_code, .. } => *exit_code,
            _ => None,
        }
    }
}

impl fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandOutcome::Completed { killed: true, .. } => {
                f.write_str("completed (killed after stdout closed)")
            }
            CommandOutcome::Completed {
                exit_code: Some(code),
                ..
            } => write!(f, "completed (exit code {code})"),
            CommandOutcome::Completed {
                exit_code: None, ..
            } => f.write_str("completed (terminated by signal)"),
            CommandOutcome::TimedOut { elapsed, .. } => {
                write!(f, "timed out after {:.1}s", elapsed.as_secs_f64())
            }
            CommandOutcome::SpawnFailed { reason } => write!(f, "failed to start: {reason}"),
            CommandOutcome::ReapFailed { reason } => write!(f, "failed to reap: {reason}"),
            CommandOutcome::Interrupted => f.write_str("interrupted"),
        }
    }
}

/// Everything known about one command after a run, as returned by
/// [`Orchestrator::reports`](crate::engine::Orchestrator::reports).
#[derive(Debug, Clone)]
pub struct CommandReport<K> {
    pub key: K,
    pub command: String,
    pub output: String,
    pub error: String,
    /// `None` while the command is still active.
    pub outcome: Option<CommandOutcome>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(exit_code: Option<i32>, killed: bool) -> CommandOutcome {
        CommandOutcome::Completed { exit_code, killed }
    }

    #[test]
    fn success_requires_zero_exit_code() {
        assert!(completed(Some(0), false).is_success());
        assert!(!completed(Some(1), false).is_success());
        assert!(!completed(None, false).is_success());
        assert!(!completed(Some(0), true).is_success());
        assert!(
            !CommandOutcome::TimedOut {
                elapsed: Duration::from_secs(1),
                exit_code: Some(0),
            }
            .is_success()
        );
    }

    #[test]
    fn display_is_human_readable() {
        let timed_out = CommandOutcome::TimedOut {
            elapsed: Duration::from_millis(1500),
            exit_code: None,
        };
        assert_eq!(timed_out.to_string(), "timed out after 1.5s");
        assert_eq!(completed(Some(2), false).to_string(), "completed (exit code 2)");
        assert_eq!(
            completed(None, false).to_string(),
            "completed (terminated by signal)"
        );
        assert_eq!(
            completed(None, true).to_string(),
            "completed (killed after stdout closed)"
        );
        assert_eq!(
            CommandOutcome::SpawnFailed {
                reason: "no such file".to_string()
            }
            .to_string(),
            "failed to start: no such file"
        );
    }
}
