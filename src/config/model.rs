// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::engine::OrchestratorOptions;
use crate::exec::Shell;
use crate::types::CommandSpec;

/// Job file exactly as read from TOML, before validation.
///
/// ```toml
/// [config]
/// timeout = "120s"
/// poll_interval = "10ms"
/// exit_grace = "500ms"
/// shell = ["sh", "-c"]
///
/// [command]
/// first = "ffmpeg -i in.mp4 out.webm 2>&1"
/// second = { cmd = "sleep 10", timeout = "1s" }
/// ```
///
/// Every section is optional at this stage; [`JobFile::try_from`] rejects a
/// file without commands.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawJobFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// Keys are the command names used to label results.
    #[serde(default)]
    pub command: BTreeMap<String, RawCommand>,
}

/// `[config]` section. Durations are kept as strings here and parsed during
/// validation.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Default budget per command; `"0s"` disables the timeout.
    #[serde(default = "default_timeout")]
    pub timeout: String,

    /// Idle sleep between polling passes.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,

    /// How long to wait for a command to exit after its stdout closed.
    /// Must be non-zero, otherwise commands still exiting would be killed.
    #[serde(default = "default_exit_grace")]
    pub exit_grace: String,

    /// Program and leading arguments used to run each command, e.g.
    /// `["bash", "-c"]`. Platform default when absent.
    #[serde(default)]
    pub shell: Option<Vec<String>>,
}

fn default_timeout() -> String {
    "0s".to_string()
}

fn default_poll_interval() -> String {
    "10ms".to_string()
}

fn default_exit_grace() -> String {
    "500ms".to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            poll_interval: default_poll_interval(),
            exit_grace: default_exit_grace(),
            shell: None,
        }
    }
}

/// One `[command]` entry: either a bare command string or a table with a
/// per-command timeout.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RawCommand {
    Plain(String),
    Detailed {
        cmd: String,
        #[serde(default)]
        timeout: Option<String>,
    },
}

impl RawCommand {
    pub fn cmd(&self) -> &str {
        match self {
            RawCommand::Plain(cmd) => cmd,
            RawCommand::Detailed { cmd, .. } => cmd,
        }
    }
}

/// Validated `[config]` section.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// `None` when the configured timeout is zero.
    pub timeout: Option<Duration>,
    pub poll_interval: Duration,
    pub exit_grace: Duration,
    pub shell: Shell,
}

/// A job file that passed validation.
///
/// Only constructible through `TryFrom<RawJobFile>` (see `validate.rs`).
#[derive(Debug, Clone)]
pub struct JobFile {
    pub config: RunConfig,
    pub commands: BTreeMap<String, CommandSpec>,
}

impl JobFile {
    pub(crate) fn new_unchecked(
        config: RunConfig,
        commands: BTreeMap<String, CommandSpec>,
    ) -> Self {
        Self { config, commands }
    }

    /// Options for an orchestrator running this job file.
    pub fn orchestrator_options(&self) -> OrchestratorOptions {
        OrchestratorOptions {
            timeout: self.config.timeout,
            poll_interval: self.config.poll_interval,
            exit_grace: self.config.exit_grace,
            shell: self.config.shell.clone(),
        }
    }
}
