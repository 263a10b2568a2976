// src/exec/shell.rs

//! Turning a command string into an OS process invocation.

use std::process::Stdio;

use tokio::process::Command;

/// The program (plus leading arguments) a command string is handed to.
///
/// Defaults to `sh -c` on Unix and `cmd /C` on Windows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shell {
    program: String,
    args: Vec<String>,
}

impl Shell {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build a shell from a `["program", "arg", ...]` list as found in the
    /// job file. Returns `None` for an empty list.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone(), args.to_vec()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Build a `Command` for `command_line` with all three standard streams
    /// piped. The child is killed if its `Child` is dropped.
    pub fn command(&self, command_line: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(command_line)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl Default for Shell {
    fn default() -> Self {
        if cfg!(windows) {
            Shell::new("cmd", vec!["/C".to_string()])
        } else {
            Shell::new("sh", vec!["-c".to_string()])
        }
    }
}
