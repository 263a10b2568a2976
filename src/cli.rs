// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `multitask`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "multitask",
    version,
    about = "Run several shell commands concurrently and collect their output.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the job file (TOML).
    ///
    /// Default: `Multitask.toml` in the current working directory.
    #[arg(long, value_name = "PATH")]
    pub jobs: Option<PathBuf>,

    /// Default per-command timeout, e.g. `30s` or `2m`; `0s` disables it.
    ///
    /// Overrides `[config].timeout` from the job file. Per-command timeouts
    /// in the job file still win.
    #[arg(long, value_name = "DURATION")]
    pub timeout: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `MULTITASK_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate the job file and print it, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_flags() {
        let args = CliArgs::try_parse_from([
            "multitask",
            "--jobs",
            "jobs/encode.toml",
            "--timeout",
            "90s",
            "--log-level",
            "debug",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(args.jobs, Some(PathBuf::from("jobs/encode.toml")));
        assert_eq!(args.timeout.as_deref(), Some("90s"));
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
        assert!(args.dry_run);
    }

    #[test]
    fn everything_is_optional() {
        let args = CliArgs::try_parse_from(["multitask"]).unwrap();
        assert!(args.jobs.is_none());
        assert!(args.timeout.is_none());
        assert!(args.log_level.is_none());
        assert!(!args.dry_run);
    }
}
