#![allow(dead_code)]

use std::collections::BTreeMap;

use multitask::config::{ConfigSection, JobFile, RawCommand, RawJobFile};

/// Builder for `JobFile` to simplify test setup.
pub struct JobFileBuilder {
    jobs: RawJobFile,
}

impl JobFileBuilder {
    pub fn new() -> Self {
        Self {
            jobs: RawJobFile {
                config: ConfigSection::default(),
                command: BTreeMap::new(),
            },
        }
    }

    pub fn with_command(mut self, name: &str, cmd: &str) -> Self {
        self.jobs
            .command
            .insert(name.to_string(), RawCommand::Plain(cmd.to_string()));
        self
    }

    pub fn with_timed_command(mut self, name: &str, cmd: &str, timeout: &str) -> Self {
        self.jobs.command.insert(
            name.to_string(),
            RawCommand::Detailed {
                cmd: cmd.to_string(),
                timeout: Some(timeout.to_string()),
            },
        );
        self
    }

    pub fn timeout(mut self, timeout: &str) -> Self {
        self.jobs.config.timeout = timeout.to_string();
        self
    }

    pub fn poll_interval(mut self, interval: &str) -> Self {
        self.jobs.config.poll_interval = interval.to_string();
        self
    }

    pub fn shell(mut self, argv: &[&str]) -> Self {
        self.jobs.config.shell = Some(argv.iter().map(|s| s.to_string()).collect());
        self
    }

    /// The unvalidated job file, for tests that exercise validation errors.
    pub fn build_raw(self) -> RawJobFile {
        self.jobs
    }

    pub fn build(self) -> JobFile {
        JobFile::try_from(self.jobs).expect("Failed to build valid job file from builder")
    }
}

impl Default for JobFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
