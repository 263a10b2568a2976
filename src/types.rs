use std::time::Duration;

use crate::errors::{MultitaskError, Result};

/// A command string plus an optional timeout that overrides the
/// orchestrator-wide default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub command: String,
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl From<&str> for CommandSpec {
    fn from(command: &str) -> Self {
        CommandSpec::new(command)
    }
}

impl From<String> for CommandSpec {
    fn from(command: String) -> Self {
        CommandSpec::new(command)
    }
}

/// Map a configured timeout onto the runtime representation.
///
/// A zero budget means "no timeout": the handle is never considered busy.
pub fn effective_timeout(timeout: Duration) -> Option<Duration> {
    if timeout.is_zero() { None } else { Some(timeout) }
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return Err(MultitaskError::InvalidDuration(
            "empty duration string".to_string(),
        ));
    }

    // Find the boundary between digits and suffix.
    let idx = s.chars().position(|c| !c.is_ascii_digit()).ok_or_else(|| {
        MultitaskError::InvalidDuration(format!("'{s}' is missing a unit suffix"))
    })?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part.parse().map_err(|e| {
        MultitaskError::InvalidDuration(format!("invalid number '{num_part}' in '{s}': {e}"))
    })?;
    let unit = unit_part.trim().to_lowercase();

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value * 60)),
        "h" => Ok(Duration::from_secs(value * 60 * 60)),
        _ => Err(MultitaskError::InvalidDuration(format!(
            "unsupported unit '{unit}' in '{s}'; expected ms, s, m, or h"
        ))),
    }
}
