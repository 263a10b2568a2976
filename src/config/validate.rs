// src/config/validate.rs

use std::collections::BTreeMap;

use crate::config::model::{ConfigSection, JobFile, RawCommand, RawJobFile, RunConfig};
use crate::errors::{MultitaskError, Result};
use crate::exec::Shell;
use crate::types::{CommandSpec, effective_timeout, parse_duration};

impl TryFrom<RawJobFile> for JobFile {
    type Error = crate::errors::MultitaskError;

    fn try_from(raw: RawJobFile) -> std::result::Result<Self, Self::Error> {
        ensure_has_commands(&raw)?;
        let config = validate_global_config(&raw.config)?;
        let commands = validate_commands(&raw.command)?;
        Ok(JobFile::new_unchecked(config, commands))
    }
}

fn ensure_has_commands(raw: &RawJobFile) -> Result<()> {
    if raw.command.is_empty() {
        return Err(MultitaskError::ConfigError(
            "job file must contain at least one entry under [command]".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(section: &ConfigSection) -> Result<RunConfig> {
    let timeout = parse_field("[config].timeout", &section.timeout)?;
    let poll_interval = parse_field("[config].poll_interval", &section.poll_interval)?;
    let exit_grace = parse_field("[config].exit_grace", &section.exit_grace)?;
    if exit_grace.is_zero() {
        return Err(MultitaskError::ConfigError(
            "[config].exit_grace must be greater than zero".to_string(),
        ));
    }

    let shell = match &section.shell {
        None => Shell::default(),
        Some(argv) => {
            if argv.iter().any(|part| part.trim().is_empty()) {
                return Err(MultitaskError::ConfigError(
                    "[config].shell must not contain empty entries".to_string(),
                ));
            }
            Shell::from_argv(argv).ok_or_else(|| {
                MultitaskError::ConfigError(
                    "[config].shell must name at least a program".to_string(),
                )
            })?
        }
    };

    Ok(RunConfig {
        timeout: effective_timeout(timeout),
        poll_interval,
        exit_grace,
        shell,
    })
}

fn validate_commands(
    raw: &BTreeMap<String, RawCommand>,
) -> Result<BTreeMap<String, CommandSpec>> {
    let mut commands = BTreeMap::new();

    for (name, entry) in raw.iter() {
        if entry.cmd().trim().is_empty() {
            return Err(MultitaskError::ConfigError(format!(
                "command '{name}' has an empty command string"
            )));
        }

        let mut spec = CommandSpec::new(entry.cmd());
        if let RawCommand::Detailed {
            timeout: Some(timeout),
            ..
        } = entry
        {
            let field = format!("[command].{name}.timeout");
            spec = spec.with_timeout(parse_field(&field, timeout)?);
        }

        commands.insert(name.clone(), spec);
    }

    Ok(commands)
}

fn parse_field(field: &str, value: &str) -> Result<std::time::Duration> {
    parse_duration(value).map_err(|e| MultitaskError::ConfigError(format!("{field}: {e}")))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn raw(toml_src: &str) -> RawJobFile {
        toml::from_str(toml_src).expect("test TOML must parse")
    }

    #[test]
    fn defaults_apply_when_config_section_is_missing() {
        let job = JobFile::try_from(raw(
            r#"
[command]
a = "echo a"
"#,
        ))
        .unwrap();

        assert_eq!(job.config.timeout, None);
        assert_eq!(job.config.poll_interval, Duration::from_millis(10));
        assert_eq!(job.config.exit_grace, Duration::from_millis(500));
        assert_eq!(job.config.shell, Shell::default());
        assert_eq!(job.commands["a"], CommandSpec::new("echo a"));
    }

    #[test]
    fn detailed_command_keeps_its_timeout() {
        let job = JobFile::try_from(raw(
            r#"
[config]
timeout = "30s"

[command]
slow = { cmd = "sleep 10", timeout = "1s" }
plain = { cmd = "true" }
"#,
        ))
        .unwrap();

        assert_eq!(job.config.timeout, Some(Duration::from_secs(30)));
        assert_eq!(job.commands["slow"].timeout, Some(Duration::from_secs(1)));
        assert_eq!(job.commands["plain"].timeout, None);
    }

    #[test]
    fn empty_shell_list_is_rejected() {
        let err = JobFile::try_from(raw(
            r#"
[config]
shell = []

[command]
a = "echo a"
"#,
        ))
        .unwrap_err();

        assert!(matches!(err, MultitaskError::ConfigError(msg) if msg.contains("shell")));
    }

    #[test]
    fn bad_duration_names_the_field() {
        let err = JobFile::try_from(raw(
            r#"
[command]
a = { cmd = "echo a", timeout = "soon" }
"#,
        ))
        .unwrap_err();

        assert!(matches!(
            err,
            MultitaskError::ConfigError(msg) if msg.contains("[command].a.timeout")
        ));
    }

    #[test]
    fn zero_exit_grace_is_rejected() {
        let err = JobFile::try_from(raw(
            r#"
[config]
exit_grace = "0s"

[command]
a = "echo a"
"#,
        ))
        .unwrap_err();

        assert!(matches!(
            err,
            MultitaskError::ConfigError(msg) if msg.contains("[config].exit_grace")
        ));
    }
}
