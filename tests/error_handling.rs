// tests/error_handling.rs

use std::io::Write;

use tempfile::NamedTempFile;
use multitask::config::load_and_validate;
use multitask::errors::MultitaskError;
use multitask_test_utils::builders::JobFileBuilder;
use multitask::config::JobFile;

fn job_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn test_missing_commands_returns_config_error() {
    let file = job_file(
        r#"
[config]
timeout = "5s"
"#,
    );

    match load_and_validate(file.path()) {
        Err(MultitaskError::ConfigError(msg)) => {
            assert!(msg.contains("at least one"));
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_empty_command_string_returns_config_error() {
    let file = job_file(
        r#"
[command]
blank = "   "
"#,
    );

    match load_and_validate(file.path()) {
        Err(MultitaskError::ConfigError(msg)) => {
            assert!(msg.contains("blank"));
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_invalid_toml_returns_toml_error() {
    let file = job_file("[command\na = ");

    let result = load_and_validate(file.path());
    assert!(
        matches!(result, Err(MultitaskError::TomlError(_))),
        "Expected TomlError, got: {:?}",
        result
    );
}

#[test]
fn test_missing_file_returns_io_error() {
    let result = load_and_validate("/definitely/not/here/Multitask.toml");
    assert!(matches!(result, Err(MultitaskError::IoError(_))));
}

#[test]
fn test_invalid_global_duration_returns_config_error() {
    let raw = JobFileBuilder::new()
        .timeout("forever")
        .with_command("a", "echo a")
        .build_raw();

    match JobFile::try_from(raw) {
        Err(MultitaskError::ConfigError(msg)) => {
            assert!(msg.contains("[config].timeout"));
            assert!(msg.contains("forever"));
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}
