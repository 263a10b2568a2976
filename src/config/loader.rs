// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{JobFile, RawJobFile};
use crate::errors::Result;

/// Load a job file from a given path and return the raw `RawJobFile`.
///
/// This only performs TOML deserialization; durations, the shell and the
/// command list are checked by [`load_and_validate`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawJobFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let jobs: RawJobFile = toml::from_str(&contents)?;

    Ok(jobs)
}

/// Load a job file from path and validate it.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Parses every duration and the shell override.
/// - Rejects files without commands or with empty command strings.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<JobFile> {
    let raw = load_from_path(&path)?;
    let jobs = JobFile::try_from(raw)?;
    Ok(jobs)
}

/// Job file used when `--jobs` is not given.
///
/// Currently `Multitask.toml` in the current working directory.
pub fn default_jobs_path() -> PathBuf {
    PathBuf::from("Multitask.toml")
}
