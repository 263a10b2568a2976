// src/config/mod.rs

//! Job file loading and validation for multitask.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a job file from disk (`loader.rs`).
//! - Validate durations, the shell override and the command list
//!   (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_jobs_path, load_and_validate, load_from_path};
pub use model::{ConfigSection, JobFile, RawCommand, RawJobFile, RunConfig};
