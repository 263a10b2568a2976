// src/engine/mod.rs

//! Orchestration engine for multitask.
//!
//! This module ties together:
//! - the registry of spawned commands keyed by caller-chosen keys
//! - the polling loop that drains every active handle
//! - timeout enforcement and per-command outcomes

pub mod orchestrator;
pub mod outcome;

pub use orchestrator::{Orchestrator, OrchestratorOptions};
pub use outcome::{CommandOutcome, CommandReport};
