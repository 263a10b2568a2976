// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{JobFile, default_jobs_path, load_and_validate};
use crate::engine::{CommandReport, Orchestrator, OrchestratorOptions};
use crate::types::parse_duration;

pub use crate::engine::CommandOutcome;
pub use crate::exec::{ProcessHandle, ProcessStatus, Shell};
pub use crate::types::CommandSpec;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - job file loading
/// - the `--timeout` override
/// - the orchestrator run
/// - Ctrl-C handling (terminate everything, still print what was collected)
/// - printing one report per command
pub async fn run(args: CliArgs) -> Result<()> {
    let jobs_path = args.jobs.clone().unwrap_or_else(default_jobs_path);
    let jobs = load_and_validate(&jobs_path)
        .with_context(|| format!("loading job file '{}'", jobs_path.display()))?;

    let mut options = jobs.orchestrator_options();
    if let Some(ref timeout) = args.timeout {
        let timeout = parse_duration(timeout).context("invalid --timeout")?;
        options = options.with_timeout(timeout);
    }

    if args.dry_run {
        print_dry_run(&jobs, &options);
        return Ok(());
    }

    let mut orchestrator = Orchestrator::new(jobs.commands.clone(), options);

    let interrupted = tokio::select! {
        _ = orchestrator.run() => false,
        _ = wait_for_ctrl_c() => true,
    };

    if interrupted {
        warn!("Ctrl-C received; terminating remaining commands");
        orchestrator.terminate_all().await;
    }

    let reports = orchestrator.reports();
    let succeeded = reports
        .iter()
        .filter(|r| r.outcome.as_ref().is_some_and(CommandOutcome::is_success))
        .count();
    info!(
        total = reports.len(),
        succeeded,
        failed = reports.len() - succeeded,
        "all commands done"
    );

    print_reports(&reports);
    Ok(())
}

/// Resolves on Ctrl-C. If the signal handler cannot be installed this never
/// resolves, so the run is not cut short.
async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

/// Print each command with its outcome, output and error text.
fn print_reports(reports: &[CommandReport<String>]) {
    for report in reports {
        println!("Command {} ({}):", report.key, report.command);
        match &report.outcome {
            Some(outcome) => println!("  outcome: {outcome}"),
            None => println!("  outcome: unknown"),
        }
        println!("  output:");
        print_indented(&report.output);
        println!("  error:");
        print_indented(&report.error);
        println!();
    }
}

fn print_indented(text: &str) {
    for line in text.lines() {
        println!("    {line}");
    }
}

/// Simple dry-run output: print settings and commands.
fn print_dry_run(jobs: &JobFile, options: &OrchestratorOptions) {
    println!("multitask dry-run");
    println!("  timeout = {}", describe_timeout(options.timeout));
    println!("  poll_interval = {:?}", options.poll_interval);
    println!("  exit_grace = {:?}", options.exit_grace);
    println!(
        "  shell = {} {}",
        options.shell.program(),
        options.shell.args().join(" ")
    );
    println!();

    println!("commands ({}):", jobs.commands.len());
    for (name, spec) in jobs.commands.iter() {
        println!("  - {name}");
        println!("      cmd: {}", spec.command);
        if let Some(timeout) = spec.timeout {
            println!("      timeout: {}", describe_timeout(Some(timeout)));
        }
    }

    debug!("dry-run complete (no execution)");
}

fn describe_timeout(timeout: Option<Duration>) -> String {
    match timeout {
        Some(t) if !t.is_zero() => format!("{t:?}"),
        _ => "none".to_string(),
    }
}
