pub mod builders;

use std::sync::Once;
use std::time::Duration;

use multitask::engine::OrchestratorOptions;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Orchestrator options with a short idle sleep so tests finish quickly.
///
/// `timeout` of `Duration::ZERO` disables the timeout.
pub fn fast_options(timeout: Duration) -> OrchestratorOptions {
    OrchestratorOptions {
        poll_interval: Duration::from_millis(2),
        exit_grace: Duration::from_millis(500),
        ..OrchestratorOptions::default()
    }
    .with_timeout(timeout)
}
