//! Tracing setup for binaries and tests embedding the planner.

use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

/// Environment variable read for the log filter directive.
pub const LOG_ENV_VAR: &str = "CDP_LOG";

/// Install a stderr subscriber filtered by `CDP_LOG`, falling back to the
/// given directive. Safe to call more than once; later calls are no-ops.
pub fn init_logging(default_directive: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();
}
