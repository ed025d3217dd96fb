//! Logging configuration for bq-wordlist.
//!
//! Logs go to stderr so stdout carries nothing but result rows.

use crate::output::OutputMode;
use tracing_subscriber::EnvFilter;

/// Returns the filter to use: `RUST_LOG` if set, otherwise the mode's default level.
pub fn env_filter(mode: OutputMode) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(mode.default_log_filter()))
}

/// Initializes stderr logging for the given output mode.
pub fn init_stderr_logging(mode: OutputMode) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(mode))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
