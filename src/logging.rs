//! Diagnostic logging setup for the CLI.
//!
//! Logs go to stderr so stdout stays reserved for remote command output.

use tracing_subscriber::EnvFilter;

/// Env var consulted before `RUST_LOG`.
pub const LOG_ENV: &str = "HOSTLINK_LOG";

/// Default filter directive for a `-v` count.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Build the filter from `HOSTLINK_LOG`, then `RUST_LOG`, then verbosity.
pub fn build_filter<FEnv>(verbosity: u8, env_lookup: FEnv) -> EnvFilter
where
    FEnv: Fn(&str) -> Option<String>,
{
    let directive = env_lookup(LOG_ENV)
        .or_else(|| env_lookup("RUST_LOG"))
        .filter(|value| !value.trim().is_empty());
    directive
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(default_directive(verbosity)))
}

/// Install the global subscriber. Safe to call more than once.
pub fn init(verbosity: u8) {
    let filter = build_filter(verbosity, |name| std::env::var(name).ok());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
