//! CLI argument parsing via clap.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Run diagnostic commands on one managed host over a persistent ssh
/// connection, with per-command timeouts and a failure circuit breaker.
#[derive(Debug, Parser)]
#[command(name = "hostlink", version, long_version = hostlink::build_info::LONG_VERSION)]
pub struct Args {
    /// Path to config file (default: ./hostlink.toml or ~/.config/hostlink/hostlink.toml).
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<String>,

    /// Increase log verbosity (-v info, -vv debug). HOSTLINK_LOG overrides.
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Override connection host.
    #[arg(long = "host", global = true)]
    pub host: Option<String>,

    /// Override connection port.
    #[arg(short = 'p', long = "port", global = true)]
    pub port: Option<u16>,

    /// Override connection username.
    #[arg(short = 'u', long = "user", global = true)]
    pub user: Option<String>,

    /// Override private key path.
    #[arg(short = 'i', long = "key", global = true, conflicts_with = "ask_password")]
    pub key: Option<PathBuf>,

    /// Prompt for the ssh password instead of using a key.
    #[arg(long = "ask-password", global = true)]
    pub ask_password: bool,

    /// Override the per-command timeout in milliseconds.
    #[arg(long = "timeout-ms", global = true)]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one command and exit with its exit code.
    Exec {
        /// Print the result as JSON instead of raw streams.
        #[arg(long = "json")]
        json: bool,
        /// Command and arguments, joined with spaces and run by the remote shell.
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
    /// Connect, run a probe command, and report status.
    Check,
    /// Run commands read from stdin, one per line.
    Batch {
        /// Maximum commands in flight.
        #[arg(short = 'j', long = "jobs", default_value_t = 1)]
        jobs: usize,
        /// Reconnect with backoff after a connection loss.
        #[arg(long = "reconnect")]
        reconnect: bool,
    },
    /// Print the effective configuration (secrets redacted).
    Config {
        /// Print an annotated example config instead.
        #[arg(long = "template")]
        template: bool,
    },
}
