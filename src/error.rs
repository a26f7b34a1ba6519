//! Unified error types for the remote execution layer.

use std::fmt;
use std::time::Duration;

use crate::remote::format_duration;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors when loading, parsing, or validating configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Toml(e) => write!(f, "toml: {e}"),
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml(e)
    }
}

// ---------------------------------------------------------------------------
// TransportError
// ---------------------------------------------------------------------------

/// Failures reported by a [`Transport`](crate::remote::Transport)
/// implementation. The executor maps these onto [`RemoteError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Session establishment failed (DNS, refused, auth, host key).
    Handshake(String),
    /// An established session went away while running a command.
    ConnectionLost(String),
    /// Local failure unrelated to the session (spawn, I/O).
    Failed(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handshake(msg) => write!(f, "handshake failed: {msg}"),
            Self::ConnectionLost(msg) => write!(f, "connection lost: {msg}"),
            Self::Failed(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for TransportError {}

// ---------------------------------------------------------------------------
// RemoteError
// ---------------------------------------------------------------------------

/// Errors surfaced by [`RemoteExecutor`](crate::remote::RemoteExecutor).
#[derive(Debug)]
pub enum RemoteError {
    /// Construction-time validation failed.
    Config(ConfigError),
    /// The breaker tripped; no I/O was attempted.
    CircuitOpen { consecutive_failures: u32 },
    /// Opening the transport session failed.
    Connect { target: String, reason: String },
    /// The command did not finish before the deadline.
    Timeout {
        command_preview: String,
        limit: Duration,
    },
    /// The session dropped underneath a running command.
    ConnectionLost { reason: String },
    /// The command ran and exited non-zero with diagnostics on stderr.
    CommandFailed {
        command_preview: String,
        exit_code: i32,
        stderr: String,
    },
    /// Any other execution failure, passed through.
    Execution(String),
    /// `reconnect()` ran out of attempts.
    ReconnectExhausted { attempts: u32, last_error: String },
}

impl RemoteError {
    /// Short machine-friendly marker for the error category.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::CircuitOpen { .. } => "circuit_open",
            Self::Connect { .. } => "connect",
            Self::Timeout { .. } => "timeout",
            Self::ConnectionLost { .. } => "connection_lost",
            Self::CommandFailed { .. } => "command_failed",
            Self::Execution(_) => "execution",
            Self::ReconnectExhausted { .. } => "reconnect_exhausted",
        }
    }

    /// True when the failure points at the session rather than the command.
    pub fn is_connection_loss(&self) -> bool {
        matches!(self, Self::ConnectionLost { .. } | Self::Connect { .. })
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::CircuitOpen {
                consecutive_failures,
            } => write!(
                f,
                "circuit breaker open after {consecutive_failures} consecutive failures; restart the process once the host is reachable"
            ),
            Self::Connect { target, reason } => {
                write!(f, "failed to connect to {target}: {reason}")
            }
            Self::Timeout {
                command_preview,
                limit,
            } => write!(
                f,
                "command timed out after {}: {command_preview} (raise execution.command_timeout_ms for long-running operations)",
                format_duration(*limit)
            ),
            Self::ConnectionLost { reason } => write!(
                f,
                "connection lost: {reason} (the next command will reconnect)"
            ),
            Self::CommandFailed {
                command_preview,
                exit_code,
                stderr,
            } => write!(
                f,
                "command failed with exit code {exit_code}: {command_preview}: {}",
                stderr.trim()
            ),
            Self::Execution(msg) => write!(f, "execution failed: {msg}"),
            Self::ReconnectExhausted {
                attempts,
                last_error,
            } => write!(
                f,
                "reconnect exhausted after {attempts} attempts: {last_error}"
            ),
        }
    }
}

impl std::error::Error for RemoteError {}

impl From<ConfigError> for RemoteError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
