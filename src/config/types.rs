//! Configuration data model.
//!
//! This module holds struct definitions plus default values. Loading and
//! precedence logic lives in `loader`, `sources`, and `env`.

use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

use super::defaults::{
    DEFAULT_COMMAND_TIMEOUT_MS, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_FAILURE_THRESHOLD,
    DEFAULT_PORT, DEFAULT_RECONNECT_BASE_DELAY_MS, DEFAULT_RECONNECT_MAX_ATTEMPTS,
};
use super::sources::ConfigSource;

/// Top-level runtime configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub connection: ConnectionConfig,
    pub execution: ExecutionConfig,
    pub reconnect: ReconnectConfig,
}

/// Destination and credential settings under `[connection]`.
///
/// Required fields are checked when the executor is built, not when the file
/// is parsed.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    #[serde(alias = "user")]
    pub username: String,
    #[serde(alias = "key_path")]
    pub private_key_path: Option<PathBuf>,
    pub password: Option<String>,
    pub connect_timeout_secs: u64,
    /// Extra `-o` options for the ssh master connection.
    pub ssh_options: Vec<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            username: String::new(),
            private_key_path: None,
            password: None,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            ssh_options: Vec::new(),
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("private_key_path", &self.private_key_path)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("ssh_options", &self.ssh_options)
            .finish()
    }
}

/// Per-command deadline and breaker settings under `[execution]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub command_timeout_ms: u64,
    pub failure_threshold: u32,
    /// Count "exit != 0 with stderr" toward the breaker.
    pub count_command_failures: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            command_timeout_ms: DEFAULT_COMMAND_TIMEOUT_MS,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            count_command_failures: true,
        }
    }
}

/// Backoff settings for explicit reconnects under `[reconnect]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RECONNECT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_RECONNECT_BASE_DELAY_MS,
        }
    }
}

/// Non-fatal notes collected while loading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDiagnostics {
    pub notices: Vec<String>,
}

/// Resolved config plus where it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub source: ConfigSource,
    pub diagnostics: ConfigDiagnostics,
}
