//! Validated connection target.

use std::fmt;
use std::path::PathBuf;

use crate::config::ConnectionConfig;
use crate::error::ConfigError;

/// The single credential used to authenticate.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    PrivateKey(PathBuf),
    Password(String),
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PrivateKey(path) => f.debug_tuple("PrivateKey").field(path).finish(),
            Self::Password(_) => f.write_str("Password(<redacted>)"),
        }
    }
}

impl Credential {
    /// Auth method name for logs.
    pub fn method(&self) -> &'static str {
        match self {
            Self::PrivateKey(_) => "publickey",
            Self::Password(_) => "password",
        }
    }
}

/// Destination and credential, checked once before any I/O.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionTarget {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub credential: Credential,
}

impl ConnectionTarget {
    /// Validate the connection section. Missing host, username, or
    /// credential is fatal.
    pub fn from_config(config: &ConnectionConfig) -> Result<Self, ConfigError> {
        let host = config.host.trim();
        if host.is_empty() {
            return Err(ConfigError::Invalid(
                "connection.host is required (set it in hostlink.toml or HOSTLINK_HOST)".into(),
            ));
        }
        let username = config.username.trim();
        if username.is_empty() {
            return Err(ConfigError::Invalid(
                "connection.username is required (set it in hostlink.toml or HOSTLINK_USER)"
                    .into(),
            ));
        }
        if config.port == 0 {
            return Err(ConfigError::Invalid(
                "connection.port must be between 1 and 65535".into(),
            ));
        }

        let key = config
            .private_key_path
            .as_ref()
            .filter(|path| !path.as_os_str().is_empty());
        let password = config.password.as_ref().filter(|pw| !pw.is_empty());
        let credential = match (key, password) {
            (Some(path), Some(_)) => {
                tracing::warn!(
                    key = %path.display(),
                    "both private_key_path and password are set; using the private key"
                );
                Credential::PrivateKey(path.clone())
            }
            (Some(path), None) => Credential::PrivateKey(path.clone()),
            (None, Some(pw)) => Credential::Password(pw.clone()),
            (None, None) => {
                return Err(ConfigError::Invalid(
                    "a credential is required: set connection.private_key_path or connection.password".into(),
                ))
            }
        };

        Ok(Self {
            host: host.to_string(),
            port: config.port,
            username: username.to_string(),
            credential,
        })
    }

    /// `user@host` destination string for the ssh client.
    pub fn destination(&self) -> String {
        format!("{}@{}", self.username, self.host)
    }
}

impl fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.username, self.host, self.port)
    }
}
