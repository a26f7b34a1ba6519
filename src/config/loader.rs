//! Top-level config loading pipeline.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::env::{apply_runtime_env_overrides, dedupe_diagnostics};
use super::sources::{config_root_dir, read_config_text_with_sources};
use super::{Config, ConfigDiagnostics, LoadedConfig};

/// Load configuration from disk and environment.
///
/// `path_override` is an explicit config file path (from --config flag).
pub fn load_config(path_override: Option<&str>) -> Result<Config, ConfigError> {
    Ok(load_config_with_diagnostics(path_override)?.config)
}

/// Load configuration and return where it came from plus any notices.
pub fn load_config_with_diagnostics(
    path_override: Option<&str>,
) -> Result<LoadedConfig, ConfigError> {
    load_config_with_diagnostics_from_sources(
        path_override,
        |path| std::fs::read_to_string(path),
        |name| std::env::var(name).ok(),
        config_root_dir,
        dirs::home_dir,
    )
}

pub(super) fn load_config_with_diagnostics_from_sources<FRead, FEnv, FRoot, FHome>(
    path_override: Option<&str>,
    read_file: FRead,
    env_lookup: FEnv,
    config_root: FRoot,
    home_dir: FHome,
) -> Result<LoadedConfig, ConfigError>
where
    FRead: Fn(&Path) -> Result<String, std::io::Error>,
    FEnv: Fn(&str) -> Option<String>,
    FRoot: Fn() -> Option<PathBuf>,
    FHome: Fn() -> Option<PathBuf>,
{
    let (config_text, source) =
        read_config_text_with_sources(path_override, &read_file, &config_root)?;
    let mut diagnostics = ConfigDiagnostics::default();
    let mut config: Config = toml::from_str(&config_text)?;
    apply_runtime_env_overrides(&mut config, &env_lookup, &mut diagnostics)?;
    normalize(&mut config, &home_dir);
    dedupe_diagnostics(&mut diagnostics);

    Ok(LoadedConfig {
        config,
        source,
        diagnostics,
    })
}

fn normalize<FHome>(config: &mut Config, home_dir: &FHome)
where
    FHome: Fn() -> Option<PathBuf>,
{
    let connection = &mut config.connection;
    connection.host = connection.host.trim().to_string();
    connection.username = connection.username.trim().to_string();
    if let Some(path) = connection.private_key_path.take() {
        connection.private_key_path = Some(expand_home(&path, home_dir));
    }
    connection.connect_timeout_secs = connection.connect_timeout_secs.max(1);
    config.execution.command_timeout_ms = config.execution.command_timeout_ms.max(1);
    config.execution.failure_threshold = config.execution.failure_threshold.max(1);
    config.reconnect.max_attempts = config.reconnect.max_attempts.max(1);
}

/// Expand a leading `~/` against the home directory.
fn expand_home<FHome>(path: &Path, home_dir: &FHome) -> PathBuf
where
    FHome: Fn() -> Option<PathBuf>,
{
    match path.strip_prefix("~") {
        Ok(rest) => match home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}
