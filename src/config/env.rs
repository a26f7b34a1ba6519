//! Environment overrides.
//!
//! Canonical `HOSTLINK_*` variables take precedence. Plain `SSH_*` names are
//! accepted as fallbacks so existing deployment environments keep working.

use std::path::PathBuf;

use crate::error::ConfigError;

use super::{Config, ConfigDiagnostics};

pub(super) fn apply_runtime_env_overrides<FEnv>(
    config: &mut Config,
    env_lookup: &FEnv,
    diagnostics: &mut ConfigDiagnostics,
) -> Result<(), ConfigError>
where
    FEnv: Fn(&str) -> Option<String>,
{
    let mut lookup = |canonical: &'static str, fallback: Option<&'static str>| {
        env_with_fallback(env_lookup, canonical, fallback, diagnostics)
    };

    if let Some((_, host)) = lookup("HOSTLINK_HOST", Some("SSH_HOST")) {
        config.connection.host = host;
    }
    if let Some((name, port)) = lookup("HOSTLINK_PORT", Some("SSH_PORT")) {
        config.connection.port = port.trim().parse::<u16>().map_err(|_| {
            ConfigError::Invalid(format!(
                "invalid {name} value `{port}`: expected a port number"
            ))
        })?;
    }
    if let Some((_, user)) = lookup("HOSTLINK_USER", Some("SSH_USERNAME")) {
        config.connection.username = user;
    }
    if let Some((_, path)) = lookup("HOSTLINK_KEY_PATH", Some("SSH_PRIVATE_KEY_PATH")) {
        config.connection.private_key_path = Some(PathBuf::from(path));
    }
    if let Some((_, password)) = lookup("HOSTLINK_PASSWORD", Some("SSH_PASSWORD")) {
        config.connection.password = Some(password);
    }
    if let Some((name, timeout)) =
        lookup("HOSTLINK_COMMAND_TIMEOUT_MS", Some("SSH_COMMAND_TIMEOUT"))
    {
        config.execution.command_timeout_ms = parse_positive(&timeout, name)?;
    }
    if let Some((name, threshold)) = lookup("HOSTLINK_FAILURE_THRESHOLD", None) {
        let parsed = parse_positive(&threshold, name)?;
        config.execution.failure_threshold = u32::try_from(parsed).unwrap_or(u32::MAX);
    }
    Ok(())
}

/// Resolve a value from the canonical env var or, if absent, its fallback.
/// Returns the name of the variable that supplied it.
fn env_with_fallback<FEnv>(
    env_lookup: &FEnv,
    canonical: &'static str,
    fallback: Option<&'static str>,
    diagnostics: &mut ConfigDiagnostics,
) -> Option<(&'static str, String)>
where
    FEnv: Fn(&str) -> Option<String>,
{
    if let Some(value) = env_lookup(canonical).filter(|v| !v.trim().is_empty()) {
        return Some((canonical, value));
    }
    let fallback = fallback?;
    let value = env_lookup(fallback).filter(|v| !v.trim().is_empty())?;
    diagnostics
        .notices
        .push(format!("using `{fallback}` from the environment; prefer `{canonical}`"));
    Some((fallback, value))
}

/// Parse an unsigned integer, clamping zero to 1.
fn parse_positive(raw: &str, name: &str) -> Result<u64, ConfigError> {
    let parsed = raw.trim().parse::<u64>().map_err(|_| {
        ConfigError::Invalid(format!(
            "invalid {name} value `{raw}`: expected a positive integer"
        ))
    })?;
    Ok(parsed.max(1))
}

/// Sort and deduplicate diagnostic strings for stable output.
pub(super) fn dedupe_diagnostics(diagnostics: &mut ConfigDiagnostics) {
    diagnostics.notices.sort();
    diagnostics.notices.dedup();
}
