//! Configuration loading from TOML files and environment variables.
//!
//! Config is loaded in this order of precedence (highest wins):
//! 1. Environment variables (`HOSTLINK_HOST`, `HOSTLINK_USER`, ...) with
//!    plain `SSH_*` fallbacks.
//! 2. TOML file specified via --config CLI flag
//! 3. ./hostlink.toml in the current directory
//! 4. $XDG_CONFIG_HOME/hostlink/hostlink.toml (or ~/.config/hostlink/hostlink.toml)
//! 5. Built-in defaults

mod defaults;
mod env;
mod loader;
mod sources;
mod types;

pub use loader::{load_config, load_config_with_diagnostics};
pub use sources::{config_root_dir, ConfigSource};
pub use types::{
    Config, ConfigDiagnostics, ConnectionConfig, ExecutionConfig, LoadedConfig, ReconnectConfig,
};

/// Annotated example config file.
pub fn config_template() -> &'static str {
    defaults::DEFAULT_HOSTLINK_CONFIG_TEMPLATE
}

#[cfg(test)]
mod tests {
    use super::loader::load_config_with_diagnostics_from_sources;
    use super::*;
    use crate::testsupport::TestTempDir;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    fn load_with(
        path_override: Option<&str>,
        files: &[(&str, &str)],
        env: &[(&str, &str)],
    ) -> Result<LoadedConfig, crate::error::ConfigError> {
        let files: HashMap<PathBuf, String> = files
            .iter()
            .map(|(p, t)| (PathBuf::from(p), t.to_string()))
            .collect();
        let env: HashMap<String, String> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        load_config_with_diagnostics_from_sources(
            path_override,
            |path: &Path| {
                files.get(path).cloned().ok_or_else(|| {
                    std::io::Error::new(std::io::ErrorKind::NotFound, "missing fixture")
                })
            },
            |name| env.get(name).cloned(),
            || Some(PathBuf::from("/cfg")),
            || Some(PathBuf::from("/home/ops")),
        )
    }

    #[test]
    fn defaults_when_no_file_exists() {
        let loaded = load_with(None, &[], &[]).expect("defaults");
        assert_eq!(loaded.source, ConfigSource::BuiltInDefaults);
        assert_eq!(loaded.config.connection.port, 22);
        assert_eq!(loaded.config.execution.command_timeout_ms, 15_000);
        assert_eq!(loaded.config.execution.failure_threshold, 3);
        assert!(loaded.config.execution.count_command_failures);
        assert_eq!(loaded.config.reconnect.max_attempts, 5);
        assert_eq!(loaded.config.reconnect.base_delay_ms, 1_000);
    }

    #[test]
    fn local_file_beats_global_file() {
        let loaded = load_with(
            None,
            &[
                ("hostlink.toml", "[connection]\nhost = \"local\"\n"),
                (
                    "/cfg/hostlink/hostlink.toml",
                    "[connection]\nhost = \"global\"\n",
                ),
            ],
            &[],
        )
        .expect("load");
        assert_eq!(loaded.source, ConfigSource::Local);
        assert_eq!(loaded.config.connection.host, "local");
    }

    #[test]
    fn global_file_is_used_when_no_local_file() {
        let loaded = load_with(
            None,
            &[(
                "/cfg/hostlink/hostlink.toml",
                "[connection]\nhost = \"global\"\nuser = \"ops\"\n",
            )],
            &[],
        )
        .expect("load");
        assert_eq!(
            loaded.source,
            ConfigSource::Global(PathBuf::from("/cfg/hostlink/hostlink.toml"))
        );
        assert_eq!(loaded.config.connection.username, "ops");
    }

    #[test]
    fn explicit_path_must_exist() {
        let err = load_with(Some("/nope/hostlink.toml"), &[], &[]).expect_err("missing");
        assert!(err.to_string().starts_with("io:"), "got: {err}");
    }

    #[test]
    fn env_overrides_file_values() {
        let loaded = load_with(
            None,
            &[(
                "hostlink.toml",
                "[connection]\nhost = \"file\"\nport = 2200\n[execution]\ncommand_timeout_ms = 500\n",
            )],
            &[
                ("HOSTLINK_HOST", "env-host"),
                ("HOSTLINK_PORT", "2222"),
                ("HOSTLINK_COMMAND_TIMEOUT_MS", "30000"),
                ("HOSTLINK_FAILURE_THRESHOLD", "7"),
            ],
        )
        .expect("load");
        assert_eq!(loaded.config.connection.host, "env-host");
        assert_eq!(loaded.config.connection.port, 2222);
        assert_eq!(loaded.config.execution.command_timeout_ms, 30_000);
        assert_eq!(loaded.config.execution.failure_threshold, 7);
        assert!(loaded.diagnostics.notices.is_empty());
    }

    #[test]
    fn ssh_fallback_env_is_accepted_with_notice() {
        let loaded = load_with(
            None,
            &[],
            &[("SSH_HOST", "legacy-host"), ("SSH_USERNAME", "root")],
        )
        .expect("load");
        assert_eq!(loaded.config.connection.host, "legacy-host");
        assert_eq!(loaded.config.connection.username, "root");
        assert_eq!(loaded.diagnostics.notices.len(), 2);
    }

    #[test]
    fn canonical_env_beats_fallback() {
        let loaded = load_with(
            None,
            &[],
            &[("HOSTLINK_HOST", "canonical"), ("SSH_HOST", "legacy")],
        )
        .expect("load");
        assert_eq!(loaded.config.connection.host, "canonical");
        assert!(loaded.diagnostics.notices.is_empty());
    }

    #[test]
    fn invalid_numeric_env_is_rejected() {
        let err = load_with(None, &[], &[("HOSTLINK_PORT", "ssh")]).expect_err("bad port");
        assert!(err.to_string().contains("HOSTLINK_PORT"), "got: {err}");
        let err = load_with(None, &[], &[("HOSTLINK_COMMAND_TIMEOUT_MS", "-5")])
            .expect_err("bad timeout");
        assert!(err.to_string().contains("HOSTLINK_COMMAND_TIMEOUT_MS"));
    }

    #[test]
    fn invalid_fallback_env_names_the_fallback_variable() {
        let err = load_with(None, &[], &[("SSH_PORT", "twenty-two")]).expect_err("bad port");
        let text = err.to_string();
        assert!(text.contains("SSH_PORT"), "got: {text}");
        assert!(!text.contains("HOSTLINK_PORT"), "got: {text}");

        let err = load_with(None, &[], &[("SSH_COMMAND_TIMEOUT", "soon")])
            .expect_err("bad timeout");
        let text = err.to_string();
        assert!(text.contains("SSH_COMMAND_TIMEOUT"), "got: {text}");
        assert!(!text.contains("HOSTLINK_COMMAND_TIMEOUT_MS"), "got: {text}");
    }

    #[test]
    fn zero_limits_are_clamped() {
        let loaded = load_with(
            None,
            &[(
                "hostlink.toml",
                "[execution]\ncommand_timeout_ms = 0\nfailure_threshold = 0\n[reconnect]\nmax_attempts = 0\n",
            )],
            &[],
        )
        .expect("load");
        assert_eq!(loaded.config.execution.command_timeout_ms, 1);
        assert_eq!(loaded.config.execution.failure_threshold, 1);
        assert_eq!(loaded.config.reconnect.max_attempts, 1);
    }

    #[test]
    fn key_path_tilde_is_expanded() {
        let loaded = load_with(
            None,
            &[(
                "hostlink.toml",
                "[connection]\nprivate_key_path = \"~/.ssh/id_ed25519\"\n",
            )],
            &[],
        )
        .expect("load");
        assert_eq!(
            loaded.config.connection.private_key_path,
            Some(PathBuf::from("/home/ops/.ssh/id_ed25519"))
        );
    }

    #[test]
    fn unknown_toml_syntax_is_a_toml_error() {
        let err = load_with(None, &[("hostlink.toml", "[connection\n")], &[]).expect_err("bad");
        assert!(err.to_string().starts_with("toml:"), "got: {err}");
    }

    #[test]
    fn template_parses_into_defaults() {
        let config: Config = toml::from_str(config_template()).expect("template parses");
        assert_eq!(config.execution.command_timeout_ms, 15_000);
        assert_eq!(config.connection.port, 22);
    }

    #[test]
    fn loads_real_file_from_explicit_path() {
        let dir = TestTempDir::new("config");
        let path = dir.write_text(
            "custom.toml",
            "[connection]\nhost = \"db1\"\nusername = \"ops\"\npassword = \"pw\"\n",
        );
        let config = load_config(Some(path.to_string_lossy().as_ref())).expect("load");
        assert_eq!(config.connection.host, "db1");
        assert_eq!(config.connection.password.as_deref(), Some("pw"));
        let debug = format!("{:?}", config.connection);
        assert!(!debug.contains("\"pw\""), "got: {debug}");
    }
}
