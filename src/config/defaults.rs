//! Default configuration constants.

/// Annotated `hostlink.toml` template printed by `hostlink config --template`.
pub(super) const DEFAULT_HOSTLINK_CONFIG_TEMPLATE: &str = include_str!("../templates/hostlink.toml");
/// Default ssh port.
pub(super) const DEFAULT_PORT: u16 = 22;
/// Seconds the ssh client waits for the TCP/handshake phase.
pub(super) const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Hard deadline for each remote command.
pub(super) const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 15_000;
/// Consecutive failures before the breaker opens.
pub(super) const DEFAULT_FAILURE_THRESHOLD: u32 = 3;
/// Connect attempts made by `reconnect`.
pub(super) const DEFAULT_RECONNECT_MAX_ATTEMPTS: u32 = 5;
/// First backoff delay for `reconnect`.
pub(super) const DEFAULT_RECONNECT_BASE_DELAY_MS: u64 = 1_000;
