//! Remote command execution with a bounded wait and a failure circuit breaker.
//!
//! [`RemoteExecutor`] owns the one connection to the managed host. Every
//! diagnostic caller goes through [`RemoteExecutor::execute`], which:
//! - rejects immediately once the breaker has opened,
//! - connects lazily (one attempt, no backoff),
//! - races the command against the configured deadline,
//! - turns non-zero exits with stderr into errors,
//! - updates the consecutive-failure counter.
//!
//! Backoff lives in [`RemoteExecutor::reconnect`] and is only used when a
//! caller asks for it.

mod backoff;
mod breaker;
mod process;
mod ssh;
mod target;
mod transport;
mod types;

pub use backoff::ReconnectPolicy;
pub use ssh::SshTransport;
pub use target::{ConnectionTarget, Credential};
pub use transport::Transport;
pub use types::{command_preview, format_duration, BreakerSnapshot, ExecOutput, COMMAND_PREVIEW_CHARS};

use crate::config::Config;
use crate::error::{RemoteError, TransportError};
use breaker::{CircuitBreaker, FailureOutcome};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout};

/// The single shared handle to the managed host.
///
/// Construct once and share by `Arc`; all methods take `&self`.
pub struct RemoteExecutor<T: Transport = SshTransport> {
    transport: T,
    target: String,
    command_timeout: Duration,
    count_command_failures: bool,
    reconnect_policy: ReconnectPolicy,
    /// Generation of the usable session, or 0 when disconnected.
    live_generation: AtomicU64,
    reconnect_attempts: AtomicU32,
    /// Serializes session open/close.
    lifecycle: Mutex<SessionSlot>,
    breaker: CircuitBreaker,
}

/// Transport session bookkeeping, only touched under the lifecycle lock.
#[derive(Debug, Default)]
struct SessionSlot {
    /// A session was opened and not yet closed, even if it has since died.
    open: bool,
    /// Last generation handed out; generations start at 1.
    generation: u64,
}

impl RemoteExecutor<SshTransport> {
    /// Validate `config` and build an executor over the system ssh client.
    pub fn ssh(config: &Config) -> Result<Self, RemoteError> {
        let target = ConnectionTarget::from_config(&config.connection)?;
        let transport = SshTransport::new(target.clone(), &config.connection);
        Ok(Self::from_parts(config, &target, transport))
    }
}

impl<T: Transport> RemoteExecutor<T> {
    /// Validate `config` and build an executor over `transport`.
    ///
    /// Validation runs before anything touches the transport.
    pub fn with_transport(config: &Config, transport: T) -> Result<Self, RemoteError> {
        let target = ConnectionTarget::from_config(&config.connection)?;
        Ok(Self::from_parts(config, &target, transport))
    }

    fn from_parts(config: &Config, target: &ConnectionTarget, transport: T) -> Self {
        let execution = &config.execution;
        Self {
            transport,
            target: target.to_string(),
            command_timeout: Duration::from_millis(execution.command_timeout_ms.max(1)),
            count_command_failures: execution.count_command_failures,
            reconnect_policy: ReconnectPolicy::from(&config.reconnect),
            live_generation: AtomicU64::new(0),
            reconnect_attempts: AtomicU32::new(0),
            lifecycle: Mutex::new(SessionSlot::default()),
            breaker: CircuitBreaker::new(execution.failure_threshold),
        }
    }

    /// Destination summary from the transport.
    pub fn summary(&self) -> String {
        self.transport.summary()
    }

    pub fn command_timeout(&self) -> Duration {
        self.command_timeout
    }

    pub fn is_connected(&self) -> bool {
        self.live_generation.load(Ordering::SeqCst) != 0
    }

    /// Read-only view of the failure counters.
    pub fn breaker_snapshot(&self) -> BreakerSnapshot {
        self.breaker.snapshot()
    }

    /// Open a new session, replacing any existing one. No retries.
    pub async fn connect(&self) -> Result<(), RemoteError> {
        let mut slot = self.lifecycle.lock().await;
        self.connect_locked(&mut slot).await.map(|_| ())
    }

    /// Release whatever session is still held, including one that died, then
    /// open a fresh one. Returns the new session generation.
    async fn connect_locked(&self, slot: &mut SessionSlot) -> Result<u64, RemoteError> {
        self.live_generation.store(0, Ordering::SeqCst);
        if std::mem::take(&mut slot.open) {
            self.transport.close().await;
        }
        tracing::info!(host = %self.target, "connecting");
        match self.transport.open().await {
            Ok(()) => {
                slot.open = true;
                slot.generation += 1;
                self.live_generation.store(slot.generation, Ordering::SeqCst);
                self.reconnect_attempts.store(0, Ordering::SeqCst);
                tracing::info!(host = %self.target, generation = slot.generation, "connected");
                Ok(slot.generation)
            }
            Err(err) => {
                tracing::warn!(host = %self.target, error = %err, "connect failed");
                Err(RemoteError::Connect {
                    target: self.target.clone(),
                    reason: transport_reason(err),
                })
            }
        }
    }

    /// Lazy connect used by `execute`. Another task may have connected while
    /// this one waited for the lock.
    async fn ensure_connected(&self) -> Result<u64, RemoteError> {
        let generation = self.live_generation.load(Ordering::SeqCst);
        if generation != 0 {
            return Ok(generation);
        }
        let mut slot = self.lifecycle.lock().await;
        let generation = self.live_generation.load(Ordering::SeqCst);
        if generation != 0 {
            return Ok(generation);
        }
        self.connect_locked(&mut slot).await
    }

    /// Mark `generation` as lost. A newer session opened in the meantime
    /// stays connected.
    fn mark_lost(&self, generation: u64) {
        let cleared = self
            .live_generation
            .compare_exchange(generation, 0, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if !cleared {
            tracing::debug!(
                host = %self.target,
                generation,
                "connection loss from a replaced session ignored"
            );
        }
    }

    /// Release the session if one is open. Idempotent and infallible.
    pub async fn disconnect(&self) {
        let mut slot = self.lifecycle.lock().await;
        self.live_generation.store(0, Ordering::SeqCst);
        if std::mem::take(&mut slot.open) {
            self.transport.close().await;
            tracing::info!(host = %self.target, "disconnected");
        }
    }

    /// Retry `connect` with exponential backoff per the reconnect policy.
    ///
    /// Never invoked by `execute`; callers opt in after observing a
    /// connection loss.
    pub async fn reconnect(&self) -> Result<(), RemoteError> {
        let policy = self.reconnect_policy;
        let mut last_error = String::new();
        for attempt in 1..=policy.max_attempts {
            self.reconnect_attempts.store(attempt, Ordering::SeqCst);
            tracing::info!(
                host = %self.target,
                attempt,
                max_attempts = policy.max_attempts,
                "reconnecting"
            );
            match self.connect().await {
                Ok(()) => return Ok(()),
                Err(err) => last_error = err.to_string(),
            }
            if let Some(delay) = policy.delay_after(attempt) {
                tracing::warn!(
                    host = %self.target,
                    attempt,
                    delay = %format_duration(delay),
                    "reconnect attempt failed; backing off"
                );
                sleep(delay).await;
            }
        }
        tracing::error!(host = %self.target, attempts = policy.max_attempts, "reconnect exhausted");
        Err(RemoteError::ReconnectExhausted {
            attempts: policy.max_attempts,
            last_error,
        })
    }

    /// Attempts made by the current (or last) `reconnect` call; zero after a
    /// successful connect.
    pub fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts.load(Ordering::SeqCst)
    }

    /// Run one command with the configured deadline.
    pub async fn execute(&self, command: &str) -> Result<ExecOutput, RemoteError> {
        if let Err(consecutive_failures) = self.breaker.check() {
            return Err(RemoteError::CircuitOpen {
                consecutive_failures,
            });
        }

        tracing::debug!(host = %self.target, command = %command_preview(command), "execute");
        let result = self.execute_unguarded(command).await;
        match &result {
            Ok(_) => self.breaker.record_success(),
            Err(RemoteError::CommandFailed { .. }) if !self.count_command_failures => {}
            Err(err) => self.record_failure(err),
        }
        result
    }

    async fn execute_unguarded(&self, command: &str) -> Result<ExecOutput, RemoteError> {
        let generation = self.ensure_connected().await?;

        // On timeout the command future is dropped here, so a late result can
        // never reach the counters.
        let output = match timeout(self.command_timeout, self.transport.run(command)).await {
            Ok(Ok(output)) => output,
            Ok(Err(TransportError::ConnectionLost(reason))) => {
                self.mark_lost(generation);
                return Err(RemoteError::ConnectionLost { reason });
            }
            Ok(Err(err)) => return Err(RemoteError::Execution(transport_reason(err))),
            Err(_) => {
                return Err(RemoteError::Timeout {
                    command_preview: command_preview(command),
                    limit: self.command_timeout,
                })
            }
        };

        if output.exit_code != 0 && !output.stderr.trim().is_empty() {
            return Err(RemoteError::CommandFailed {
                command_preview: command_preview(command),
                exit_code: output.exit_code,
                stderr: output.stderr,
            });
        }
        Ok(output)
    }

    fn record_failure(&self, err: &RemoteError) {
        match self.breaker.record_failure() {
            FailureOutcome::Counted(count) => tracing::warn!(
                host = %self.target,
                kind = err.kind(),
                consecutive_failures = count,
                "remote command failed"
            ),
            FailureOutcome::Tripped(count) => tracing::error!(
                host = %self.target,
                kind = err.kind(),
                consecutive_failures = count,
                "circuit breaker opened; rejecting further commands"
            ),
            FailureOutcome::AlreadyOpen(count) => tracing::debug!(
                host = %self.target,
                consecutive_failures = count,
                "failure recorded after breaker opened"
            ),
        }
    }
}

fn transport_reason(err: TransportError) -> String {
    match err {
        TransportError::Handshake(msg)
        | TransportError::ConnectionLost(msg)
        | TransportError::Failed(msg) => msg,
    }
}
