//! Transport contract used to decouple `RemoteExecutor` from the concrete
//! session implementation.

use crate::error::TransportError;
use async_trait::async_trait;

use super::types::ExecOutput;

/// One logical remote destination that can open a session and run
/// non-interactive commands over it.
///
/// Implementations must tolerate concurrent `run` calls once a session is
/// open. `open`/`close` are serialized by the executor.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Human-readable destination summary, e.g. `ssh:ops@db1:22`.
    fn summary(&self) -> String;
    /// Establish a new session.
    async fn open(&self) -> Result<(), TransportError>;
    /// Run one command to completion over the open session.
    async fn run(&self, command: &str) -> Result<ExecOutput, TransportError>;
    /// Release the session. Must not fail; cleanup is best-effort.
    async fn close(&self);
}
