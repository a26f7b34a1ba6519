//! Shared test fixtures for config and executor test modules.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Notify;

use crate::config::Config;
use crate::error::TransportError;
use crate::remote::{ExecOutput, Transport};

static TEST_DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Temporary directory fixture with best-effort cleanup.
#[derive(Debug)]
pub struct TestTempDir {
    path: PathBuf,
}

impl TestTempDir {
    /// Create a unique temporary directory with a readable prefix.
    pub fn new(prefix: &str) -> Self {
        let suffix = TEST_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let dir = std::env::temp_dir().join(format!("hostlink-{prefix}-{millis}-{suffix}"));
        fs::create_dir_all(&dir).expect("failed to create temporary fixture directory");
        Self { path: dir }
    }

    /// Root directory path for this fixture.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write UTF-8 text to a child path, creating parent directories as needed.
    pub fn write_text(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent directories for fixture");
        }
        fs::write(&path, content).expect("failed to write fixture file");
        path
    }
}

impl Drop for TestTempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// Minimal valid configuration pointing at a fake host.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.connection.host = "db1.internal".into();
    config.connection.username = "ops".into();
    config.connection.private_key_path = Some(PathBuf::from("/home/ops/.ssh/id_ed25519"));
    config
}

/// One scripted `run` outcome.
#[derive(Clone, Debug)]
pub enum Step {
    Output(ExecOutput),
    Slow(Duration, ExecOutput),
    Lost(&'static str),
    /// Report a connection loss once the gate is notified.
    LostAfter(Arc<Notify>, &'static str),
    Fail(&'static str),
    Panic(&'static str),
}

/// Shared call counters, readable after the transport moved into an executor.
#[derive(Clone, Debug, Default)]
pub struct CallLog {
    opens: Arc<AtomicU32>,
    runs: Arc<AtomicU32>,
    closes: Arc<AtomicU32>,
}

impl CallLog {
    pub fn opens(&self) -> u32 {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn runs(&self) -> u32 {
        self.runs.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> u32 {
        self.closes.load(Ordering::SeqCst)
    }
}

/// Transport that replays queued steps and echoes the command once the queue
/// is empty.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    failing_opens: AtomicU32,
    calls: CallLog,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(self, step: Step) -> Self {
        self.steps.lock().expect("steps lock").push_back(step);
        self
    }

    /// Fail the next `count` opens with a handshake error.
    pub fn failing_opens(self, count: u32) -> Self {
        self.failing_opens.store(count, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> CallLog {
        self.calls.clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn summary(&self) -> String {
        "scripted".into()
    }

    async fn open(&self) -> Result<(), TransportError> {
        self.calls.opens.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failing_opens.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_opens.store(remaining - 1, Ordering::SeqCst);
            return Err(TransportError::Handshake("Connection refused".into()));
        }
        Ok(())
    }

    async fn run(&self, command: &str) -> Result<ExecOutput, TransportError> {
        self.calls.runs.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.lock().expect("steps lock").pop_front();
        match step {
            None => Ok(ExecOutput::ok(command)),
            Some(Step::Output(out)) => Ok(out),
            Some(Step::Slow(delay, out)) => {
                tokio::time::sleep(delay).await;
                Ok(out)
            }
            Some(Step::Lost(reason)) => Err(TransportError::ConnectionLost(reason.into())),
            Some(Step::LostAfter(gate, reason)) => {
                gate.notified().await;
                Err(TransportError::ConnectionLost(reason.into()))
            }
            Some(Step::Fail(reason)) => Err(TransportError::Failed(reason.into())),
            Some(Step::Panic(message)) => panic!("{message}"),
        }
    }

    async fn close(&self) {
        self.calls.closes.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_dir_fixture_writes_and_resolves_paths() {
        let fixture = TestTempDir::new("fixture");
        let file = fixture.write_text("nested/file.txt", "hello");
        assert!(file.starts_with(fixture.path()));
        assert_eq!(fs::read_to_string(file).unwrap(), "hello");
    }

    #[tokio::test]
    async fn scripted_transport_echoes_when_queue_is_empty() {
        let transport = ScriptedTransport::new();
        let out = transport.run("uname -a").await.unwrap();
        assert_eq!(out.stdout, "uname -a");
        assert_eq!(transport.calls().runs(), 1);
    }
}
