//! Recording transport used by the integration suites.

use async_trait::async_trait;
use hostlink::config::Config;
use hostlink::error::TransportError;
use hostlink::remote::{ExecOutput, Transport};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How `run` responds.
#[derive(Clone, Debug)]
pub enum Behavior {
    /// Echo the command back on stdout.
    Echo,
    /// Return this output.
    Reply(ExecOutput),
    /// Sleep, then echo.
    Slow(Duration),
    /// Fail every run as a lost connection.
    Lose,
}

#[derive(Debug, Default)]
pub struct Counters {
    pub opens: AtomicU32,
    pub runs: AtomicU32,
    pub closes: AtomicU32,
    pub completed_after_delay: AtomicU32,
}

impl Counters {
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

pub struct MockTransport {
    pub behavior: Behavior,
    pub refuse_connect: AtomicBool,
    /// Runs that fail as lost connections before `behavior` applies.
    pub losses_before_behavior: AtomicU32,
    pub counters: Arc<Counters>,
}

impl MockTransport {
    pub fn new(behavior: Behavior) -> (Self, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        (
            Self {
                behavior,
                refuse_connect: AtomicBool::new(false),
                losses_before_behavior: AtomicU32::new(0),
                counters: Arc::clone(&counters),
            },
            counters,
        )
    }

    pub fn refusing(self) -> Self {
        self.refuse_connect.store(true, Ordering::SeqCst);
        self
    }

    pub fn losing_first(self, runs: u32) -> Self {
        self.losses_before_behavior.store(runs, Ordering::SeqCst);
        self
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn summary(&self) -> String {
        "mock".into()
    }

    async fn open(&self) -> Result<(), TransportError> {
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        if self.refuse_connect.load(Ordering::SeqCst) {
            return Err(TransportError::Handshake(
                "ssh: connect to host db1 port 22: Connection refused".into(),
            ));
        }
        Ok(())
    }

    async fn run(&self, command: &str) -> Result<ExecOutput, TransportError> {
        self.counters.runs.fetch_add(1, Ordering::SeqCst);
        let lose_now = self
            .losses_before_behavior
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if lose_now {
            return Err(TransportError::ConnectionLost("Broken pipe".into()));
        }
        match &self.behavior {
            Behavior::Echo => Ok(ExecOutput::ok(command)),
            Behavior::Reply(output) => Ok(output.clone()),
            Behavior::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                self.counters
                    .completed_after_delay
                    .fetch_add(1, Ordering::SeqCst);
                Ok(ExecOutput::ok(command))
            }
            Behavior::Lose => Err(TransportError::ConnectionLost(
                "Connection reset by peer".into(),
            )),
        }
    }

    async fn close(&self) {
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Valid config pointing at a fake host.
pub fn valid_config() -> Config {
    let mut config = Config::default();
    config.connection.host = "db1.internal".into();
    config.connection.username = "ops".into();
    config.connection.private_key_path = Some(PathBuf::from("/home/ops/.ssh/id_ed25519"));
    config
}
