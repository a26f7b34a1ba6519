//! Run many commands through one shared executor.
//!
//! Commands run with a bounded number in flight and results are reported in
//! input order. With `reconnect` enabled, a lost or refused session triggers the
//! backoff reconnect before the failed slot is released, so with one job the
//! next command only starts once the session is back.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, Semaphore};
use tokio::task::JoinHandle;

use crate::error::RemoteError;
use crate::remote::{ExecOutput, RemoteExecutor, Transport};

/// Batch execution knobs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BatchOptions {
    pub jobs: usize,
    pub reconnect: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            jobs: 1,
            reconnect: false,
        }
    }
}

/// One command and its outcome.
#[derive(Debug)]
pub struct BatchEntry {
    pub command: String,
    pub result: Result<ExecOutput, RemoteError>,
}

/// Totals reported after a batch.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
}

/// Extract runnable commands from batch input. Blank lines and `#` comments
/// are skipped.
pub fn parse_batch_lines(input: &str) -> Vec<String> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Execute `commands`, calling `on_entry` for each result in input order.
pub async fn run_batch<T, F>(
    executor: Arc<RemoteExecutor<T>>,
    commands: Vec<String>,
    options: BatchOptions,
    mut on_entry: F,
) -> BatchSummary
where
    T: Transport + 'static,
    F: FnMut(&BatchEntry),
{
    let permits = Arc::new(Semaphore::new(options.jobs.max(1)));
    let reconnect_gate = Arc::new(Mutex::new(()));
    let (tx, mut rx) = mpsc::unbounded_channel::<(String, JoinHandle<BatchEntry>)>();

    let dispatcher = tokio::spawn(async move {
        for command in commands {
            let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
                break;
            };
            let executor = Arc::clone(&executor);
            let gate = Arc::clone(&reconnect_gate);
            let submitted = command.clone();
            let handle = tokio::spawn(async move {
                let result = executor.execute(&command).await;
                let lost = matches!(&result, Err(err) if err.is_connection_loss());
                if options.reconnect && lost {
                    recover_session(&executor, &gate).await;
                }
                drop(permit);
                BatchEntry { command, result }
            });
            if tx.send((submitted, handle)).is_err() {
                break;
            }
        }
    });

    let mut summary = BatchSummary::default();
    while let Some((command, handle)) = rx.recv().await {
        let entry = match handle.await {
            Ok(entry) => entry,
            Err(join_err) => BatchEntry {
                command,
                result: Err(RemoteError::Execution(format!("batch task failed: {join_err}"))),
            },
        };
        if entry.result.is_ok() {
            summary.succeeded += 1;
        } else {
            summary.failed += 1;
        }
        on_entry(&entry);
    }
    let _ = dispatcher.await;
    summary
}

async fn recover_session<T: Transport>(executor: &RemoteExecutor<T>, gate: &Mutex<()>) {
    let _guard = gate.lock().await;
    // Another task may already have restored the session.
    if executor.is_connected() {
        return;
    }
    if let Err(err) = executor.reconnect().await {
        tracing::error!(error = %err, "batch reconnect failed");
    }
}
