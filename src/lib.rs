//! hostlink - resilient remote command execution for one managed host.
//!
//! Diagnostic callers hand shell commands to a shared [`RemoteExecutor`],
//! which keeps a persistent ssh connection, bounds every command with a
//! timeout, and stops talking to the host after repeated failures.
//!
//! # Quick start
//!
//! ```no_run
//! use hostlink::config::load_config;
//! use hostlink::remote::RemoteExecutor;
//!
//! # async fn example() {
//! let config = load_config(None).unwrap();
//! let executor = RemoteExecutor::ssh(&config).unwrap();
//! let output = executor.execute("uptime").await.unwrap();
//! println!("{}", output.stdout);
//! executor.disconnect().await;
//! # }
//! ```
//!
//! [`RemoteExecutor`]: remote::RemoteExecutor

pub mod batch;
pub mod build_info;
pub mod config;
pub mod error;
pub mod logging;
pub mod remote;
#[cfg(test)]
pub mod testsupport;
