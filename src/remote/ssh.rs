//! OpenSSH transport built on a persistent control-master connection.
//!
//! `open` starts a backgrounded master (`ssh -MNf`) bound to a private
//! control socket. Every command then runs as a multiplexed session over that
//! socket, so concurrent commands share one authenticated connection.

use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
#[cfg(test)]
use std::sync::{Mutex as StdMutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::ConnectionConfig;
use crate::error::TransportError;

use super::process::{failure_details, run_process};
use super::target::{ConnectionTarget, Credential};
use super::transport::Transport;
use super::types::ExecOutput;

/// Exit status the ssh client reserves for its own failures.
const SSH_CLIENT_FAILURE: i32 = 255;

/// Transport that drives the system `ssh` client.
pub struct SshTransport {
    target: ConnectionTarget,
    /// OpenSSH client binary.
    program: PathBuf,
    control_path: PathBuf,
    connect_timeout_secs: u64,
    ssh_options: Vec<String>,
    master_started: AtomicBool,
}

impl SshTransport {
    pub fn new(target: ConnectionTarget, config: &ConnectionConfig) -> Self {
        let control_path = build_ssh_control_path(&target.to_string());
        Self {
            target,
            program: PathBuf::from("ssh"),
            control_path,
            connect_timeout_secs: config.connect_timeout_secs.max(1),
            ssh_options: config.ssh_options.clone(),
            master_started: AtomicBool::new(false),
        }
    }

    /// Program and leading args. Password auth goes through `sshpass -e`,
    /// which reads the secret from `SSHPASS`.
    fn client(&self) -> (String, Vec<String>) {
        let ssh = self.program.display().to_string();
        match self.target.credential {
            Credential::Password(_) => ("sshpass".into(), vec!["-e".into(), ssh]),
            Credential::PrivateKey(_) => (ssh, Vec::new()),
        }
    }

    #[cfg(test)]
    fn with_program(mut self, program: PathBuf) -> Self {
        self.program = program;
        self
    }

    fn client_env(&self) -> Vec<(&'static str, &str)> {
        match &self.target.credential {
            Credential::Password(pw) => vec![("SSHPASS", pw.as_str())],
            Credential::PrivateKey(_) => Vec::new(),
        }
    }

    fn master_args(&self) -> Vec<String> {
        let (_, mut args) = self.client();
        args.extend([
            "-MNf".into(),
            "-p".into(),
            self.target.port.to_string(),
            "-o".into(),
            "ControlMaster=yes".into(),
            "-o".into(),
            "ControlPersist=yes".into(),
            "-o".into(),
            format!("ControlPath={}", self.control_path.display()),
            "-o".into(),
            format!("ConnectTimeout={}", self.connect_timeout_secs),
            "-o".into(),
            "ServerAliveInterval=15".into(),
        ]);
        match &self.target.credential {
            Credential::PrivateKey(path) => {
                args.extend([
                    "-i".into(),
                    path.display().to_string(),
                    "-o".into(),
                    "IdentitiesOnly=yes".into(),
                    "-o".into(),
                    "BatchMode=yes".into(),
                ]);
            }
            Credential::Password(_) => {
                args.extend([
                    "-o".into(),
                    "PreferredAuthentications=password,keyboard-interactive".into(),
                    "-o".into(),
                    "PubkeyAuthentication=no".into(),
                ]);
            }
        }
        for option in &self.ssh_options {
            args.push("-o".into());
            args.push(option.clone());
        }
        args.push(self.target.destination());
        args
    }

    fn check_args(&self) -> Vec<String> {
        vec![
            "-S".into(),
            self.control_path.display().to_string(),
            "-O".into(),
            "check".into(),
            self.target.destination(),
        ]
    }

    /// Ask the control master whether it is still running.
    async fn master_alive(&self) -> bool {
        let program = self.program.display().to_string();
        match run_process(&program, &self.check_args(), &[]).await {
            Ok(output) => output.exit_code == 0,
            Err(_) => false,
        }
    }

    fn session_args(&self, remote_command: &str) -> Vec<String> {
        // BatchMode keeps a dead master from turning into an interactive
        // fallback login.
        vec![
            "-T".into(),
            "-p".into(),
            self.target.port.to_string(),
            "-S".into(),
            self.control_path.display().to_string(),
            "-o".into(),
            "ControlMaster=no".into(),
            "-o".into(),
            "BatchMode=yes".into(),
            self.target.destination(),
            remote_command.into(),
        ]
    }
}

#[async_trait]
impl Transport for SshTransport {
    fn summary(&self) -> String {
        format!("ssh:{}", self.target)
    }

    async fn open(&self) -> Result<(), TransportError> {
        let (program, _) = self.client();
        let env = self.client_env();
        tracing::debug!(
            destination = %self.target,
            auth = self.target.credential.method(),
            socket = %self.control_path.display(),
            "starting ssh control master"
        );
        let output = run_process(&program, &self.master_args(), &env)
            .await
            .map_err(|e| TransportError::Handshake(e.to_string()))?;
        if output.exit_code != 0 {
            return Err(TransportError::Handshake(failure_details(&output)));
        }
        self.master_started.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn run(&self, command: &str) -> Result<ExecOutput, TransportError> {
        let program = self.program.display().to_string();
        let output = run_process(&program, &self.session_args(command), &[]).await?;
        if output.exit_code == SSH_CLIENT_FAILURE
            && looks_like_client_failure(&output.stderr)
            && !self.master_alive().await
        {
            return Err(TransportError::ConnectionLost(failure_details(&output)));
        }
        Ok(output)
    }

    async fn close(&self) {
        if self.master_started.swap(false, Ordering::SeqCst) {
            let program = self.program.clone();
            let target = self.target.destination();
            let control_path = self.control_path.clone();
            let _ = tokio::task::spawn_blocking(move || {
                close_ssh_control_connection(&program, &target, &control_path)
            })
            .await;
        }
    }
}

impl Drop for SshTransport {
    fn drop(&mut self) {
        // Best-effort connection cleanup; failures are non-fatal.
        if self.master_started.swap(false, Ordering::SeqCst) {
            close_ssh_control_connection(
                &self.program,
                &self.target.destination(),
                &self.control_path,
            );
        }
    }
}

/// First filter for exit 255. Remote commands (a nested `ssh`, say) can print
/// the same text, so a match is only a loss once `master_alive` says so.
fn looks_like_client_failure(stderr: &str) -> bool {
    let text = stderr.to_ascii_lowercase();
    [
        "connection closed",
        "connection reset",
        "connection refused",
        "connection timed out",
        "broken pipe",
        "control socket",
        "mux_client",
        "no route to host",
    ]
    .iter()
    .any(|marker| text.contains(marker))
}

#[cfg(test)]
type SshCloseHook = Box<dyn Fn(&str, &Path) + Send + Sync + 'static>;

#[cfg(test)]
fn ssh_close_hook_slot() -> &'static StdMutex<Option<SshCloseHook>> {
    static SLOT: OnceLock<StdMutex<Option<SshCloseHook>>> = OnceLock::new();
    SLOT.get_or_init(|| StdMutex::new(None))
}

#[cfg(test)]
fn set_ssh_close_hook_for_tests(hook: Option<SshCloseHook>) {
    *ssh_close_hook_slot().lock().expect("ssh close hook lock") = hook;
}

fn close_ssh_control_connection(program: &Path, target: &str, control_path: &Path) {
    #[cfg(test)]
    {
        if let Some(hook) = ssh_close_hook_slot()
            .lock()
            .expect("ssh close hook lock")
            .as_ref()
        {
            hook(target, control_path);
            return;
        }
    }

    tracing::debug!(destination = %target, socket = %control_path.display(), "closing ssh control master");
    let _ = std::process::Command::new(program)
        .arg("-S")
        .arg(control_path)
        .arg("-O")
        .arg("exit")
        .arg(target)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    let _ = std::fs::remove_file(control_path);
}

fn build_ssh_control_path(target: &str) -> PathBuf {
    let mut hasher = DefaultHasher::new();
    target.hash(&mut hasher);
    std::process::id().hash(&mut hasher);
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos()
        .hash(&mut hasher);
    let hash = hasher.finish();
    std::env::temp_dir().join(format!("hostlink-ssh-{hash:x}.sock"))
}
