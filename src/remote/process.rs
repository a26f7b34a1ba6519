//! Local process helpers shared by the ssh transport.

use crate::error::TransportError;
use std::process::Stdio;
use tokio::process::Command;

use super::types::ExecOutput;

/// Spawn `program` and wait for it, capturing stdout and stderr.
///
/// `envs` are added to the child environment only; they are never placed on
/// the command line.
pub(super) async fn run_process(
    program: &str,
    args: &[String],
    envs: &[(&str, &str)],
) -> Result<ExecOutput, TransportError> {
    let mut cmd = Command::new(program);
    // A timed-out caller drops this future; make sure the local client dies
    // with it instead of lingering.
    cmd.kill_on_drop(true);
    cmd.args(args)
        .envs(envs.iter().copied())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let child = cmd
        .spawn()
        .map_err(|e| TransportError::Failed(format!("{program}: {e}")))?;

    let output = child
        .wait_with_output()
        .await
        .map_err(|e| TransportError::Failed(format!("{program}: {e}")))?;

    Ok(ExecOutput {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

/// Pick the most useful diagnostic text from a failed local invocation.
pub(super) fn failure_details(output: &ExecOutput) -> String {
    let details = if output.stderr.trim().is_empty() {
        output.stdout.trim()
    } else {
        output.stderr.trim()
    };
    if details.is_empty() {
        format!("exited with {}", output.exit_code)
    } else {
        details.to_string()
    }
}
