//! Shared execution data structures and message helpers.

use serde::Serialize;
use std::time::Duration;

/// Maximum number of characters of a command echoed back in error messages.
pub const COMMAND_PREVIEW_CHARS: usize = 100;

/// Structured process output for one remote command run to completion.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ExecOutput {
    /// Successful output with empty stderr.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: 0,
        }
    }
}

/// Point-in-time view of the failure counters.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BreakerSnapshot {
    pub consecutive_failures: u32,
    pub open: bool,
}

/// Bounded command prefix used in error messages. Never splits a character.
pub fn command_preview(command: &str) -> String {
    let trimmed = command.trim();
    let mut chars = trimmed.char_indices();
    match chars.nth(COMMAND_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

/// Human-oriented duration formatting used in error messages.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();
    if secs == 0 {
        return format!("{millis}ms");
    }
    if millis == 0 {
        if secs % 3600 == 0 {
            return format!("{}h", secs / 3600);
        }
        if secs % 60 == 0 {
            return format!("{}m", secs / 60);
        }
        return format!("{secs}s");
    }
    format!("{secs}.{millis:03}s")
}
