// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timeout wrapper shared by every adapter that shells out to a child
//! process (git, a repository setup script). Suspension points that touch
//! the filesystem or a subprocess must never hang the session they belong
//! to indefinitely.

use std::time::Duration;
use tokio::process::Command;

#[derive(Debug, thiserror::Error)]
pub enum SubprocessError {
    #[error("failed to spawn {program}: {source}")]
    Spawn { program: String, #[source] source: std::io::Error },
    #[error("{program} timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },
    #[error("{program} exited with {status}: {stderr}")]
    NonZero { program: String, status: std::process::ExitStatus, stderr: String },
}

/// Run `command`, killing it if it hasn't exited within `timeout`.
///
/// Returns stdout on success. A non-zero exit or a timeout are both reported
/// as errors; the caller decides whether either is fatal (most callers here
/// treat it as a logged, non-fatal failure.
pub async fn run_with_timeout(
    mut command: Command,
    program: &str,
    timeout: Duration,
) -> Result<String, SubprocessError> {
    command.kill_on_drop(true);
    let output = tokio::time::timeout(timeout, command.output()).await.map_err(|_| {
        SubprocessError::Timeout { program: program.to_string(), timeout }
    })?;
    let output = output.map_err(|e| SubprocessError::Spawn { program: program.to_string(), source: e })?;
    if !output.status.success() {
        return Err(SubprocessError::NonZero {
            program: program.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
