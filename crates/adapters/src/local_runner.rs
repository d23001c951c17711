// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local subprocess implementation of [`crate::agent::AgentRunner`].
//!
//! Grounded in the reference workspace's coop-spawn pattern (process
//! creation, workspace prep, env forwarding) and the enrichment repository's
//! Claude subprocess backend (concurrent stdout/stderr draining via
//! `tokio::select!` over `BufReader::lines()`). Unlike the enrichment
//! repository, stdout lines are parsed and forwarded one at a time as they
//! arrive rather than batch-parsed after the process exits — the
//! orchestrator needs to post `thought`/`action` entries as they happen.

use crate::agent::{AgentAdapterError, AgentEvent, AgentHandle, AgentRunner, StartRequest};
use crate::credential;
use async_trait::async_trait;
use cyrus_core::AgentToken;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

const GRACEFUL_STOP_TIMEOUT: Duration = Duration::from_secs(5);

struct RunningAgent {
    child: Arc<tokio::sync::Mutex<Child>>,
}

/// Spawns the agent binary as a direct child process on the local host.
pub struct LocalAgentRunner {
    /// Path to the agent CLI binary (e.g. `claude`).
    agent_bin: String,
    running: Mutex<HashMap<String, RunningAgent>>,
}

impl LocalAgentRunner {
    pub fn new(agent_bin: impl Into<String>) -> Self {
        Self { agent_bin: agent_bin.into(), running: Mutex::new(HashMap::new()) }
    }

    async fn spawn_process(
        &self,
        request: StartRequest,
        resume: bool,
    ) -> Result<AgentHandle, AgentAdapterError> {
        tokio::fs::create_dir_all(&request.workspace_path).await?;

        let mut cmd = Command::new(&self.agent_bin);
        cmd.arg("--output-format")
            .arg("stream-json")
            .arg("--append-system-prompt")
            .arg(&request.system_prompt)
            .arg("--allowedTools")
            .arg(request.allowed_tools.join(","));
        if !request.disallowed_tools.is_empty() {
            cmd.arg("--disallowedTools").arg(request.disallowed_tools.join(","));
        }
        for dir in &request.extra_readable_dirs {
            cmd.arg("--add-dir").arg(dir);
        }
        if resume {
            let token = request
                .resume_token
                .as_ref()
                .ok_or_else(|| AgentAdapterError::SpawnFailed("resume requires a token".into()))?;
            cmd.arg("--resume").arg(token.as_str());
        }
        cmd.arg("--print").arg(&request.prompt);

        cmd.current_dir(&request.workspace_path)
            .kill_on_drop(true)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(cred) = credential::resolve() {
            let (key, value) = cred.to_env_pair();
            cmd.env(key, value);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| AgentAdapterError::SpawnFailed(format!("failed to spawn {}: {}", self.agent_bin, e)))?;

        let Some(stdout) = child.stdout.take() else {
            return Err(AgentAdapterError::SpawnFailed("child process had no stdout pipe".into()));
        };
        let Some(stderr) = child.stderr.take() else {
            return Err(AgentAdapterError::SpawnFailed("child process had no stderr pipe".into()));
        };
        let child = Arc::new(tokio::sync::Mutex::new(child));

        let (tx, rx) = mpsc::channel(64);
        let drain_child = child.clone();
        tokio::spawn(drain_streams(stdout, stderr, drain_child, tx));

        // The token isn't known until the child emits `system_init`; callers
        // that need it immediately (for registry keying before any event
        // arrives) use a process-local placeholder derived from the pid.
        let placeholder = format!("pending-{}", uuid::Uuid::new_v4().simple());
        self.running.lock().insert(placeholder.clone(), RunningAgent { child });

        Ok(AgentHandle { agent_token: AgentToken::new(placeholder), events: rx })
    }
}

#[async_trait]
impl AgentRunner for LocalAgentRunner {
    async fn start(&self, request: StartRequest) -> Result<AgentHandle, AgentAdapterError> {
        self.spawn_process(request, false).await
    }

    async fn resume(&self, request: StartRequest) -> Result<AgentHandle, AgentAdapterError> {
        self.spawn_process(request, true).await
    }

    async fn stop(&self, agent_token: &AgentToken) -> Result<(), AgentAdapterError> {
        let child = {
            let mut running = self.running.lock();
            running.remove(agent_token.as_str()).map(|a| a.child)
        };
        let Some(child) = child else {
            return Err(AgentAdapterError::NotFound(agent_token.as_str().to_string()));
        };

        {
            let mut guard = child.lock().await;
            if let Some(pid) = guard.id() {
                send_sigterm(pid);
            }
            if tokio::time::timeout(GRACEFUL_STOP_TIMEOUT, guard.wait()).await.is_err() {
                let _ = guard.kill().await;
            }
        }
        Ok(())
    }

    async fn is_running(&self, agent_token: &AgentToken) -> bool {
        let child = {
            let running = self.running.lock();
            running.get(agent_token.as_str()).map(|a| a.child.clone())
        };
        let Some(child) = child else { return false };
        let mut guard = child.lock().await;
        matches!(guard.try_wait(), Ok(None))
    }
}

#[cfg(unix)]
fn send_sigterm(pid: u32) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    // Best-effort: a failed send (process already gone) is not observable
    // to the caller and is ignored.
    let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
}

#[cfg(not(unix))]
fn send_sigterm(_pid: u32) {}

async fn drain_streams(
    stdout: tokio::process::ChildStdout,
    stderr: tokio::process::ChildStderr,
    child: Arc<tokio::sync::Mutex<Child>>,
    tx: mpsc::Sender<AgentEvent>,
) {
    let mut stdout_lines = BufReader::new(stdout).lines();
    let mut stderr_lines = BufReader::new(stderr).lines();

    loop {
        tokio::select! {
            line = stdout_lines.next_line() => {
                match line {
                    Ok(Some(l)) => {
                        if let Some(event) = parse_event_line(&l) {
                            if tx.send(event).await.is_err() {
                                break;
                            }
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!(error = %e, "error reading agent stdout");
                        break;
                    }
                }
            }
            line = stderr_lines.next_line() => {
                if let Ok(Some(l)) = line {
                    if !l.is_empty() {
                        tracing::warn!(stderr = %l, "agent stderr");
                    }
                }
            }
        }
    }

    let exit_code = {
        let mut guard = child.lock().await;
        guard.wait().await.ok().and_then(|status| status.code())
    };
    let _ = tx.send(AgentEvent::End { exit_code }).await;
}

fn parse_event_line(line: &str) -> Option<AgentEvent> {
    if line.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<AgentEvent>(line) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!(error = %e, line = %line, "unparseable agent event line");
            None
        }
    }
}

#[cfg(test)]
#[path = "local_runner_tests.rs"]
mod tests;
