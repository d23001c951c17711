// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent Runner Adapter: owns the lifecycle of one child
//! process per running phase and streams its structured output back to the
//! Session Orchestrator.

use async_trait::async_trait;
use cyrus_core::AgentToken;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Everything the Procedure Engine resolved for one phase invocation.
#[derive(Debug, Clone)]
pub struct StartRequest {
    pub workspace_path: PathBuf,
    pub prompt: String,
    pub allowed_tools: Vec<String>,
    pub disallowed_tools: Vec<String>,
    pub system_prompt: String,
    /// Set on `resume`: the token a prior `system_init` event returned.
    pub resume_token: Option<AgentToken>,
    pub extra_readable_dirs: Vec<PathBuf>,
}

/// One structured event emitted by the agent subprocess, newline-delimited
/// JSON on its stdout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    SystemInit { agent_token: String, model: String },
    Thought { text: String },
    Action { tool_name: String, inputs: serde_json::Value },
    ActionResult { tool_name: String, outputs: serde_json::Value },
    Response { text: String },
    Error { message: String },
    End { exit_code: Option<i32> },
}

#[derive(Debug, thiserror::Error)]
pub enum AgentAdapterError {
    #[error("failed to spawn agent process: {0}")]
    SpawnFailed(String),
    #[error("agent token not found: {0}")]
    NotFound(String),
    #[error("i/o error talking to agent process: {0}")]
    Io(#[from] std::io::Error),
}

/// Handle returned from `start`/`resume`: the token the orchestrator records
/// on the session, plus the event stream it must fully consume.
pub struct AgentHandle {
    pub agent_token: AgentToken,
    pub events: mpsc::Receiver<AgentEvent>,
}

#[async_trait]
pub trait AgentRunner: Send + Sync + 'static {
    /// Spawn a fresh agent process for a new phase.
    async fn start(&self, request: StartRequest) -> Result<AgentHandle, AgentAdapterError>;

    /// Resume a prior conversation. `request.resume_token` must be `Some`;
    /// `request.system_prompt` must be re-passed identically to `start`
    /// — callers are responsible for that, the
    /// adapter does not re-derive it.
    async fn resume(&self, request: StartRequest) -> Result<AgentHandle, AgentAdapterError>;

    /// Graceful termination; callers that need a hard deadline race this
    /// against their own timeout: graceful signal, then hard
    /// terminate after 5s.
    async fn stop(&self, agent_token: &AgentToken) -> Result<(), AgentAdapterError>;

    async fn is_running(&self, agent_token: &AgentToken) -> bool;
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
