// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory fakes for the three adapter traits, used by `cyrus-daemon`'s
//! end-to-end scenario tests so they can drive the orchestrator
//! without a real tracker, agent binary, or git remote.

use crate::agent::{AgentAdapterError, AgentEvent, AgentHandle, AgentRunner, StartRequest};
use crate::tracker::{TrackerClient, TrackerClientError};
use crate::workspace::{ProvisionRequest, WorkspaceProvisioner};
use async_trait::async_trait;
use cyrus_core::{AgentToken, RepositoryConfig, Workspace};
use cyrus_wire::AgentActivityRecord;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::mpsc;

/// A scripted agent run: the sequence of events to emit for the next
/// `start`/`resume` call, queued in order and consumed one script per call.
///
/// A script ending in [`AgentEvent::End`] closes its event channel once
/// drained, the way a real agent process exiting would. A script that does
/// *not* end in `End` instead leaves its sender parked in `pending_senders`,
/// so the channel stays open (simulating a still-running agent) until
/// [`FakeAgentRunner::stop`] is called with its token — the way callers
/// testing mid-phase preemption need it to behave.
pub struct FakeAgentRunner {
    scripts: Mutex<Vec<Vec<AgentEvent>>>,
    stopped: Mutex<Vec<AgentToken>>,
    next_token: Mutex<u64>,
    requests: Mutex<Vec<StartRequest>>,
    pending_senders: Mutex<HashMap<AgentToken, mpsc::Sender<AgentEvent>>>,
}

impl FakeAgentRunner {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(Vec::new()),
            stopped: Mutex::new(Vec::new()),
            next_token: Mutex::new(0),
            requests: Mutex::new(Vec::new()),
            pending_senders: Mutex::new(HashMap::new()),
        }
    }

    /// Queue the event sequence the next `start`/`resume` call should emit.
    pub fn queue_script(&self, events: Vec<AgentEvent>) {
        self.scripts.lock().push(events);
    }

    pub fn stopped_tokens(&self) -> Vec<AgentToken> {
        self.stopped.lock().clone()
    }

    /// Every `StartRequest` passed to `start`/`resume` so far, in call order.
    pub fn requests(&self) -> Vec<StartRequest> {
        self.requests.lock().clone()
    }

    async fn run_next_script(&self, request: StartRequest) -> AgentHandle {
        self.requests.lock().push(request);

        let events = self.scripts.lock().pop().unwrap_or_else(|| {
            vec![AgentEvent::Response { text: "(no script queued)".into() }, AgentEvent::End { exit_code: Some(0) }]
        });
        let closes_on_its_own = matches!(events.last(), Some(AgentEvent::End { .. }));
        let token = {
            let mut next = self.next_token.lock();
            *next += 1;
            format!("fake-token-{next}")
        };
        let agent_token = AgentToken::new(token);

        let (tx, rx) = mpsc::channel(events.len().max(1));
        for event in events {
            let _ = tx.send(event).await;
        }
        if closes_on_its_own {
            drop(tx);
        } else {
            self.pending_senders.lock().insert(agent_token.clone(), tx);
        }

        AgentHandle { agent_token, events: rx }
    }
}

impl Default for FakeAgentRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AgentRunner for FakeAgentRunner {
    async fn start(&self, request: StartRequest) -> Result<AgentHandle, AgentAdapterError> {
        Ok(self.run_next_script(request).await)
    }

    async fn resume(&self, request: StartRequest) -> Result<AgentHandle, AgentAdapterError> {
        if request.resume_token.is_none() {
            return Err(AgentAdapterError::SpawnFailed("resume requires a token".into()));
        }
        Ok(self.run_next_script(request).await)
    }

    async fn stop(&self, agent_token: &AgentToken) -> Result<(), AgentAdapterError> {
        self.stopped.lock().push(agent_token.clone());
        self.pending_senders.lock().remove(agent_token);
        Ok(())
    }

    async fn is_running(&self, agent_token: &AgentToken) -> bool {
        self.pending_senders.lock().contains_key(agent_token)
    }
}

/// Records every `agentActivity` posted, so tests can assert on the exact
/// sequence of entries that reached "the tracker".
pub struct FakeTrackerClient {
    pub posted: Mutex<Vec<AgentActivityRecord>>,
    pub project_by_issue: Mutex<HashMap<String, String>>,
}

impl FakeTrackerClient {
    pub fn new() -> Self {
        Self { posted: Mutex::new(Vec::new()), project_by_issue: Mutex::new(HashMap::new()) }
    }

    pub fn set_project(&self, issue_id: impl Into<String>, project: impl Into<String>) {
        self.project_by_issue.lock().insert(issue_id.into(), project.into());
    }
}

impl Default for FakeTrackerClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TrackerClient for FakeTrackerClient {
    async fn post_activity(
        &self,
        _token: &str,
        record: &AgentActivityRecord,
    ) -> Result<(), TrackerClientError> {
        self.posted.lock().push(record.clone());
        Ok(())
    }

    async fn fetch_issue_project(
        &self,
        _token: &str,
        issue_id: &str,
    ) -> Result<Option<String>, TrackerClientError> {
        Ok(self.project_by_issue.lock().get(issue_id).cloned())
    }
}

/// Provisions a plain temp-backed directory instead of a real worktree, so
/// tests don't need a git remote.
pub struct FakeWorkspaceProvisioner;

#[async_trait]
impl WorkspaceProvisioner for FakeWorkspaceProvisioner {
    async fn provision(
        &self,
        repo: &RepositoryConfig,
        request: ProvisionRequest,
        _global_setup_script: Option<&Path>,
    ) -> Workspace {
        let path = repo.workspace_root.join(&request.issue_identifier);
        tokio::fs::create_dir_all(&path).await.ok();
        Workspace::plain_dir(path)
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
