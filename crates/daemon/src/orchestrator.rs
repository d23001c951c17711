// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Session Orchestrator — the central component. Glues the
//! Webhook Router's decisions to the Workspace Provisioner, the Procedure
//! Engine, the Agent Runner Adapter, and the Persistence Store.
//!
//! Concurrency contract: every session mutation happens behind that
//! session's own [`tokio::sync::Mutex`] (held by [`crate::store::SessionStore`]);
//! the one cross-session operation ([`SessionOrchestrator::deliver_feedback_to_child`])
//! runs fire-and-forget in its own task rather than blocking the caller on a
//! second session's lock.

use crate::error::DaemonError;
use crate::prompt;
use crate::store::{SessionHandle, SessionStore};
use async_trait::async_trait;
use cyrus_adapters::{
    derive_branch_name, AgentEvent, AgentRunner, ProvisionRequest, StartRequest, TrackerClient, WorkspaceProvisioner,
};
use cyrus_core::{
    AgentSession, AgentToken, Clock, Entry, EntryKind, IssueId, IssueRef, Phase, PromptVariant, RepositoryConfig,
    RepositoryId, SessionId, SessionStatus, ThreadType,
};
use cyrus_engine::{advance, current_phase, initialize, is_complete, procedure_for_labels, reinitialize};
use cyrus_storage::{ParentChildMap, Snapshot, SnapshotSource, SnapshotWriter};
use cyrus_wire::{AgentActivityContent, AgentActivityRecord, AgentSessionPayload, IssuePayload};
use parking_lot::{Mutex as SyncMutex, RwLock};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Grace period between asking the agent runner to stop and declaring the
/// phase abandoned: graceful signal, then hard terminate after 5s.
const STOP_GRACE: Duration = Duration::from_secs(5);

struct RunningPhase {
    agent_token: AgentToken,
    preempt: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

/// Everything the orchestrator needs constructed once at startup and
/// shared across every session.
pub struct SessionOrchestrator<C: Clock> {
    pub store: Arc<SessionStore>,
    repositories: RwLock<HashMap<RepositoryId, RepositoryConfig>>,
    parent_child: RwLock<ParentChildMap>,
    tracker: Arc<dyn TrackerClient>,
    agent_runner: Arc<dyn AgentRunner>,
    workspace_provisioner: Arc<dyn WorkspaceProvisioner>,
    clock: C,
    // Set once, after the orchestrator itself is wrapped in an `Arc` and
    // handed to `SnapshotWriter::spawn` as its `SnapshotSource` — the two
    // are mutually referential, so construction is two-phase.
    snapshot_writer: OnceLock<SnapshotWriter>,
    repository_config_path: PathBuf,
    global_setup_script: Option<PathBuf>,
    running: SyncMutex<HashMap<SessionId, RunningPhase>>,
}

impl<C: Clock + 'static> SessionOrchestrator<C> {
    pub fn new(
        store: Arc<SessionStore>,
        repositories: Vec<RepositoryConfig>,
        tracker: Arc<dyn TrackerClient>,
        agent_runner: Arc<dyn AgentRunner>,
        workspace_provisioner: Arc<dyn WorkspaceProvisioner>,
        clock: C,
        repository_config_path: PathBuf,
        global_setup_script: Option<PathBuf>,
    ) -> Self {
        let repositories = repositories.into_iter().map(|r| (r.id.clone(), r)).collect();
        Self {
            store,
            repositories: RwLock::new(repositories),
            parent_child: RwLock::new(ParentChildMap::new()),
            tracker,
            agent_runner,
            workspace_provisioner,
            clock,
            snapshot_writer: OnceLock::new(),
            repository_config_path,
            global_setup_script,
            running: SyncMutex::new(HashMap::new()),
        }
    }

    /// Wire up the snapshot writer once this orchestrator is behind an
    /// `Arc` (the writer needs `Arc<dyn SnapshotSource>`, which it can only
    /// become after construction). Calling this twice is a programming
    /// error; only startup code should ever call it.
    pub fn set_snapshot_writer(&self, writer: SnapshotWriter) {
        if self.snapshot_writer.set(writer).is_err() {
            tracing::warn!("snapshot writer already set, ignoring");
        }
    }

    pub fn repository_config_path(&self) -> &std::path::Path {
        &self.repository_config_path
    }

    /// The active snapshot of configured repositories, in insertion order —
    /// the Webhook Router's input.
    pub fn repositories_snapshot(&self) -> Vec<RepositoryConfig> {
        self.repositories.read().values().cloned().collect()
    }

    /// Replace the parent/child map wholesale — used once, by crash
    /// recovery, to seed it from the loaded snapshot.
    pub(crate) fn restore_parent_child_map(&self, map: ParentChildMap) {
        *self.parent_child.write() = map;
    }

    /// Resume a session after process restart:
    /// `current_agent_pid` is already cleared by the caller, so this always
    /// resumes with the session's last known agent token rather than
    /// deciding between `start`/`resume` the way a fresh prompt would.
    pub(crate) async fn resume_after_crash(self: &Arc<Self>, session_id: SessionId) -> Result<(), DaemonError> {
        let Some(handle) = self.store.get(&session_id) else {
            return Err(DaemonError::SessionNotFound(session_id.as_str().to_string()));
        };
        let (repo, variant, resume_token) = {
            let session = handle.lock().await;
            let repo = self.repository(&session.repository_id)?;
            let (_, variant) = procedure_name_and_variant(&repo, &session.issue_ref.labels, false);
            (repo, variant, session.current_agent_session_token.clone())
        };
        let prompt_text = "Resuming after an unexpected restart. Continue from where you left off.".to_string();
        self.spawn_phase_task(session_id, repo, variant, prompt_text, resume_token);
        Ok(())
    }

    fn repository(&self, id: &RepositoryId) -> Result<RepositoryConfig, DaemonError> {
        self.repositories.read().get(id).cloned().ok_or_else(|| DaemonError::RepositoryNotFound(id.as_str().to_string()))
    }

    fn persist(&self) {
        if let Some(writer) = self.snapshot_writer.get() {
            writer.request();
        }
    }

    /// `handleSessionCreated(event, repo)` — idempotent on `sessionId`.
    pub async fn handle_session_created(
        self: &Arc<Self>,
        payload: &AgentSessionPayload,
        repository_id: &RepositoryId,
    ) -> Result<(), DaemonError> {
        let session_id = SessionId::new(payload.id.clone());
        if self.store.get(&session_id).is_some() {
            tracing::info!(session_id = %session_id, "session already exists, ignoring duplicate session-created event");
            return Ok(());
        }

        let repo = self.repository(repository_id)?;
        let issue_ref = issue_ref_from_payload(&payload.issue);
        let parent_branch = issue_ref.parent.as_ref().map(|p| derive_branch_name(&p.identifier, &p.title));

        let workspace = self
            .workspace_provisioner
            .provision(
                &repo,
                ProvisionRequest {
                    issue_id: issue_ref.id.as_str().to_string(),
                    issue_identifier: issue_ref.identifier.clone(),
                    issue_title: issue_ref.title.clone(),
                    branch_name_hint: None,
                    parent_branch,
                },
                self.global_setup_script.as_deref(),
            )
            .await;

        // The wire payload carries no "issue is closed" signal, so the
        // `is_closed_comment_only` collapse to `simple-question` is decided
        // purely by label; see DESIGN.md.
        let (procedure_name, variant) = procedure_name_and_variant(&repo, &issue_ref.labels, false);
        let procedure_state = initialize(procedure_name);
        let thread_type = if payload.comment.is_some() { ThreadType::CommentThread } else { ThreadType::IssueRoot };

        let now = self.clock.epoch_ms();
        let mut session =
            AgentSession::new(session_id.clone(), thread_type, issue_ref, repo.id.clone(), workspace, procedure_state, now);
        session.status = SessionStatus::Active;
        let prompt_text = prompt::initial_prompt(&session.issue_ref, payload.comment.as_ref().map(|c| c.body.as_str()));

        self.store.insert(session);
        self.persist();

        self.spawn_phase_task(session_id, repo, variant, prompt_text, None);
        Ok(())
    }

    /// `handleSessionPrompted(event, repo)` — resume, pre-empting a running
    /// agent if one is alive.
    pub async fn handle_session_prompted(
        self: &Arc<Self>,
        payload: &AgentSessionPayload,
        repository_id: &RepositoryId,
    ) -> Result<(), DaemonError> {
        let session_id = SessionId::new(payload.id.clone());
        let Some(handle) = self.store.get(&session_id) else {
            return self.handle_session_created(payload, repository_id).await;
        };

        if self.running.lock().contains_key(&session_id) {
            self.preempt_running_phase(&session_id).await;
        }

        let body = payload.comment.as_ref().map(|c| c.body.as_str()).unwrap_or_default();
        let framed_prompt = prompt::new_message_from_user(body);
        let repo = self.repository(repository_id)?;

        let (variant, resume_token) = {
            let mut session = handle.lock().await;
            let (_, variant) = procedure_name_and_variant(&repo, &session.issue_ref.labels, false);

            // A prompt arriving on an already-completed (or errored) session
            // starts a fresh procedure run rather than trying to advance
            // past `isComplete`.
            if matches!(session.status, SessionStatus::Complete | SessionStatus::Errored) {
                let (procedure_name, _) = procedure_name_and_variant(&repo, &session.issue_ref.labels, false);
                session.procedure_state = reinitialize(procedure_name);
            }
            session.status = SessionStatus::Active;
            (variant, session.current_agent_session_token.clone())
        };

        self.persist();
        self.spawn_phase_task(session_id, repo, variant, framed_prompt, resume_token);
        Ok(())
    }

    /// `handleSessionStopSignal(event, repo)`.
    pub async fn handle_session_stop_signal(&self, payload: &AgentSessionPayload, actor_name: &str) -> Result<(), DaemonError> {
        let session_id = SessionId::new(payload.id.clone());
        let Some(handle) = self.store.get(&session_id) else {
            return Err(DaemonError::SessionNotFound(session_id.as_str().to_string()));
        };

        if let Some(running) = self.running.lock().remove(&session_id) {
            running.preempt.store(true, Ordering::Release);
            let _ = self.agent_runner.stop(&running.agent_token).await;
            let _ = tokio::time::timeout(STOP_GRACE, running.task).await;
        }

        let now = self.clock.epoch_ms();
        let mut session = handle.lock().await;
        let text = format!("The agent stopped working.\n\n**Stop Signal:** Received from {actor_name}");
        session.push_entry(Entry::response(text, &self.clock), now);
        session.current_agent_pid = None;
        session.status = SessionStatus::Complete;
        drop(session);
        self.persist();
        Ok(())
    }

    /// `deliverFeedbackToChild(childSessionId, feedback)` — must return
    /// quickly; the actual resume runs concurrently in a spawned task so a
    /// parent phase never blocks on a child's lock.
    pub fn deliver_feedback_to_child(self: &Arc<Self>, child_session_id: SessionId, feedback: String) {
        let this = self.clone();
        tokio::spawn(async move {
            let Some(handle) = this.store.get(&child_session_id) else {
                tracing::warn!(session_id = %child_session_id, "feedback delivery target not found");
                return;
            };
            let (repo_id, resume_token) = {
                let session = handle.lock().await;
                (session.repository_id.clone(), session.current_agent_session_token.clone())
            };
            let Ok(repo) = this.repository(&repo_id) else { return };
            let variant = {
                let session = handle.lock().await;
                procedure_name_and_variant(&repo, &session.issue_ref.labels, false).1
            };
            let framed = prompt::feedback_from_orchestrator(&feedback);
            this.spawn_phase_task(child_session_id, repo, variant, framed, resume_token);
        });
    }

    /// Record that `child` was spawned by `parent` (the parent/child
    /// Map" — populated when a coordinator phase delegates to a sub-issue).
    pub async fn register_child(&self, child: SessionId, parent: SessionId) {
        if let Some(handle) = self.store.get(&child) {
            handle.lock().await.parent_session_id = Some(parent.clone());
        }
        self.parent_child.write().insert(child, parent);
        self.persist();
    }

    /// Remove every child mapping rooted at `parent` — called when the
    /// parent session itself ends.
    pub fn clear_children_of(&self, parent: &SessionId) {
        self.parent_child.write().retain(|_, p| p != parent);
        self.persist();
    }

    async fn preempt_running_phase(&self, session_id: &SessionId) {
        if let Some(running) = self.running.lock().remove(session_id) {
            running.preempt.store(true, Ordering::Release);
            let _ = self.agent_runner.stop(&running.agent_token).await;
            let _ = tokio::time::timeout(STOP_GRACE, running.task).await;
        }
    }

    /// Spawn the task that owns one phase invocation end-to-end: start or
    /// resume the agent, drain its event stream, post non-suppressed
    /// entries to the tracker, and advance the procedure on a clean `end`.
    fn spawn_phase_task(
        self: &Arc<Self>,
        session_id: SessionId,
        repo: RepositoryConfig,
        variant: PromptVariant,
        prompt_text: String,
        resume_token: Option<AgentToken>,
    ) {
        let this = self.clone();
        let preempt = Arc::new(AtomicBool::new(false));
        let preempt_for_task = preempt.clone();
        let sid = session_id.clone();

        let task = tokio::spawn(async move {
            this.run_phase(sid, repo, variant, prompt_text, resume_token, preempt_for_task).await;
        });

        // A placeholder until the real token arrives on `system_init`; good
        // enough for `stop`'s best-effort lookup in the meantime.
        self.running.lock().insert(session_id, RunningPhase { agent_token: AgentToken::new("pending"), preempt, task });
    }

    async fn run_phase(
        self: Arc<Self>,
        session_id: SessionId,
        repo: RepositoryConfig,
        variant: PromptVariant,
        prompt_text: String,
        resume_token: Option<AgentToken>,
        preempted: Arc<AtomicBool>,
    ) {
        let Some(handle) = self.store.get(&session_id) else { return };

        let (workspace_path, allowed_tools, disallowed_tools, phase): (PathBuf, Vec<String>, Vec<String>, Phase) = {
            let session = handle.lock().await;
            let Some(phase) = current_phase(&session.procedure_state) else { return };
            let allowed = phase.tool_allow_list.clone().unwrap_or_else(|| repo.allowed_tools.clone());
            (session.workspace.path.clone(), allowed, repo.disallowed_tools.clone(), phase)
        };

        let system_prompt = prompt::system_prompt(variant, &phase);
        let request = StartRequest {
            workspace_path,
            prompt: prompt_text,
            allowed_tools,
            disallowed_tools,
            system_prompt,
            resume_token: resume_token.clone(),
            extra_readable_dirs: Vec::new(),
        };

        let spawned =
            if resume_token.is_some() { self.agent_runner.resume(request).await } else { self.agent_runner.start(request).await };

        let mut agent_handle = match spawned {
            Ok(h) => h,
            Err(e) => {
                tracing::error!(session_id = %session_id, error = %e, "failed to spawn agent");
                self.running.lock().remove(&session_id);
                self.mark_errored(&session_id, &format!("failed to start agent: {e}")).await;
                return;
            }
        };

        if let Some(running) = self.running.lock().get_mut(&session_id) {
            running.agent_token = agent_handle.agent_token.clone();
        }
        self.store.register_agent_token(agent_handle.agent_token.clone(), session_id.clone());
        {
            let mut session = handle.lock().await;
            // `LocalAgentRunner` exposes no real OS pid; `0` only ever needs
            // to satisfy `AgentSession::has_live_agent`'s `is_some()` check.
            session.current_agent_pid = Some(0);
            session.current_agent_session_token = Some(agent_handle.agent_token.clone());
        }
        self.persist();

        let suppress = phase.suppress_intermediate_output;
        let mut errored = false;
        let mut exit_code = None;

        while let Some(event) = agent_handle.events.recv().await {
            if preempted.load(Ordering::Acquire) {
                break;
            }
            match event {
                AgentEvent::SystemInit { agent_token, .. } => {
                    let token = AgentToken::new(agent_token);
                    self.store.register_agent_token(token.clone(), session_id.clone());
                    if let Some(running) = self.running.lock().get_mut(&session_id) {
                        running.agent_token = token.clone();
                    }
                    handle.lock().await.current_agent_session_token = Some(token);
                }
                AgentEvent::Thought { text } => {
                    self.record_entry(&handle, Entry::thought(text.clone(), &self.clock)).await;
                    if !suppress {
                        self.post_activity(&repo, &session_id, AgentActivityContent::Thought { text }).await;
                    }
                }
                AgentEvent::Action { tool_name, inputs } => {
                    self.record_entry(&handle, Entry::action(tool_name.clone(), inputs.clone(), &self.clock)).await;
                    if !suppress {
                        self.post_activity(&repo, &session_id, AgentActivityContent::Action { tool_name, inputs }).await;
                    }
                }
                AgentEvent::ActionResult { tool_name, outputs } => {
                    self.record_entry(
                        &handle,
                        Entry::new(EntryKind::Result, serde_json::json!({"toolName": tool_name, "outputs": outputs}), &self.clock),
                    )
                    .await;
                }
                AgentEvent::Response { text } => {
                    self.record_entry(&handle, Entry::response(text.clone(), &self.clock)).await;
                    self.post_activity(&repo, &session_id, AgentActivityContent::Response { text }).await;
                }
                AgentEvent::Error { message } => {
                    errored = true;
                    self.record_entry(&handle, Entry::response(format!("Agent error: {message}"), &self.clock)).await;
                    self.post_activity(&repo, &session_id, AgentActivityContent::Response { text: message }).await;
                }
                AgentEvent::End { exit_code: code } => {
                    exit_code = Some(code);
                }
            }
        }

        self.running.lock().remove(&session_id);
        handle.lock().await.current_agent_pid = None;

        if preempted.load(Ordering::Acquire) {
            // Pre-empted mid-phase: the new phase run
            // this pre-emption triggered already started, so the procedure
            // must not be advanced here.
            self.persist();
            return;
        }

        let failed = errored || matches!(exit_code, Some(Some(code)) if code != 0);
        if failed {
            self.mark_errored(&session_id, "agent exited non-zero during phase").await;
            return;
        }

        self.on_phase_end(session_id, agent_handle.agent_token).await;
    }

    async fn record_entry(&self, handle: &SessionHandle, entry: Entry) {
        let now = self.clock.epoch_ms();
        let mut session = handle.lock().await;
        session.push_entry(entry, now);
    }

    async fn post_activity(&self, repo: &RepositoryConfig, session_id: &SessionId, content: AgentActivityContent) {
        let record = AgentActivityRecord { session_id: session_id.as_str().to_string(), content };
        if let Err(e) = self.tracker.post_activity(&repo.tracker_token, &record).await {
            tracing::warn!(session_id = %session_id, error = %e, "failed to post activity to tracker");
        }
    }

    /// `handleAgentPhaseEnd(session, phase, agentToken, exitCode)`.
    async fn on_phase_end(self: Arc<Self>, session_id: SessionId, agent_token: AgentToken) {
        let Some(handle) = self.store.get(&session_id) else { return };
        let now = self.clock.epoch_ms();

        let next = {
            let mut session = handle.lock().await;
            advance(&mut session.procedure_state, Some(agent_token.as_str().to_string()), now);

            if is_complete(&session.procedure_state) {
                session.status = SessionStatus::Complete;
                None
            } else {
                match self.repository(&session.repository_id) {
                    Ok(repo) => {
                        let (_, variant) = procedure_name_and_variant(&repo, &session.issue_ref.labels, false);
                        let prompt_text = format!("Continue with the next phase for {}.", session.issue_ref.identifier);
                        Some((repo, variant, prompt_text))
                    }
                    Err(_) => None,
                }
            }
        };

        self.persist();

        if let Some((repo, variant, prompt_text)) = next {
            self.spawn_phase_task(session_id, repo, variant, prompt_text, Some(agent_token));
        }
    }

    async fn mark_errored(&self, session_id: &SessionId, reason: &str) {
        let Some(handle) = self.store.get(session_id) else { return };
        let now = self.clock.epoch_ms();
        let mut session = handle.lock().await;
        session.status = SessionStatus::Errored;
        session.current_agent_pid = None;
        session.push_entry(Entry::response(reason.to_string(), &self.clock), now);
        drop(session);
        self.persist();
    }
}

#[async_trait]
impl<C: Clock + 'static> SnapshotSource for SessionOrchestrator<C> {
    async fn snapshot(&self) -> Snapshot {
        let mut snap = Snapshot::new(self.repository_config_path.clone());
        for id in self.store.all_session_ids() {
            if let Some(handle) = self.store.get(&id) {
                let guard = handle.lock().await;
                snap.sessions.insert(id, guard.clone());
            }
        }
        snap.parent_child_map = self.parent_child.read().clone();
        snap
    }
}

fn procedure_name_and_variant(
    repo: &RepositoryConfig,
    labels: &[String],
    is_closed_comment_only: bool,
) -> (cyrus_core::ProcedureName, PromptVariant) {
    let (name, variant) = procedure_for_labels(labels, is_closed_comment_only);
    let variant = labels.iter().find_map(|label| repo.label_prompts.get(label).copied()).unwrap_or(variant);
    (name, variant)
}

fn issue_ref_from_payload(payload: &IssuePayload) -> IssueRef {
    IssueRef {
        id: IssueId::new(payload.id.clone()),
        identifier: payload.identifier.clone(),
        title: payload.title.clone(),
        labels: payload.labels.clone(),
        parent: payload.parent.as_ref().map(|p| Box::new(issue_ref_from_payload(p))),
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
