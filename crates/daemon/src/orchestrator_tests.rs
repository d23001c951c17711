// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::store::SessionStore;
use cyrus_adapters::fake::{FakeAgentRunner, FakeTrackerClient, FakeWorkspaceProvisioner};
use cyrus_adapters::AgentEvent;
use cyrus_core::{FakeClock, RepositoryId, SessionStatus};
use cyrus_wire::{AgentSessionPayload, CommentPayload, IssuePayload, UserPayload};
use cyrus_storage::SnapshotSource;
use std::time::Duration;

fn repo(workspace_root: std::path::PathBuf) -> RepositoryConfig {
    RepositoryConfig {
        id: RepositoryId::new("repo-1"),
        name: "repo-1".to_string(),
        root_path: "/repos/one".into(),
        base_branch: "main".to_string(),
        workspace_root,
        tracker_token: "token".to_string(),
        tracker_workspace_id: "org-1".to_string(),
        team_keys: Vec::new(),
        project_keys: Vec::new(),
        allowed_tools: vec!["Read".to_string()],
        disallowed_tools: Vec::new(),
        label_prompts: Default::default(),
        is_active: true,
    }
}

fn issue_payload(id: &str, identifier: &str) -> IssuePayload {
    IssuePayload { id: id.to_string(), identifier: identifier.to_string(), title: "Some issue".to_string(), labels: Vec::new(), project: None, parent: None }
}

fn session_payload(id: &str, issue: IssuePayload, comment: Option<&str>) -> AgentSessionPayload {
    AgentSessionPayload {
        id: id.to_string(),
        issue,
        team: None,
        comment: comment.map(|body| CommentPayload {
            body: body.to_string(),
            user: Some(UserPayload { name: "alice".to_string() }),
        }),
        agent_activity: None,
    }
}

struct Harness {
    orchestrator: Arc<SessionOrchestrator<FakeClock>>,
    agent_runner: Arc<FakeAgentRunner>,
    tracker: Arc<FakeTrackerClient>,
    _workspace_root: tempfile::TempDir,
}

fn harness() -> Harness {
    let workspace_root = tempfile::tempdir().expect("tempdir");
    let agent_runner = Arc::new(FakeAgentRunner::new());
    let tracker = Arc::new(FakeTrackerClient::new());
    let orchestrator = Arc::new(SessionOrchestrator::new(
        Arc::new(SessionStore::new()),
        vec![repo(workspace_root.path().to_path_buf())],
        tracker.clone(),
        agent_runner.clone(),
        Arc::new(FakeWorkspaceProvisioner),
        FakeClock::new(),
        "/cyrus-home/config.json".into(),
        None,
    ));
    Harness { orchestrator, agent_runner, tracker, _workspace_root: workspace_root }
}

/// Queue the two scripts a `simple-question` procedure needs. `FakeAgentRunner`
/// pops scripts LIFO, so the phase that should run *first* must be queued *last*.
fn queue_simple_question_scripts(agent_runner: &FakeAgentRunner, agent_token: &str) {
    agent_runner.queue_script(vec![
        AgentEvent::Response { text: "Here is a concise summary.".to_string() },
        AgentEvent::End { exit_code: Some(0) },
    ]);
    agent_runner.queue_script(vec![
        AgentEvent::SystemInit { agent_token: agent_token.to_string(), model: "test-model".to_string() },
        AgentEvent::Thought { text: "thinking it through".to_string() },
        AgentEvent::Response { text: "Here is my answer.".to_string() },
        AgentEvent::End { exit_code: Some(0) },
    ]);
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition was never satisfied");
}

#[tokio::test]
async fn handle_session_created_runs_the_full_procedure_to_completion() {
    let h = harness();
    queue_simple_question_scripts(&h.agent_runner, "tok-1");

    let payload = session_payload("sess-1", issue_payload("issue-1", "ENG-1"), Some("please help"));
    h.orchestrator.handle_session_created(&payload, &RepositoryId::new("repo-1")).await.expect("handled");

    let handle = h.orchestrator.store.get(&SessionId::new("sess-1")).expect("session exists");
    wait_until(|| matches!(handle.try_lock().map(|s| s.status), Ok(SessionStatus::Complete))).await;

    let session = handle.lock().await;
    assert_eq!(session.status, SessionStatus::Complete);
    assert!(session.current_agent_pid.is_none());
    assert_eq!(session.procedure_state.history.len(), 2);
    assert!(session.entries().iter().any(|e| matches!(e.kind, cyrus_core::EntryKind::Response)));

    assert!(!h.tracker.posted.lock().is_empty());
}

#[tokio::test]
async fn handle_session_created_is_idempotent_on_duplicate_session_id() {
    let h = harness();
    queue_simple_question_scripts(&h.agent_runner, "tok-1");

    let payload = session_payload("sess-1", issue_payload("issue-1", "ENG-1"), None);
    h.orchestrator.handle_session_created(&payload, &RepositoryId::new("repo-1")).await.expect("first call");
    h.orchestrator.handle_session_created(&payload, &RepositoryId::new("repo-1")).await.expect("second call is a no-op");

    assert_eq!(h.orchestrator.store.len(), 1);
}

#[tokio::test]
async fn handle_session_created_rejects_unknown_repository() {
    let h = harness();
    let payload = session_payload("sess-1", issue_payload("issue-1", "ENG-1"), None);
    let err = h.orchestrator.handle_session_created(&payload, &RepositoryId::new("no-such-repo")).await.unwrap_err();
    assert!(matches!(err, DaemonError::RepositoryNotFound(_)));
}

#[tokio::test]
async fn handle_session_prompted_on_unknown_session_creates_it() {
    let h = harness();
    queue_simple_question_scripts(&h.agent_runner, "tok-1");

    let payload = session_payload("sess-1", issue_payload("issue-1", "ENG-1"), Some("hello"));
    h.orchestrator.handle_session_prompted(&payload, &RepositoryId::new("repo-1")).await.expect("handled");

    assert!(h.orchestrator.store.get(&SessionId::new("sess-1")).is_some());
}

#[tokio::test]
async fn handle_session_prompted_restarts_a_completed_session() {
    let h = harness();
    queue_simple_question_scripts(&h.agent_runner, "tok-1");
    let created = session_payload("sess-1", issue_payload("issue-1", "ENG-1"), None);
    h.orchestrator.handle_session_created(&created, &RepositoryId::new("repo-1")).await.expect("created");

    let handle = h.orchestrator.store.get(&SessionId::new("sess-1")).expect("session exists");
    wait_until(|| matches!(handle.try_lock().map(|s| s.status), Ok(SessionStatus::Complete))).await;

    queue_simple_question_scripts(&h.agent_runner, "tok-2");
    let prompted = session_payload("sess-1", issue_payload("issue-1", "ENG-1"), Some("one more thing"));
    h.orchestrator.handle_session_prompted(&prompted, &RepositoryId::new("repo-1")).await.expect("prompted");

    wait_until(|| matches!(handle.try_lock().map(|s| s.procedure_state.history.len()), Ok(n) if n == 2)).await;
    assert_eq!(handle.lock().await.status, SessionStatus::Complete);
}

#[tokio::test]
async fn handle_session_stop_signal_marks_the_session_complete() {
    let h = harness();
    queue_simple_question_scripts(&h.agent_runner, "tok-1");
    let payload = session_payload("sess-1", issue_payload("issue-1", "ENG-1"), None);
    h.orchestrator.handle_session_created(&payload, &RepositoryId::new("repo-1")).await.expect("created");

    h.orchestrator.handle_session_stop_signal(&payload, "bob").await.expect("stop handled");

    let handle = h.orchestrator.store.get(&SessionId::new("sess-1")).expect("session exists");
    let session = handle.lock().await;
    assert_eq!(session.status, SessionStatus::Complete);
    assert!(session.current_agent_pid.is_none());
    assert!(session.entries().iter().any(|e| {
        e.payload.get("text").and_then(|t| t.as_str()).map(|t| t.contains("Stop Signal")).unwrap_or(false)
    }));
}

#[tokio::test]
async fn handle_session_stop_signal_on_unknown_session_errors() {
    let h = harness();
    let payload = session_payload("sess-missing", issue_payload("issue-1", "ENG-1"), None);
    let err = h.orchestrator.handle_session_stop_signal(&payload, "bob").await.unwrap_err();
    assert!(matches!(err, DaemonError::SessionNotFound(_)));
}

#[tokio::test]
async fn preempt_running_phase_signals_stop_and_clears_the_running_entry() {
    let h = harness();
    let preempt = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let preempt_for_task = preempt.clone();
    let task = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
    });
    h.orchestrator.running.lock().insert(
        SessionId::new("sess-1"),
        RunningPhase { agent_token: AgentToken::new("tok-running"), preempt: preempt_for_task, task },
    );

    h.orchestrator.preempt_running_phase(&SessionId::new("sess-1")).await;

    assert!(preempt.load(std::sync::atomic::Ordering::Acquire));
    assert!(h.agent_runner.stopped_tokens().contains(&AgentToken::new("tok-running")));
    assert!(h.orchestrator.running.lock().get(&SessionId::new("sess-1")).is_none());
}

#[tokio::test]
async fn register_and_clear_children_updates_the_parent_child_map() {
    let h = harness();
    queue_simple_question_scripts(&h.agent_runner, "tok-1");
    let payload = session_payload("child-1", issue_payload("issue-1", "ENG-1"), None);
    h.orchestrator.handle_session_created(&payload, &RepositoryId::new("repo-1")).await.expect("created");

    h.orchestrator.register_child(SessionId::new("child-1"), SessionId::new("parent-1")).await;
    let snap = h.orchestrator.snapshot().await;
    assert_eq!(snap.parent_child_map.get(&SessionId::new("child-1")), Some(&SessionId::new("parent-1")));

    h.orchestrator.clear_children_of(&SessionId::new("parent-1"));
    let snap = h.orchestrator.snapshot().await;
    assert!(snap.parent_child_map.is_empty());
}

#[tokio::test]
async fn deliver_feedback_to_child_resumes_a_session_mid_procedure() {
    let h = harness();
    let issue_ref = cyrus_core::IssueRef {
        id: cyrus_core::IssueId::new("issue-1"),
        identifier: "ENG-1".to_string(),
        title: "Some issue".to_string(),
        labels: Vec::new(),
        parent: None,
    };
    let mut session = cyrus_core::AgentSession::new(
        SessionId::new("child-1"),
        cyrus_core::ThreadType::IssueRoot,
        issue_ref,
        RepositoryId::new("repo-1"),
        cyrus_core::Workspace::plain_dir(h._workspace_root.path().join("ENG-1")),
        cyrus_engine::initialize(cyrus_core::ProcedureName::SimpleQuestion),
        1_000,
    );
    session.status = SessionStatus::AwaitingInput;
    session.current_agent_session_token = Some(AgentToken::new("tok-prior"));
    h.orchestrator.store.insert(session);

    queue_simple_question_scripts(&h.agent_runner, "tok-new");
    h.orchestrator.deliver_feedback_to_child(SessionId::new("child-1"), "please also cover mobile".to_string());

    let handle = h.orchestrator.store.get(&SessionId::new("child-1")).expect("session exists");
    wait_until(|| matches!(handle.try_lock().map(|s| s.status), Ok(SessionStatus::Complete))).await;
    assert_eq!(handle.lock().await.procedure_state.history.len(), 2);
}

#[tokio::test]
async fn repositories_snapshot_reflects_constructed_repositories() {
    let h = harness();
    let repos = h.orchestrator.repositories_snapshot();
    assert_eq!(repos.len(), 1);
    assert_eq!(repos[0].id, RepositoryId::new("repo-1"));
}

#[tokio::test]
async fn snapshot_includes_every_live_session() {
    let h = harness();
    queue_simple_question_scripts(&h.agent_runner, "tok-1");
    let payload = session_payload("sess-1", issue_payload("issue-1", "ENG-1"), None);
    h.orchestrator.handle_session_created(&payload, &RepositoryId::new("repo-1")).await.expect("created");

    let snap = h.orchestrator.snapshot().await;
    assert!(snap.sessions.contains_key(&SessionId::new("sess-1")));
    assert_eq!(snap.repository_config_path, std::path::PathBuf::from("/cyrus-home/config.json"));
}
