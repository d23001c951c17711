// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use cyrus_adapters::fake::FakeTrackerClient;
use cyrus_core::RepositoryId;

fn repo(id: &str) -> RepositoryConfig {
    RepositoryConfig {
        id: RepositoryId::new(id),
        name: id.to_string(),
        root_path: "/repos/one".into(),
        base_branch: "main".to_string(),
        workspace_root: "/workspaces/one".into(),
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

fn payload(action: EventAction, session: Option<AgentSessionPayload>) -> WebhookPayload {
    WebhookPayload {
        kind: WebhookType::AgentSessionEvent,
        action,
        organization_id: "org-1".to_string(),
        agent_session: session,
        notification: None,
    }
}

fn issue(identifier: &str, project: Option<&str>) -> IssuePayload {
    IssuePayload {
        id: format!("issue-{identifier}"),
        identifier: identifier.to_string(),
        title: "Some issue".to_string(),
        labels: Vec::new(),
        project: project.map(|name| ProjectPayload { name: name.to_string() }),
        parent: None,
    }
}

fn session(issue: IssuePayload, team_key: Option<&str>) -> AgentSessionPayload {
    AgentSessionPayload {
        id: "sess-1".to_string(),
        issue,
        team: team_key.map(|key| TeamPayload { key: key.to_string() }),
        comment: None,
        agent_activity: None,
    }
}

#[tokio::test]
async fn matches_by_project_name_inline() {
    let mut r = repo("proj-repo");
    r.project_keys = vec!["Website".to_string()];
    let payload = payload(EventAction::Created, Some(session(issue("ENG-1", Some("Website")), None)));
    let tracker = FakeTrackerClient::new();

    let decision = route(&payload, &[r.clone()], &tracker).await;
    assert_eq!(decision, RouteDecision::Matched { repository_id: r.id, intent: EventIntent::SessionCreated });
}

#[tokio::test]
async fn falls_back_to_tracker_lookup_when_project_missing_inline() {
    let mut r = repo("proj-repo");
    r.project_keys = vec!["Website".to_string()];
    let payload = payload(EventAction::Created, Some(session(issue("ENG-1", None), None)));
    let tracker = FakeTrackerClient::new();
    tracker.set_project("issue-ENG-1", "Website");

    let decision = route(&payload, &[r.clone()], &tracker).await;
    assert_eq!(decision, RouteDecision::Matched { repository_id: r.id, intent: EventIntent::SessionCreated });
}

#[tokio::test]
async fn tolerates_tracker_lookup_failure_and_falls_through_to_team_match() {
    let mut r = repo("team-repo");
    r.team_keys = vec!["ENG".to_string()];
    let payload = payload(EventAction::Created, Some(session(issue("ENG-1", None), None)));
    let tracker = FakeTrackerClient::new();

    let decision = route(&payload, &[r.clone()], &tracker).await;
    assert_eq!(decision, RouteDecision::Matched { repository_id: r.id, intent: EventIntent::SessionCreated });
}

#[tokio::test]
async fn matches_by_explicit_team_key() {
    let mut r = repo("team-repo");
    r.team_keys = vec!["ENG".to_string()];
    let payload = payload(EventAction::Created, Some(session(issue("XYZ-9", None), Some("ENG"))));
    let tracker = FakeTrackerClient::new();

    let decision = route(&payload, &[r.clone()], &tracker).await;
    assert_eq!(decision, RouteDecision::Matched { repository_id: r.id, intent: EventIntent::SessionCreated });
}

#[tokio::test]
async fn matches_by_team_key_parsed_from_identifier() {
    let mut r = repo("team-repo");
    r.team_keys = vec!["ENG".to_string()];
    let payload = payload(EventAction::Created, Some(session(issue("ENG-42", None), None)));
    let tracker = FakeTrackerClient::new();

    let decision = route(&payload, &[r.clone()], &tracker).await;
    assert_eq!(decision, RouteDecision::Matched { repository_id: r.id, intent: EventIntent::SessionCreated });
}

#[tokio::test]
async fn falls_back_to_catch_all_workspace_repository() {
    let r = repo("catch-all");
    let payload = payload(EventAction::Created, Some(session(issue("ZZZ-1", None), None)));
    let tracker = FakeTrackerClient::new();

    let decision = route(&payload, &[r.clone()], &tracker).await;
    assert_eq!(decision, RouteDecision::Matched { repository_id: r.id, intent: EventIntent::SessionCreated });
}

#[tokio::test]
async fn no_match_when_nothing_lines_up() {
    let mut r = repo("team-repo");
    r.team_keys = vec!["OPS".to_string()];
    let payload = payload(EventAction::Created, Some(session(issue("ENG-1", None), None)));
    let tracker = FakeTrackerClient::new();

    let decision = route(&payload, &[r], &tracker).await;
    assert_eq!(decision, RouteDecision::NoMatch);
}

#[tokio::test]
async fn ignores_inactive_repositories() {
    let mut r = repo("catch-all");
    r.is_active = false;
    let payload = payload(EventAction::Created, Some(session(issue("ZZZ-1", None), None)));
    let tracker = FakeTrackerClient::new();

    let decision = route(&payload, &[r], &tracker).await;
    assert_eq!(decision, RouteDecision::NoMatch);
}

#[tokio::test]
async fn stop_signal_overrides_the_action_field() {
    let r = repo("catch-all");
    let mut s = session(issue("ZZZ-1", None), None);
    s.agent_activity = Some(cyrus_wire::AgentActivitySignal { signal: Some("stop".to_string()) });
    let payload = payload(EventAction::Other, Some(s));
    let tracker = FakeTrackerClient::new();

    let decision = route(&payload, &[r.clone()], &tracker).await;
    assert_eq!(decision, RouteDecision::Matched { repository_id: r.id, intent: EventIntent::SessionStopSignal });
}

#[tokio::test]
async fn legacy_notification_routes_without_a_session() {
    let r = repo("catch-all");
    let payload = WebhookPayload {
        kind: WebhookType::AppUserNotification,
        action: EventAction::Other,
        organization_id: "org-1".to_string(),
        agent_session: None,
        notification: None,
    };
    let tracker = FakeTrackerClient::new();

    let decision = route(&payload, &[r.clone()], &tracker).await;
    assert_eq!(decision, RouteDecision::Matched { repository_id: r.id, intent: EventIntent::LegacyNotification });
}

#[tokio::test]
async fn unassigned_action_without_session_is_no_match() {
    let r = repo("catch-all");
    let payload = WebhookPayload {
        kind: WebhookType::Unrecognized,
        action: EventAction::Other,
        organization_id: "org-1".to_string(),
        agent_session: None,
        notification: None,
    };
    let tracker = FakeTrackerClient::new();

    let decision = route(&payload, &[r], &tracker).await;
    assert_eq!(decision, RouteDecision::NoMatch);
}

#[tokio::test]
async fn route_is_pure_given_identical_inputs() {
    let mut r = repo("proj-repo");
    r.project_keys = vec!["Website".to_string()];
    let payload = payload(EventAction::Created, Some(session(issue("ENG-1", Some("Website")), None)));
    let tracker = FakeTrackerClient::new();

    let first = route(&payload, &[r.clone()], &tracker).await;
    let second = route(&payload, &[r], &tracker).await;
    assert_eq!(first, second);
}
