// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn base_payload(agent_session: Option<AgentSessionPayload>) -> WebhookPayload {
    WebhookPayload {
        kind: WebhookType::AgentSessionEvent,
        action: EventAction::Created,
        organization_id: "org-1".into(),
        agent_session,
        notification: None,
    }
}

fn issue(identifier: &str) -> IssuePayload {
    IssuePayload { id: "issue-1".into(), identifier: identifier.into(), title: "t".into(), labels: vec![], project: None, parent: None }
}

#[test]
fn parses_minimal_agent_session_created_event() {
    let json = serde_json::json!({
        "type": "AgentSessionEvent",
        "action": "created",
        "organizationId": "org-1",
        "agentSession": {
            "id": "sess-1",
            "issue": { "id": "issue-1", "identifier": "CEE-42", "title": "Fix it" }
        }
    });
    let payload: WebhookPayload = serde_json::from_value(json).expect("parse");
    assert_eq!(payload.kind, WebhookType::AgentSessionEvent);
    assert_eq!(payload.action, EventAction::Created);
    let session = payload.agent_session.expect("agent_session present");
    assert_eq!(session.issue.identifier, "CEE-42");
    assert!(!session.is_stop_signal());
}

#[test]
fn stop_signal_is_detected_from_agent_activity() {
    let mut session = AgentSessionPayload {
        id: "sess-1".into(),
        issue: issue("CEE-1"),
        team: None,
        comment: None,
        agent_activity: Some(AgentActivitySignal { signal: Some("stop".into()) }),
    };
    assert!(session.is_stop_signal());

    session.agent_activity = Some(AgentActivitySignal { signal: Some("something-else".into()) });
    assert!(!session.is_stop_signal());

    session.agent_activity = None;
    assert!(!session.is_stop_signal());
}

#[test]
fn unrecognized_webhook_type_round_trips_without_erroring() {
    let json = serde_json::json!({
        "type": "SomethingNew",
        "action": "created",
        "organizationId": "org-1",
    });
    let payload: WebhookPayload = serde_json::from_value(json).expect("parse");
    assert_eq!(payload.kind, WebhookType::Unrecognized);
}

#[test]
fn team_key_is_accessible_when_present() {
    let payload = base_payload(Some(AgentSessionPayload {
        id: "sess-1".into(),
        issue: issue("CEE-9"),
        team: Some(TeamPayload { key: "CEE".into() }),
        comment: None,
        agent_activity: None,
    }));
    assert_eq!(payload.agent_session.unwrap().team.unwrap().key, "CEE");
}

#[test]
fn issue_project_name_is_accessible_when_present() {
    let mut i = issue("CEE-9");
    i.project = Some(ProjectPayload { name: "Mobile App".into() });
    assert_eq!(i.project.unwrap().name, "Mobile App");
}

#[test]
fn issue_parent_chain_round_trips() {
    let mut child = issue("CEE-7");
    child.parent = Some(Box::new(issue("CEE-3")));
    let json = serde_json::to_string(&child).expect("serialize");
    let back: IssuePayload = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back.parent.unwrap().identifier, "CEE-3");
}

#[test]
fn legacy_notification_payload_round_trips_opaque_fields() {
    let json = serde_json::json!({
        "type": "AppUserNotification",
        "action": "other-action",
        "organizationId": "org-1",
        "notification": { "foo": "bar", "nested": { "x": 1 } }
    });
    let payload: WebhookPayload = serde_json::from_value(json).expect("parse");
    assert_eq!(payload.kind, WebhookType::AppUserNotification);
    let notif = payload.notification.expect("notification present");
    assert_eq!(notif.raw.get("foo").and_then(|v| v.as_str()), Some("bar"));
}
