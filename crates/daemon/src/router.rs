// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Webhook Router: classifies an inbound event by team key,
//! project membership, and workspace identity across the configured
//! repositories. Pure given its inputs — `route(event, repos) ==
//! route(event, repos)` for any two calls with identical arguments —
//! aside from the one tolerated async lookup in step 1, which never
//! mutates anything and is allowed to fail silently.

use cyrus_adapters::TrackerClient;
use cyrus_core::RepositoryId;
use cyrus_wire::{AgentSessionPayload, EventAction, WebhookPayload, WebhookType};

/// What kind of session-affecting thing this event represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventIntent {
    SessionCreated,
    SessionPrompted,
    SessionStopSignal,
    IssueUnassigned,
    /// Older-shaped payloads retained for compatibility — routed, never
    /// otherwise acted on.
    LegacyNotification,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Matched { repository_id: RepositoryId, intent: EventIntent },
    NoMatch,
}

/// Repository selection algorithm, first match wins:
/// 1. project-name match (tolerates an async lookup failure by falling
///    through), 2. team-key match, 3. workspace (catch-all) match,
/// 4. otherwise `NoMatch`.
pub async fn route(payload: &WebhookPayload, repos: &[cyrus_core::RepositoryConfig], tracker: &dyn TrackerClient) -> RouteDecision {
    let Some(intent) = classify_intent(payload) else {
        return RouteDecision::NoMatch;
    };

    let active: Vec<&cyrus_core::RepositoryConfig> = repos.iter().filter(|r| r.is_active).collect();

    if let Some(session) = &payload.agent_session {
        if let Some(repository_id) = match_by_project(session, &payload.organization_id, &active, tracker).await {
            return RouteDecision::Matched { repository_id, intent };
        }
        if let Some(repository_id) = match_by_team(session, &active) {
            return RouteDecision::Matched { repository_id, intent };
        }
    }

    if let Some(repository_id) = match_by_workspace(&payload.organization_id, &active) {
        return RouteDecision::Matched { repository_id, intent };
    }

    RouteDecision::NoMatch
}

fn classify_intent(payload: &WebhookPayload) -> Option<EventIntent> {
    if payload.kind == WebhookType::AppUserNotification {
        return Some(EventIntent::LegacyNotification);
    }

    let session = payload.agent_session.as_ref()?;
    if session.is_stop_signal() {
        return Some(EventIntent::SessionStopSignal);
    }

    match payload.action {
        EventAction::Created => Some(EventIntent::SessionCreated),
        EventAction::Prompted => Some(EventIntent::SessionPrompted),
        EventAction::Unassigned => Some(EventIntent::IssueUnassigned),
        EventAction::Other => None,
    }
}

async fn match_by_project(
    session: &AgentSessionPayload,
    organization_id: &str,
    repos: &[&cyrus_core::RepositoryConfig],
    tracker: &dyn TrackerClient,
) -> Option<RepositoryId> {
    let project_name = match &session.issue.project {
        Some(project) => Some(project.name.clone()),
        None => {
            let token = repos.iter().find(|r| r.tracker_workspace_id == organization_id)?.tracker_token.clone();
            tracker.fetch_issue_project(&token, &session.issue.id).await.ok().flatten()
        }
    }?;

    repos.iter().find(|r| r.project_keys.iter().any(|k| k == &project_name)).map(|r| r.id.clone())
}

fn match_by_team(session: &AgentSessionPayload, repos: &[&cyrus_core::RepositoryConfig]) -> Option<RepositoryId> {
    let team_key = session
        .team
        .as_ref()
        .map(|t| t.key.clone())
        .or_else(|| team_key_from_identifier(&session.issue.identifier))?;

    repos.iter().find(|r| r.team_keys.iter().any(|k| k == &team_key)).map(|r| r.id.clone())
}

fn match_by_workspace(organization_id: &str, repos: &[&cyrus_core::RepositoryConfig]) -> Option<RepositoryId> {
    repos
        .iter()
        .find(|r| r.tracker_workspace_id == organization_id && r.is_catch_all())
        .map(|r| r.id.clone())
}

/// Parse `KEY-N` into `KEY`, the way team-scoped issue identifiers read.
fn team_key_from_identifier(identifier: &str) -> Option<String> {
    let (key, rest) = identifier.rsplit_once('-')?;
    if !key.is_empty() && rest.chars().all(|c| c.is_ascii_digit()) && !rest.is_empty() {
        Some(key.to_string())
    } else {
        None
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
