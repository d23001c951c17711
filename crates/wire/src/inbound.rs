// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inbound webhook payload shapes.
//!
//! JSON over HTTPS `POST`, with a top-level `type`/`action`, an
//! `organizationId`, and either a nested `agentSession` (current shape) or
//! `notification` (legacy, routed but not otherwise parsed — the
//! `legacy-notification` intent).

use serde::{Deserialize, Serialize};

/// The top-level `type` discriminant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WebhookType {
    AgentSessionEvent,
    AppUserNotification,
    /// Any shape we don't otherwise recognise — routed as
    /// `legacy-notification` and otherwise ignored.
    #[serde(other)]
    Unrecognized,
}

/// The `action` field. Not exhaustively modeled — only the values the
/// router inspects are named; anything else round-trips as
/// `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventAction {
    Created,
    Prompted,
    Unassigned,
    #[serde(other)]
    Other,
}

/// The full webhook payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    #[serde(rename = "type")]
    pub kind: WebhookType,
    pub action: EventAction,
    pub organization_id: String,
    #[serde(default)]
    pub agent_session: Option<AgentSessionPayload>,
    /// Legacy shape, retained for compatibility.
    #[serde(default)]
    pub notification: Option<NotificationPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSessionPayload {
    pub id: String,
    pub issue: IssuePayload,
    #[serde(default)]
    pub team: Option<TeamPayload>,
    #[serde(default)]
    pub comment: Option<CommentPayload>,
    /// Present when the event carries a stop signal
    /// (`agentActivity.signal == "stop"`).
    #[serde(default)]
    pub agent_activity: Option<AgentActivitySignal>,
}

impl AgentSessionPayload {
    pub fn is_stop_signal(&self) -> bool {
        matches!(&self.agent_activity, Some(a) if a.signal.as_deref() == Some("stop"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentActivitySignal {
    #[serde(default)]
    pub signal: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuePayload {
    pub id: String,
    pub identifier: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub project: Option<ProjectPayload>,
    #[serde(default)]
    pub parent: Option<Box<IssuePayload>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectPayload {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamPayload {
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentPayload {
    pub body: String,
    #[serde(default)]
    pub user: Option<UserPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPayload {
    pub name: String,
}

/// Legacy notification shape — only routed, never otherwise acted on
/// (the `legacy-notification` intent).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPayload {
    #[serde(flatten)]
    pub raw: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
#[path = "inbound_tests.rs"]
mod tests;
