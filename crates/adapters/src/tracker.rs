// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracker HTTP/GraphQL client: the tracker's own request/response shapes
//! are out of scope for behavior, but the trait boundary and a minimal
//! implementation are in scope since the orchestrator has to actually call
//! it somehow.

use async_trait::async_trait;
use cyrus_wire::AgentActivityRecord;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("network error calling tracker: {0}")]
    Network(String),
    #[error("tracker returned {status}: {body}")]
    ServerError { status: u16, body: String },
}

#[derive(Debug, thiserror::Error)]
#[error("tracker rejected credentials (status {status})")]
pub struct AuthError {
    pub status: u16,
}

#[derive(Debug, thiserror::Error)]
pub enum TrackerClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Everything the Session Orchestrator and Webhook Router need from the
/// tracker: posting activity records, and resolving a full issue's project
/// when the webhook payload didn't carry one inline.
#[async_trait]
pub trait TrackerClient: Send + Sync + 'static {
    async fn post_activity(
        &self,
        token: &str,
        record: &AgentActivityRecord,
    ) -> Result<(), TrackerClientError>;

    /// Resolve the project name of an issue, fetched live from the tracker.
    /// Returns `Ok(None)` if the issue has no project.
    async fn fetch_issue_project(
        &self,
        token: &str,
        issue_id: &str,
    ) -> Result<Option<String>, TrackerClientError>;
}

/// Minimal `reqwest`-backed GraphQL client. The exact mutation/query shapes
/// are genuinely out of scope; this implementation exists so the
/// orchestrator has something real to call, not as a faithful binding to
/// any particular tracker's schema.
pub struct ReqwestTrackerClient {
    http: reqwest::Client,
    graphql_url: String,
}

impl ReqwestTrackerClient {
    pub fn new(graphql_url: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), graphql_url: graphql_url.into() }
    }

    async fn post_graphql(
        &self,
        token: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, TrackerClientError> {
        let response = self
            .http
            .post(&self.graphql_url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(AuthError { status: status.as_u16() }.into());
        }
        if status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::ServerError { status: status.as_u16(), body }.into());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::ServerError { status: status.as_u16(), body }.into());
        }

        response.json().await.map_err(|e| TransportError::Network(e.to_string()).into())
    }
}

#[async_trait]
impl TrackerClient for ReqwestTrackerClient {
    async fn post_activity(
        &self,
        token: &str,
        record: &AgentActivityRecord,
    ) -> Result<(), TrackerClientError> {
        let body = serde_json::json!({
            "query": "mutation PostAgentActivity($sessionId: String!, $content: JSON!) { agentActivityCreate(sessionId: $sessionId, content: $content) { success } }",
            "variables": { "sessionId": record.session_id, "content": record.content },
        });
        self.post_graphql(token, body).await?;
        Ok(())
    }

    async fn fetch_issue_project(
        &self,
        token: &str,
        issue_id: &str,
    ) -> Result<Option<String>, TrackerClientError> {
        let body = serde_json::json!({
            "query": "query IssueProject($id: String!) { issue(id: $id) { project { name } } }",
            "variables": { "id": issue_id },
        });
        let response = self.post_graphql(token, body).await?;
        Ok(response
            .get("data")
            .and_then(|d| d.get("issue"))
            .and_then(|i| i.get("project"))
            .and_then(|p| p.get("name"))
            .and_then(|n| n.as_str())
            .map(str::to_string))
    }
}

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tests;
