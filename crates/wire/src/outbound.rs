// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound `agentActivity` records: GraphQL
//! over HTTPS, with a discriminated `content.type`.

use serde::{Deserialize, Serialize};

/// One activity posted against a session, mirroring the orchestrator's four
/// entry kinds that can reach the tracker (`result` entries are internal
/// bookkeeping and never posted as `agentActivity`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentActivityContent {
    Thought { text: String },
    Action { tool_name: String, inputs: serde_json::Value },
    Response { text: String },
    Elicitation { prompt: String },
}

/// The GraphQL mutation payload for one `agentActivity` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentActivityRecord {
    pub session_id: String,
    pub content: AgentActivityContent,
}

#[cfg(test)]
#[path = "outbound_tests.rs"]
mod tests;
