// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The append-only activity log carried on every [`crate::session::AgentSession`]
//! (`entries`). Mirrors the shape the orchestrator posts to the
//! tracker as `agentActivity` records.

use crate::clock::Clock;
use serde::{Deserialize, Serialize};

/// Discriminant for one entry in a session's activity log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Agent reasoning, not a user-facing result.
    Thought,
    /// A tool invocation the agent made.
    Action,
    /// A user-facing reply. Always posted, even during suppressed phases.
    Response,
    /// A tool's result/output.
    Result,
}

/// One entry in a session's append-only activity log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub kind: EntryKind,
    pub payload: serde_json::Value,
    /// Milliseconds since epoch, from the orchestrator's [`Clock`].
    pub timestamp_ms: u64,
}

impl Entry {
    pub fn new(kind: EntryKind, payload: serde_json::Value, clock: &impl Clock) -> Self {
        Self { kind, payload, timestamp_ms: clock.epoch_ms() }
    }

    pub fn response(text: impl Into<String>, clock: &impl Clock) -> Self {
        Self::new(EntryKind::Response, serde_json::json!({ "text": text.into() }), clock)
    }

    pub fn thought(text: impl Into<String>, clock: &impl Clock) -> Self {
        Self::new(EntryKind::Thought, serde_json::json!({ "text": text.into() }), clock)
    }

    pub fn action(tool_name: impl Into<String>, inputs: serde_json::Value, clock: &impl Clock) -> Self {
        Self::new(
            EntryKind::Action,
            serde_json::json!({ "toolName": tool_name.into(), "inputs": inputs }),
            clock,
        )
    }

    /// True if, per the output-suppression rule, this entry may be
    /// withheld from the tracker while the current phase suppresses
    /// intermediate output. `response` entries are never suppressible.
    pub fn is_suppressible(&self) -> bool {
        matches!(self.kind, EntryKind::Thought | EntryKind::Action)
    }
}

#[cfg(test)]
#[path = "entry_tests.rs"]
mod tests;
