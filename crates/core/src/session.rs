// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Agent Session — one tracker-side conversation thread bound
//! to one issue and one repository, owned exclusively by the Session
//! Orchestrator.

use crate::entry::Entry;
use crate::ids::{AgentToken, IssueId, RepositoryId, SessionId};
use crate::procedure::ProcedureState;
use crate::workspace::Workspace;
use serde::{Deserialize, Serialize};

/// Which kind of tracker thread this session is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThreadType {
    IssueRoot,
    CommentThread,
}

/// Session lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStatus {
    Pending,
    Active,
    AwaitingInput,
    Complete,
    Errored,
}

/// Stable tracker issue id plus the human-readable identifier (`CEE-42`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRef {
    pub id: IssueId,
    pub identifier: String,
    pub title: String,
    /// Labels in tracker order, used by the label-to-procedure mapping.
    #[serde(default)]
    pub labels: Vec<String>,
    /// Stable id of the parent issue, when this is a sub-issue (used by the
    /// workspace provisioner's parent-branch lookup).
    #[serde(default)]
    pub parent: Option<Box<IssueRef>>,
}

/// One tracker-side conversation thread.
///
/// `entries` is append-only at the type level: [`AgentSession::push_entry`]
/// is the only public mutator, there is no public `Vec` setter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSession {
    pub session_id: SessionId,
    pub thread_type: ThreadType,
    pub status: SessionStatus,
    pub issue_ref: IssueRef,
    pub repository_id: RepositoryId,
    pub workspace: Workspace,
    pub current_agent_pid: Option<u32>,
    pub current_agent_session_token: Option<AgentToken>,
    pub parent_session_id: Option<SessionId>,
    pub procedure_state: ProcedureState,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
    entries: Vec<Entry>,
}

impl AgentSession {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session_id: SessionId,
        thread_type: ThreadType,
        issue_ref: IssueRef,
        repository_id: RepositoryId,
        workspace: Workspace,
        procedure_state: ProcedureState,
        now_ms: u64,
    ) -> Self {
        Self {
            session_id,
            thread_type,
            status: SessionStatus::Pending,
            issue_ref,
            repository_id,
            workspace,
            current_agent_pid: None,
            current_agent_session_token: None,
            parent_session_id: None,
            procedure_state,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
            entries: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Append an entry and bump `updated_at_ms`. The only way to grow
    /// `entries` — enforces the append-only invariant at the type
    /// level.
    pub fn push_entry(&mut self, entry: Entry, now_ms: u64) {
        self.entries.push(entry);
        self.updated_at_ms = now_ms;
    }

    /// True while an agent child is recorded as live for this session —
    /// the "at most one agent token currently live" invariant reads
    /// on this.
    pub fn has_live_agent(&self) -> bool {
        self.current_agent_pid.is_some()
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
