// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Session Store: the in-memory index of every live
//! session. Three indexes — `bySessionId` (primary), `byIssueRoot`
//! (`(repoId, issueId) -> {sessionId}`), `byAgentToken` (reverse lookup
//! during stream processing). No cross-index invariants beyond referential
//! consistency; on restore, every index is rebuilt from the primary by
//! replaying [`SessionStore::insert`].

use cyrus_core::{AgentSession, AgentToken, IssueId, RepositoryId, SessionId};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;

/// A session guarded by its own async mutex — the per-session serialisation
/// point the concurrency contract requires. Held across `.await`
/// points while a phase is running, so this is `tokio::sync::Mutex`, not
/// `parking_lot`'s.
pub type SessionHandle = Arc<AsyncMutex<AgentSession>>;

#[derive(Default)]
pub struct SessionStore {
    by_session_id: RwLock<HashMap<SessionId, SessionHandle>>,
    by_issue_root: RwLock<HashMap<(RepositoryId, IssueId), HashSet<SessionId>>>,
    by_agent_token: RwLock<HashMap<AgentToken, SessionId>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a freshly-created or restored session, indexing it under all
    /// three keys.
    pub fn insert(&self, session: AgentSession) -> SessionHandle {
        let session_id = session.session_id.clone();
        let repo_issue_key = (session.repository_id.clone(), session.issue_ref.id.clone());
        let agent_token = session.current_agent_session_token.clone();

        let handle: SessionHandle = Arc::new(AsyncMutex::new(session));
        self.by_session_id.write().insert(session_id.clone(), handle.clone());
        self.by_issue_root.write().entry(repo_issue_key).or_default().insert(session_id.clone());
        if let Some(token) = agent_token {
            self.by_agent_token.write().insert(token, session_id);
        }
        handle
    }

    pub fn get(&self, session_id: &SessionId) -> Option<SessionHandle> {
        self.by_session_id.read().get(session_id).cloned()
    }

    pub fn get_by_agent_token(&self, token: &AgentToken) -> Option<SessionHandle> {
        let session_id = self.by_agent_token.read().get(token).cloned()?;
        self.get(&session_id)
    }

    /// Record that `session_id` is now reachable via `token` — called once
    /// the agent's `system_init` event yields the real token.
    pub fn register_agent_token(&self, token: AgentToken, session_id: SessionId) {
        self.by_agent_token.write().insert(token, session_id);
    }

    pub fn sessions_for_issue(&self, repository_id: &RepositoryId, issue_id: &IssueId) -> Vec<SessionId> {
        self.by_issue_root
            .read()
            .get(&(repository_id.clone(), issue_id.clone()))
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn all_session_ids(&self) -> Vec<SessionId> {
        self.by_session_id.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.by_session_id.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
