// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crash recovery: on startup, every session
//! restored from the snapshot has `currentAgentPid` cleared — no child
//! process survives a restart — and an `active`/`awaiting-input` session
//! with an incomplete procedure resumes at its stored phase using
//! `currentAgentSessionToken`. A session whose workspace no longer exists
//! on disk is marked `errored` instead.

use crate::orchestrator::SessionOrchestrator;
use cyrus_core::{Clock, SessionStatus};
use cyrus_storage::Snapshot;
use std::sync::Arc;

/// Tally of what recovery did, logged once at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    pub total: usize,
    pub resumed: usize,
    pub errored: usize,
}

/// Replay a loaded snapshot into a freshly-constructed orchestrator. Must
/// run before the webhook server starts accepting traffic, so no new event
/// can race a session still being restored.
pub async fn recover<C: Clock + 'static>(orchestrator: &Arc<SessionOrchestrator<C>>, snapshot: Snapshot) -> RecoveryReport {
    let mut report = RecoveryReport::default();

    for (_, mut session) in snapshot.sessions {
        session.current_agent_pid = None;

        let workspace_missing = !matches!(tokio::fs::try_exists(&session.workspace.path).await, Ok(true));
        if workspace_missing {
            tracing::warn!(
                session_id = %session.session_id,
                path = %session.workspace.path.display(),
                "workspace missing on restart, marking session errored"
            );
            session.status = SessionStatus::Errored;
        }

        let should_resume = !workspace_missing
            && matches!(session.status, SessionStatus::Active | SessionStatus::AwaitingInput)
            && !session.procedure_state.is_complete();

        let session_id = session.session_id.clone();
        let errored = session.status == SessionStatus::Errored;
        orchestrator.store.insert(session);
        report.total += 1;
        if errored {
            report.errored += 1;
        }

        if should_resume {
            match orchestrator.resume_after_crash(session_id.clone()).await {
                Ok(()) => report.resumed += 1,
                Err(e) => tracing::warn!(session_id = %session_id, error = %e, "failed to resume session after restart"),
            }
        }
    }

    orchestrator.restore_parent_child_map(snapshot.parent_child_map);
    tracing::info!(total = report.total, resumed = report.resumed, errored = report.errored, "crash recovery complete");
    report
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
