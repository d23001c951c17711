// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The five Procedure Engine operations.

use cyrus_core::{Phase, PhaseHistoryEntry, ProcedureName, ProcedureState};

/// `initialize(session, procedureName)` — fresh `ProcedureState` at phase 0
/// with no history.
pub fn initialize(procedure_name: ProcedureName) -> ProcedureState {
    ProcedureState::new(procedure_name)
}

/// `currentPhase(session)` — the phase descriptor at `current_phase_index`.
/// Returns `None` once the procedure is complete (completion rule:
/// the last phase, once entered, is current; completion is only signalled
/// after `advance` runs past it).
pub fn current_phase(state: &ProcedureState) -> Option<Phase> {
    state.phases().into_iter().nth(state.current_phase_index)
}

/// `advance(session, completedAgentToken)` — append a history entry for the
/// phase that just finished and move to the next index.
pub fn advance(state: &mut ProcedureState, completed_agent_token: Option<String>, now_ms: u64) {
    if let Some(phase) = current_phase(state) {
        state.history.push(PhaseHistoryEntry {
            phase_name: phase.name,
            completed_at_ms: now_ms,
            agent_token: completed_agent_token,
        });
    }
    state.current_phase_index += 1;
}

/// `isComplete(session)` — true once `advance` has run past the last phase.
pub fn is_complete(state: &ProcedureState) -> bool {
    state.is_complete()
}

/// `reinitialize(session, procedureName)` — clears prior state; used when a
/// new user prompt arrives on an already-completed session.
pub fn reinitialize(procedure_name: ProcedureName) -> ProcedureState {
    ProcedureState::new(procedure_name)
}

#[cfg(test)]
#[path = "procedure_tests.rs"]
mod tests;
