// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The compile-time procedure registry.
//!
//! A procedure is a named, ordered list of phases. The registry here is
//! data only — sequencing operations (`initialize`/`advance`/`isComplete`)
//! live in `cyrus-engine`, which is the pure state machine over the types
//! defined here.

use serde::{Deserialize, Serialize};

/// Name of a compile-time-registered procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProcedureName {
    FullDevelopment,
    DocumentationEdit,
    SimpleQuestion,
}

impl ProcedureName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcedureName::FullDevelopment => "full-development",
            ProcedureName::DocumentationEdit => "documentation-edit",
            ProcedureName::SimpleQuestion => "simple-question",
        }
    }
}

impl std::fmt::Display for ProcedureName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Prompt flavor selected by issue label. Affects which system-prompt variant is passed to the agent,
/// never the phase sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PromptVariant {
    Debugger,
    Builder,
    Scoper,
    Coordinator,
    Default,
}

/// Name of one phase within a procedure. A plain string rather than an enum
/// because `labelPrompts` lets repository config reference phase
/// names for prompt-variant overrides without recompiling.
pub type PhaseName = &'static str;

/// One step of a procedure: a name, an optional tool-allow-list override,
/// and whether intermediate (`thought`/`action`) entries are suppressed
/// while it runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub name: String,
    /// Overrides the repository's `allowedTools` for this phase only, when set.
    pub tool_allow_list: Option<Vec<String>>,
    pub suppress_intermediate_output: bool,
}

impl Phase {
    fn new(name: &str, suppress: bool) -> Self {
        Self { name: name.to_string(), tool_allow_list: None, suppress_intermediate_output: suppress }
    }

    fn with_tools(name: &str, tools: &[&str], suppress: bool) -> Self {
        Self {
            name: name.to_string(),
            tool_allow_list: Some(tools.iter().map(|s| s.to_string()).collect()),
            suppress_intermediate_output: suppress,
        }
    }
}

/// Returns the ordered phase list for a procedure, per the compile-time
/// compile-time registry:
/// `full-development = [primary, verifications, publish, verbose-summary]`,
/// `documentation-edit = [primary, publish, concise-summary]`,
/// `simple-question = [primary, concise-summary]`.
pub fn phases_for(procedure: ProcedureName) -> Vec<Phase> {
    match procedure {
        ProcedureName::FullDevelopment => vec![
            Phase::new("primary", false),
            Phase::with_tools("verifications", &["Bash", "Read", "Grep", "Glob"], false),
            Phase::new("publish", false),
            Phase::new("verbose-summary", true),
        ],
        ProcedureName::DocumentationEdit => {
            vec![Phase::new("primary", false), Phase::new("publish", false), Phase::new("concise-summary", true)]
        }
        ProcedureName::SimpleQuestion => {
            vec![Phase::new("primary", false), Phase::new("concise-summary", true)]
        }
    }
}

/// One completed phase, recorded in `ProcedureState::history`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseHistoryEntry {
    pub phase_name: String,
    pub completed_at_ms: u64,
    pub agent_token: Option<String>,
}

/// `{procedureName, currentPhaseIndex, history}`.
///
/// Completion is signalled only after `advance` runs past the last phase
///: `current_phase_index` can legally equal
/// `phases.len()`, meaning "procedure complete", and the engine asserts it
/// is never called again past that point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureState {
    pub procedure_name: ProcedureName,
    pub current_phase_index: usize,
    pub history: Vec<PhaseHistoryEntry>,
}

impl ProcedureState {
    pub fn new(procedure_name: ProcedureName) -> Self {
        Self { procedure_name, current_phase_index: 0, history: Vec::new() }
    }

    pub fn phases(&self) -> Vec<Phase> {
        phases_for(self.procedure_name)
    }

    /// True once `current_phase_index` has advanced past the last phase.
    pub fn is_complete(&self) -> bool {
        self.current_phase_index >= self.phases().len()
    }
}

#[cfg(test)]
#[path = "procedure_tests.rs"]
mod tests;
