// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Label-to-procedure mapping: the issue's labels pick both the
//! procedure and the prompt variant for a new session.

use cyrus_core::{ProcedureName, PromptVariant};

/// Labels are inspected in tracker order; the first recognised one wins.
/// `Bug`, `Feature`/`Improvement`, `PRD`, and `Orchestrator` all run the full
/// development cycle, differing only in which system-prompt variant is
/// passed to the agent. A comment-only thread on an already-closed issue (or
/// an issue with none of these labels) defaults to `simple-question`.
pub fn procedure_for_labels(labels: &[String], is_closed_comment_only: bool) -> (ProcedureName, PromptVariant) {
    if is_closed_comment_only {
        return (ProcedureName::SimpleQuestion, PromptVariant::Default);
    }

    for label in labels {
        match label.as_str() {
            "Bug" => return (ProcedureName::FullDevelopment, PromptVariant::Debugger),
            "Feature" | "Improvement" => return (ProcedureName::FullDevelopment, PromptVariant::Builder),
            "PRD" => return (ProcedureName::FullDevelopment, PromptVariant::Scoper),
            "Orchestrator" => return (ProcedureName::FullDevelopment, PromptVariant::Coordinator),
            _ => continue,
        }
    }

    (ProcedureName::SimpleQuestion, PromptVariant::Default)
}

#[cfg(test)]
#[path = "label_mapping_tests.rs"]
mod tests;
