// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prompt framing: the literal markdown
//! markers the agent is trained to recognise. Intentionally not
//! localisable — the exact strings matter, not just their meaning.

use cyrus_core::{IssueRef, Phase, PromptVariant};

/// `## New message from user\n---\n<text>\n---` (
/// `handleSessionPrompted`).
pub fn new_message_from_user(text: &str) -> String {
    format!("## New message from user\n---\n{text}\n---")
}

/// `## Received feedback from orchestrator\n---\n<text>\n---` (
/// `deliverFeedbackToChild`).
pub fn feedback_from_orchestrator(text: &str) -> String {
    format!("## Received feedback from orchestrator\n---\n{text}\n---")
}

/// The initial prompt for a freshly-created session: the issue identifier,
/// title, and (if present) the comment body that triggered the thread.
pub fn initial_prompt(issue: &IssueRef, comment_body: Option<&str>) -> String {
    let mut prompt = format!("## {} — {}\n\n{}", issue.identifier, issue.title, issue.identifier);
    if let Some(body) = comment_body {
        prompt = format!("{prompt}\n\n{}", new_message_from_user(body));
    }
    prompt
}

/// System prompt variant text, selected by [`PromptVariant`] and the
/// current phase name (the label-to-procedure mapping: the variant
/// affects wording only, never the phase sequence).
pub fn system_prompt(variant: PromptVariant, phase: &Phase) -> String {
    let role = match variant {
        PromptVariant::Debugger => {
            "You are debugging a reported defect. Reproduce it, find the root cause, and fix it with a minimal, targeted change."
        }
        PromptVariant::Builder => {
            "You are implementing a requested feature or improvement. Design the smallest change that satisfies the request."
        }
        PromptVariant::Scoper => {
            "You are scoping a product requirements document into concrete engineering work before implementing it."
        }
        PromptVariant::Coordinator => {
            "You are coordinating delegated sub-sessions. Break the work into sub-issues and delegate rather than implementing directly."
        }
        PromptVariant::Default => "You are answering a question about this codebase.",
    };

    let phase_note = match phase.name.as_str() {
        "verifications" => "\n\nRun the project's verification tooling (tests, type-checks, linters) and fix anything that fails.",
        "publish" => "\n\nPublish your work (open or update a pull request) once it is ready for review.",
        "concise-summary" => "\n\nRespond with a short, direct summary. Do not restate the full diff.",
        "verbose-summary" => "\n\nRespond with a complete summary of what changed and why, suitable for a reviewer who has not seen the conversation.",
        _ => "",
    };

    format!("{role}{phase_note}")
}

#[cfg(test)]
#[path = "prompt_tests.rs"]
mod tests;
