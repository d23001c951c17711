// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use cyrus_core::{ProcedureName, PromptVariant};

fn labels(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn bug_label_selects_debugger_variant() {
    let (procedure, variant) = procedure_for_labels(&labels(&["Bug"]), false);
    assert_eq!(procedure, ProcedureName::FullDevelopment);
    assert_eq!(variant, PromptVariant::Debugger);
}

#[test]
fn feature_and_improvement_select_builder_variant() {
    assert_eq!(procedure_for_labels(&labels(&["Feature"]), false).1, PromptVariant::Builder);
    assert_eq!(procedure_for_labels(&labels(&["Improvement"]), false).1, PromptVariant::Builder);
}

#[test]
fn prd_label_selects_scoper_variant() {
    let (procedure, variant) = procedure_for_labels(&labels(&["PRD"]), false);
    assert_eq!(procedure, ProcedureName::FullDevelopment);
    assert_eq!(variant, PromptVariant::Scoper);
}

#[test]
fn orchestrator_label_selects_coordinator_variant() {
    assert_eq!(procedure_for_labels(&labels(&["Orchestrator"]), false).1, PromptVariant::Coordinator);
}

#[test]
fn first_recognised_label_wins() {
    let (_, variant) = procedure_for_labels(&labels(&["Unrelated", "Bug", "Feature"]), false);
    assert_eq!(variant, PromptVariant::Debugger);
}

#[test]
fn unrecognised_labels_default_to_simple_question() {
    let (procedure, variant) = procedure_for_labels(&labels(&["Design", "Question"]), false);
    assert_eq!(procedure, ProcedureName::SimpleQuestion);
    assert_eq!(variant, PromptVariant::Default);
}

#[test]
fn closed_comment_only_thread_defaults_even_with_bug_label() {
    let (procedure, variant) = procedure_for_labels(&labels(&["Bug"]), true);
    assert_eq!(procedure, ProcedureName::SimpleQuestion);
    assert_eq!(variant, PromptVariant::Default);
}
