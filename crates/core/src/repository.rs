// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Repository configuration — immutable, read at startup, and
//! reloadable on change. One entry per repository the orchestrator watches.

use crate::ids::RepositoryId;
use crate::procedure::PromptVariant;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

fn default_true() -> bool {
    true
}

/// One configured repository, as read from `config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    pub id: RepositoryId,
    pub name: String,
    pub root_path: PathBuf,
    pub base_branch: String,
    pub workspace_root: PathBuf,
    #[serde(rename = "tracker-token")]
    pub tracker_token: String,
    #[serde(rename = "tracker-workspace-id")]
    pub tracker_workspace_id: String,
    /// Ordered set of uppercase team codes this repository handles.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub team_keys: Vec<String>,
    /// Ordered set of project names this repository handles.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub project_keys: Vec<String>,
    pub allowed_tools: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disallowed_tools: Vec<String>,
    /// label -> phase-prompt variant override.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub label_prompts: BTreeMap<String, PromptVariant>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl RepositoryConfig {
    /// True if this repository has no `teamKeys` and no `projectKeys` —
    /// a "catch-all" repository, which matches any issue in its
    /// tracker workspace.
    pub fn is_catch_all(&self) -> bool {
        self.team_keys.is_empty() && self.project_keys.is_empty()
    }
}

/// Errors produced validating a parsed `config.json`.
///
/// Fatal at startup: a `ConfigError` never occurs mid-run.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file at {path}: {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },
    #[error("failed to parse config file at {path}: {source}")]
    Parse { path: PathBuf, #[source] source: serde_json::Error },
    #[error("duplicate repository id {0:?}")]
    DuplicateRepositoryId(String),
    #[error(
        "multiple catch-all repositories configured for tracker workspace {workspace_id:?}: {first:?} and {second:?}"
    )]
    MultipleCatchAll { workspace_id: String, first: String, second: String },
}

/// Validate repository-id uniqueness and warn (not error) on multiple
/// catch-alls per workspace: "if several match, the router
/// picks the first in file order and logs a warning." Returns the ids of
/// catch-all repositories discovered after the first one per workspace, so
/// the caller can log a warning without treating it as fatal.
pub fn validate_repositories(repos: &[RepositoryConfig]) -> Result<Vec<ConfigError>, ConfigError> {
    let mut seen_ids = std::collections::HashSet::new();
    let mut first_catch_all: BTreeMap<String, String> = BTreeMap::new();
    let mut warnings = Vec::new();

    for repo in repos {
        if !seen_ids.insert(repo.id.as_str().to_string()) {
            return Err(ConfigError::DuplicateRepositoryId(repo.id.as_str().to_string()));
        }
        if repo.is_catch_all() {
            if let Some(first) = first_catch_all.get(&repo.tracker_workspace_id) {
                warnings.push(ConfigError::MultipleCatchAll {
                    workspace_id: repo.tracker_workspace_id.clone(),
                    first: first.clone(),
                    second: repo.id.as_str().to_string(),
                });
            } else {
                first_catch_all.insert(repo.tracker_workspace_id.clone(), repo.id.as_str().to_string());
            }
        }
    }

    Ok(warnings)
}

#[cfg(test)]
#[path = "repository_tests.rs"]
mod tests;
