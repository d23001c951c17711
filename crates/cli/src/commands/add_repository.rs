// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cyrus add-repository`: interactive wizard appending a new
//! repository to `config.json`.

use crate::{config_file, prompt};
use anyhow::{bail, Result};
use cyrus_core::{validate_repositories, RepositoryConfig, RepositoryId};
use std::path::PathBuf;

pub async fn run(cyrus_home: PathBuf) -> Result<()> {
    let (path, mut config) = config_file::read(&cyrus_home).await?;

    let id = prompt::ask("Repository id")?;
    if id.is_empty() {
        bail!("repository id is required");
    }
    if config.repositories.iter().any(|r| r.id.as_str() == id) {
        bail!("a repository with id {id:?} already exists");
    }

    let name = prompt::ask_with_default("Display name", &id)?;
    let root_path = PathBuf::from(prompt::ask("Path to the git repository on disk")?);
    let base_branch = prompt::ask_with_default("Base branch", "main")?;
    let default_workspace_root = root_path.join(".cyrus-workspaces");
    let workspace_root =
        PathBuf::from(prompt::ask_with_default("Workspace root for issue worktrees", &default_workspace_root.to_string_lossy())?);
    let tracker_token = prompt::ask("Tracker OAuth token (blank to fill in later)")?;
    let tracker_workspace_id = prompt::ask("Tracker workspace id")?;
    let team_keys = prompt::ask_csv("Team keys this repository handles (comma-separated, blank for none)")?;
    let project_keys = prompt::ask_csv("Project names this repository handles (comma-separated, blank for none)")?;
    let allowed_tools = prompt::ask_csv("Allowed tools (comma-separated)")?;
    let disallowed_tools = prompt::ask_csv("Disallowed tools (comma-separated, blank for none)")?;
    let is_active = prompt::ask_bool("Activate this repository now", true)?;

    let repo = RepositoryConfig {
        id: RepositoryId::new(id),
        name,
        root_path,
        base_branch,
        workspace_root,
        tracker_token,
        tracker_workspace_id,
        team_keys,
        project_keys,
        allowed_tools,
        disallowed_tools,
        label_prompts: Default::default(),
        is_active,
    };

    config.repositories.push(repo);
    let warnings = validate_repositories(&config.repositories)?;
    for warning in &warnings {
        println!("warning: {warning}");
    }

    config_file::write(&path, &config).await?;
    println!("Repository added to {}", path.display());
    Ok(())
}
