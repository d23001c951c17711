// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace Provisioner: turns one issue into an isolated
//! filesystem root, preferring a git worktree and falling back to a plain
//! directory when worktree creation fails for any reason.
//!
//! Grounded in the reference daemon's local workspace adapter: worktrees are
//! created by shelling out to `git worktree add`, with `GIT_DIR`/
//! `GIT_WORK_TREE` scrubbed from the child's environment so it never
//! inherits a parent repository's worktree context.

use crate::subprocess::{run_with_timeout, SubprocessError};
use async_trait::async_trait;
use cyrus_core::{RepositoryConfig, Workspace};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

const GIT_TIMEOUT: Duration = Duration::from_secs(30);
const SETUP_SCRIPT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Everything the caller knows about the issue being provisioned for.
#[derive(Debug, Clone)]
pub struct ProvisionRequest {
    pub issue_id: String,
    pub issue_identifier: String,
    pub issue_title: String,
    /// Tracker-supplied branch name, when the issue carries one.
    pub branch_name_hint: Option<String>,
    /// The parent issue's branch name, already derived by the same rule, if
    /// the issue has a parent and that branch could be resolved.
    pub parent_branch: Option<String>,
}

#[async_trait]
pub trait WorkspaceProvisioner: Send + Sync + 'static {
    async fn provision(
        &self,
        repo: &RepositoryConfig,
        request: ProvisionRequest,
        global_setup_script: Option<&Path>,
    ) -> Workspace;
}

pub struct LocalWorkspaceProvisioner;

#[async_trait]
impl WorkspaceProvisioner for LocalWorkspaceProvisioner {
    async fn provision(
        &self,
        repo: &RepositoryConfig,
        request: ProvisionRequest,
        global_setup_script: Option<&Path>,
    ) -> Workspace {
        if let Err(e) = tokio::fs::create_dir_all(&repo.workspace_root).await {
            tracing::error!(error = %e, root = %repo.workspace_root.display(), "failed to create workspace root");
        }

        let branch_name = sanitize_branch_name(
            request.branch_name_hint.clone().unwrap_or_else(|| {
                format!("{}-{}", request.issue_identifier, slug(&request.issue_title, 30))
            }),
        );
        let workspace_path = repo.workspace_root.join(&request.issue_identifier);

        if is_existing_worktree(&workspace_path).await {
            tracing::info!(path = %workspace_path.display(), "reusing existing worktree");
            return Workspace::worktree(workspace_path, branch_name);
        }

        let base_branch = select_base_branch(&repo.root_path, &request, &repo.base_branch).await;
        fetch_remote(&repo.root_path).await;

        match create_worktree(&workspace_path, &repo.root_path, &branch_name, &base_branch).await {
            Ok(()) => {
                run_setup_scripts(&workspace_path, &repo.root_path, &request, global_setup_script).await;
                Workspace::worktree(workspace_path, branch_name)
            }
            Err(e) => {
                tracing::warn!(error = %e, "worktree creation failed, falling back to plain directory");
                if let Err(e) = tokio::fs::create_dir_all(&workspace_path).await {
                    tracing::error!(error = %e, "failed to create fallback workspace directory");
                }
                run_setup_scripts(&workspace_path, &repo.root_path, &request, global_setup_script).await;
                Workspace::plain_dir(workspace_path)
            }
        }
    }
}

/// Used for remote-only execution modes where the agent runtime provisions
/// its own filesystem (out of scope here, but the trait boundary matches
/// the reference workspace's remote-only adapter split).
pub struct NoopWorkspaceProvisioner;

#[async_trait]
impl WorkspaceProvisioner for NoopWorkspaceProvisioner {
    async fn provision(
        &self,
        repo: &RepositoryConfig,
        request: ProvisionRequest,
        _global_setup_script: Option<&Path>,
    ) -> Workspace {
        tracing::info!(issue = %request.issue_identifier, "skipping local workspace provisioning (remote-only)");
        Workspace::plain_dir(repo.workspace_root.join(&request.issue_identifier))
    }
}

/// Strip backticks (command-injection hygiene).
fn sanitize_branch_name(name: String) -> String {
    name.chars().filter(|c| *c != '`').collect()
}

/// The branch name derived for an issue that carries no
/// tracker-supplied branch name: `${identifier}-${slug(title, 30)}`, with
/// backticks stripped. Exposed so callers (the parent-branch lookup) can
/// derive the *same* name for a parent issue without
/// provisioning it.
pub fn derive_branch_name(identifier: &str, title: &str) -> String {
    sanitize_branch_name(format!("{identifier}-{}", slug(title, 30)))
}

fn slug(title: &str, max_len: usize) -> String {
    let mut out = String::new();
    let mut last_was_dash = false;
    for c in title.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_was_dash = false;
        } else if !last_was_dash && !out.is_empty() {
            out.push('-');
            last_was_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out.truncate(max_len);
    while out.ends_with('-') {
        out.pop();
    }
    out
}

async fn is_existing_worktree(path: &Path) -> bool {
    tokio::fs::symlink_metadata(path.join(".git")).await.is_ok()
}

async fn select_base_branch(repo_root: &Path, request: &ProvisionRequest, default_base: &str) -> String {
    if let Some(parent_branch) = &request.parent_branch {
        if branch_exists(repo_root, parent_branch).await {
            return parent_branch.clone();
        }
    }
    default_base.to_string()
}

async fn branch_exists(repo_root: &Path, branch: &str) -> bool {
    for candidate in [branch.to_string(), format!("origin/{branch}")] {
        let mut cmd = Command::new("git");
        cmd.args(["-C", &repo_root.display().to_string(), "rev-parse", "--verify", &candidate])
            .env_remove("GIT_DIR")
            .env_remove("GIT_WORK_TREE");
        if run_with_timeout(cmd, "git rev-parse --verify", GIT_TIMEOUT).await.is_ok() {
            return true;
        }
    }
    false
}

async fn fetch_remote(repo_root: &Path) {
    let mut cmd = Command::new("git");
    cmd.args(["-C", &repo_root.display().to_string(), "fetch", "origin"])
        .env_remove("GIT_DIR")
        .env_remove("GIT_WORK_TREE");
    if let Err(e) = run_with_timeout(cmd, "git fetch", GIT_TIMEOUT).await {
        tracing::warn!(error = %e, "git fetch failed, continuing with local refs");
    }
}

async fn create_worktree(
    path: &Path,
    repo_root: &Path,
    branch: &str,
    base_branch: &str,
) -> Result<(), SubprocessError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let start_point = if branch_exists(repo_root, &format!("origin/{base_branch}")).await {
        format!("origin/{base_branch}")
    } else {
        base_branch.to_string()
    };

    let mut cmd = Command::new("git");
    cmd.args([
        "-C",
        &repo_root.display().to_string(),
        "worktree",
        "add",
        "-b",
        branch,
        &path.display().to_string(),
        &start_point,
    ])
    .env_remove("GIT_DIR")
    .env_remove("GIT_WORK_TREE");
    run_with_timeout(cmd, "git worktree add", GIT_TIMEOUT).await.map(|_| ())
}

/// Remove a previously provisioned worktree and its branch. Best-effort:
/// failures are logged, never surfaced (the provisioner never
/// auto-deletes; this exists for operator-triggered cleanup tooling only).
pub async fn remove_workspace(workspace: &Workspace, repo_root: &Path) {
    if !workspace.is_worktree {
        if workspace.path.exists() {
            if let Err(e) = tokio::fs::remove_dir_all(&workspace.path).await {
                tracing::warn!(error = %e, "failed to remove plain workspace directory");
            }
        }
        return;
    }

    let mut cmd = Command::new("git");
    cmd.args(["-C", &repo_root.display().to_string(), "worktree", "remove", "--force"])
        .arg(&workspace.path)
        .env_remove("GIT_DIR")
        .env_remove("GIT_WORK_TREE");
    if let Err(e) = run_with_timeout(cmd, "git worktree remove", GIT_TIMEOUT).await {
        tracing::warn!(error = %e, "git worktree remove failed");
    }

    if let Some(branch) = &workspace.branch {
        let mut cmd = Command::new("git");
        cmd.args(["-C", &repo_root.display().to_string(), "branch", "-D", branch])
            .env_remove("GIT_DIR")
            .env_remove("GIT_WORK_TREE");
        let _ = run_with_timeout(cmd, "git branch -D", GIT_TIMEOUT).await;
    }
}

/// Setup script names tried in order, POSIX first.
const SETUP_SCRIPT_NAMES: &[&str] = &["cyrus-setup.sh", "cyrus-setup.ps1", "cyrus-setup.cmd", "cyrus-setup.bat"];

async fn run_setup_scripts(
    workspace_path: &Path,
    repo_root: &Path,
    request: &ProvisionRequest,
    global_setup_script: Option<&Path>,
) {
    if let Some(global) = global_setup_script {
        run_one_setup_script(global, workspace_path, request).await;
    }
    for name in SETUP_SCRIPT_NAMES {
        let candidate = repo_root.join(name);
        if candidate.exists() {
            run_one_setup_script(&candidate, workspace_path, request).await;
            break;
        }
    }
}

async fn run_one_setup_script(script: &Path, workspace_path: &Path, request: &ProvisionRequest) {
    let mut cmd = Command::new(script);
    cmd.current_dir(workspace_path)
        .env("ISSUE_ID", &request.issue_id)
        .env("ISSUE_IDENTIFIER", &request.issue_identifier)
        .env("ISSUE_TITLE", &request.issue_title);
    if let Err(e) = run_with_timeout(cmd, &script.display().to_string(), SETUP_SCRIPT_TIMEOUT).await {
        tracing::warn!(error = %e, script = %script.display(), "setup script failed (non-fatal)");
    }
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
