// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Startup configuration: reads `$CYRUS_HOME/config.json`, one-shot legacy
//! migration from `./.edge-config.json`, and the environment-variable
//! overrides layered on top of both. Malformed config is a `ConfigError` —
//! fatal at startup, never mid-run.

use cyrus_core::RepositoryConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file at {path}: {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },
    #[error("failed to parse config file at {path}: {source}")]
    Parse { path: PathBuf, #[source] source: serde_json::Error },
    #[error(transparent)]
    Validation(#[from] cyrus_core::ConfigError),
}

/// The full contents of `config.json`: the repository table plus
/// daemon-wide settings that aren't per-repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub repositories: Vec<RepositoryConfig>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub host_external: Option<bool>,
    #[serde(default)]
    pub webhook_secret: Option<String>,
    #[serde(default)]
    pub tunnel_auth_token: Option<String>,
    #[serde(default)]
    pub global_setup_script: Option<PathBuf>,
    #[serde(default)]
    pub customer_id: Option<String>,
}

/// Shorthand single-tracker-account fields accepted as a legacy alternative
/// to a fully populated `repositories[].tracker_token`/`tracker_workspace_id`
/// — filled in for any repository
/// whose own config left them blank.
struct LegacyTrackerEnv {
    token: Option<String>,
    workspace_id: Option<String>,
}

/// Resolved settings after folding environment-variable overrides on top
/// of `config.json`.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub cyrus_home: PathBuf,
    pub repositories: Vec<RepositoryConfig>,
    pub port: u16,
    pub host_external: bool,
    pub webhook_secret: String,
    pub tunnel_auth_token: Option<String>,
    pub global_setup_script: Option<PathBuf>,
    pub base_url: Option<String>,
    pub proxy_url: Option<String>,
    pub default_model: Option<String>,
    pub default_fallback_model: Option<String>,
}

const DEFAULT_PORT: u16 = 3456;

/// Default `$CYRUS_HOME`: `~/.cyrus/`.
pub fn default_cyrus_home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".cyrus")
}

pub fn config_path(cyrus_home: &Path) -> PathBuf {
    cyrus_home.join("config.json")
}

pub fn snapshot_path(cyrus_home: &Path) -> PathBuf {
    cyrus_home.join("state").join("snapshot.json")
}

/// Load `config.json`, migrating the legacy `./.edge-config.json` in first
/// if `config.json` doesn't exist yet (one-shot migrated into
/// `$CYRUS_HOME/config.json` on startup").
pub async fn load(cyrus_home: &Path) -> Result<ResolvedConfig, ConfigError> {
    let path = config_path(cyrus_home);
    if !path.exists() {
        migrate_legacy_config(cyrus_home, &path).await?;
    }

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| ConfigError::Io { path: path.clone(), source: e })?;
    let parsed: Config =
        serde_json::from_slice(&bytes).map_err(|e| ConfigError::Parse { path: path.clone(), source: e })?;

    let warnings = cyrus_core::validate_repositories(&parsed.repositories)?;
    for warning in warnings {
        tracing::warn!(%warning, "repository configuration warning");
    }

    Ok(resolve_with_env(cyrus_home.to_path_buf(), parsed))
}

async fn migrate_legacy_config(cyrus_home: &Path, dest: &Path) -> Result<(), ConfigError> {
    let legacy = PathBuf::from("./.edge-config.json");
    if !legacy.exists() {
        return Ok(());
    }
    tracing::info!(from = %legacy.display(), to = %dest.display(), "migrating legacy edge config");
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| ConfigError::Io { path: parent.to_path_buf(), source: e })?;
    }
    tokio::fs::copy(&legacy, dest).await.map_err(|e| ConfigError::Io { path: dest.to_path_buf(), source: e })?;
    let _ = cyrus_home;
    Ok(())
}

fn resolve_with_env(cyrus_home: PathBuf, config: Config) -> ResolvedConfig {
    let port = env_u16("CYRUS_SERVER_PORT").or(config.port).unwrap_or(DEFAULT_PORT);
    let host_external = env_bool("CYRUS_HOST_EXTERNAL").or(config.host_external).unwrap_or(false);
    let webhook_secret = config.webhook_secret.unwrap_or_default();
    let tunnel_auth_token = config.tunnel_auth_token;
    let base_url = std::env::var("CYRUS_BASE_URL").ok();
    let proxy_url = std::env::var("PROXY_URL").ok();
    let default_model = std::env::var("CYRUS_DEFAULT_MODEL").ok();
    let default_fallback_model = std::env::var("CYRUS_DEFAULT_FALLBACK_MODEL").ok();

    let allowed_override = std::env::var("ALLOWED_TOOLS").ok().map(split_csv);
    let disallowed_override = std::env::var("DISALLOWED_TOOLS").ok().map(split_csv);
    let legacy_tracker = LegacyTrackerEnv {
        token: std::env::var("LINEAR_OAUTH_TOKEN").ok(),
        workspace_id: std::env::var("LINEAR_WORKSPACE_ID").ok(),
    };

    let mut repositories = config.repositories;
    if let Some(allowed) = &allowed_override {
        for repo in &mut repositories {
            if repo.allowed_tools.is_empty() {
                repo.allowed_tools = allowed.clone();
            }
        }
    }
    if let Some(disallowed) = &disallowed_override {
        for repo in &mut repositories {
            if repo.disallowed_tools.is_empty() {
                repo.disallowed_tools = disallowed.clone();
            }
        }
    }
    for repo in &mut repositories {
        if repo.tracker_token.is_empty() {
            if let Some(token) = &legacy_tracker.token {
                repo.tracker_token = token.clone();
            }
        }
        if repo.tracker_workspace_id.is_empty() {
            if let Some(workspace_id) = &legacy_tracker.workspace_id {
                repo.tracker_workspace_id = workspace_id.clone();
            }
        }
    }

    ResolvedConfig {
        cyrus_home,
        repositories,
        port,
        host_external,
        webhook_secret,
        tunnel_auth_token,
        global_setup_script: config.global_setup_script,
        base_url,
        proxy_url,
        default_model,
        default_fallback_model,
    }
}

fn split_csv(s: String) -> Vec<String> {
    s.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
}

fn env_u16(name: &str) -> Option<u16> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

fn env_bool(name: &str) -> Option<bool> {
    std::env::var(name).ok().map(|v| v == "true")
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
