// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential resolution for the locally-spawned agent process.
//!
//! The agent binary authenticates the same way the interactive CLI does;
//! the orchestrator resolves a credential from the host once per spawn and
//! injects it as an environment variable rather than requiring the agent to
//! read its own config files (which may not reflect the token currently
//! configured for this repository).
//!
//! Resolution order:
//!
//! ```text
//! 1. CLAUDE_CODE_OAUTH_TOKEN env var
//! 2. ~/.claude/.credentials.json -> claudeAiOauth.accessToken
//! 3. ANTHROPIC_API_KEY env var
//! 4. ~/.claude/.claude.json -> primaryApiKey
//! ```

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    OAuthToken(String),
    ApiKey(String),
}

impl Credential {
    pub fn to_env_pair(&self) -> (&str, &str) {
        match self {
            Credential::OAuthToken(token) => ("CLAUDE_CODE_OAUTH_TOKEN", token),
            Credential::ApiKey(key) => ("ANTHROPIC_API_KEY", key),
        }
    }
}

/// Walk the fallback chain, returning the first credential found.
pub fn resolve() -> Option<Credential> {
    resolve_oauth().or_else(resolve_api_key)
}

fn resolve_oauth() -> Option<Credential> {
    if let Ok(token) = std::env::var("CLAUDE_CODE_OAUTH_TOKEN") {
        if !token.is_empty() {
            return Some(Credential::OAuthToken(token));
        }
    }
    read_credentials_file().map(Credential::OAuthToken)
}

fn resolve_api_key() -> Option<Credential> {
    if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
        if !key.is_empty() {
            return Some(Credential::ApiKey(key));
        }
    }
    read_claude_json_api_key().map(Credential::ApiKey)
}

fn read_credentials_file() -> Option<String> {
    let path = claude_dir()?.join(".credentials.json");
    let content = std::fs::read_to_string(path).ok()?;
    let value: serde_json::Value = serde_json::from_str(&content).ok()?;
    value
        .get("claudeAiOauth")
        .and_then(|v| v.get("accessToken"))
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn read_claude_json_api_key() -> Option<String> {
    let path = claude_dir()?.join(".claude.json");
    let content = std::fs::read_to_string(path).ok()?;
    let value: serde_json::Value = serde_json::from_str(&content).ok()?;
    value
        .get("primaryApiKey")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn claude_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(|home| PathBuf::from(home).join(".claude"))
}

#[cfg(test)]
#[path = "credential_tests.rs"]
mod tests;
