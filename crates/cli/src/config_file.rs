// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reads and writes `config.json` directly, for the commands that edit it
//! (`add-repository`, `refresh-token`, `set-customer-id`) rather than
//! resolving it against the environment the way the daemon startup path
//! does.

use anyhow::{Context, Result};
use cyrus_daemon::config::config_path;
use cyrus_daemon::Config;
use std::path::{Path, PathBuf};

fn empty_config() -> Config {
    Config {
        repositories: Vec::new(),
        port: None,
        host_external: None,
        webhook_secret: None,
        tunnel_auth_token: None,
        global_setup_script: None,
        customer_id: None,
    }
}

/// Read `config.json`, returning an empty `Config` if it doesn't exist yet
/// (the first repository added via `add-repository` creates it).
pub async fn read(cyrus_home: &Path) -> Result<(PathBuf, Config)> {
    let path = config_path(cyrus_home);
    let config = match tokio::fs::read(&path).await {
        Ok(bytes) => serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => empty_config(),
        Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
    };
    Ok((path, config))
}

pub async fn write(path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.with_context(|| format!("creating {}", parent.display()))?;
    }
    let bytes = serde_json::to_vec_pretty(config).context("serializing config")?;
    tokio::fs::write(path, bytes).await.with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "config_file_tests.rs"]
mod tests;
