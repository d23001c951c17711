// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cyrus check-tokens`: probe every configured repository's
//! tracker token and print `valid`/`invalid` with a reason. Always exits 0
//! — a rejected token is a reportable finding, not a CLI failure.

use crate::exit_error::ExitError;
use crate::tracker_endpoint;
use anyhow::Result;
use cyrus_adapters::{ReqwestTrackerClient, TrackerClient, TrackerClientError};
use std::path::PathBuf;

/// A nonexistent issue id — any response other than an auth rejection
/// means the token itself was accepted by the tracker.
const PROBE_ISSUE_ID: &str = "cyrus-check-tokens-probe";

pub async fn run(cyrus_home: PathBuf) -> Result<()> {
    let resolved = cyrus_daemon::config::load(&cyrus_home)
        .await
        .map_err(|e| ExitError::new(1, format!("configuration error: {e}")))?;

    if resolved.repositories.is_empty() {
        println!("No repositories configured.");
        return Ok(());
    }

    let tracker = ReqwestTrackerClient::new(tracker_endpoint::graphql_url(resolved.proxy_url.as_deref()));

    for repo in &resolved.repositories {
        if repo.tracker_token.is_empty() {
            println!("{}: invalid (no tracker token configured)", repo.name);
            continue;
        }

        match tracker.fetch_issue_project(&repo.tracker_token, PROBE_ISSUE_ID).await {
            Ok(_) => println!("{}: valid", repo.name),
            Err(TrackerClientError::Auth(e)) => {
                println!("{}: invalid (tracker rejected credentials, status {})", repo.name, e.status)
            }
            Err(TrackerClientError::Transport(e)) => {
                println!("{}: unknown (could not reach tracker: {e})", repo.name)
            }
        }
    }

    Ok(())
}
