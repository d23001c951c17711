// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cyrus refresh-token`: interactively re-run OAuth for a
//! selected repository; on success, the new token replaces the old one for
//! every repository that shared it.
//!
//! The tracker's actual authorization endpoint is out of scope (
//! same as the tunnel provider) — this opens a throwaway local callback
//! server using the daemon's own `/callback` route and waits for the
//! operator to complete the flow in a browser, exactly as the running
//! orchestrator would for a fresh OAuth grant.

use crate::exit_error::ExitError;
use crate::{config_file, prompt, tracker_endpoint};
use anyhow::{anyhow, Result};
use cyrus_adapters::{LocalAgentRunner, LocalWorkspaceProvisioner, NoopTunnelProvider, ReqwestTrackerClient, TrackerClient};
use cyrus_core::SystemClock;
use cyrus_daemon::oauth::OAuthFlows;
use cyrus_daemon::server::{build_router, AppState, Server};
use cyrus_daemon::{SessionOrchestrator, SessionStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const AUTHORIZATION_WAIT: Duration = Duration::from_secs(300);

pub async fn run(cyrus_home: PathBuf) -> Result<()> {
    let (path, mut config) = config_file::read(&cyrus_home).await?;
    if config.repositories.is_empty() {
        return Err(ExitError::new(1, "no repositories configured; run `cyrus add-repository` first").into());
    }

    println!("Repositories:");
    for (i, repo) in config.repositories.iter().enumerate() {
        println!("  {}) {}", i + 1, repo.name);
    }
    let choice = prompt::ask("Select a repository to refresh (number)")?;
    let index: usize = choice
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|n| *n >= 1 && *n <= config.repositories.len())
        .ok_or_else(|| anyhow!("invalid selection {choice:?}"))?
        - 1;
    let old_token = config.repositories[index].tracker_token.clone();

    let proxy_url = std::env::var("PROXY_URL").ok();
    let graphql_url = tracker_endpoint::graphql_url(proxy_url.as_deref());
    let tracker: Arc<dyn TrackerClient> = Arc::new(ReqwestTrackerClient::new(graphql_url.clone()));
    let orchestrator = Arc::new(SessionOrchestrator::new(
        Arc::new(SessionStore::new()),
        Vec::new(),
        tracker.clone(),
        Arc::new(LocalAgentRunner::new("claude")),
        Arc::new(LocalWorkspaceProvisioner),
        SystemClock,
        path.clone(),
        None,
    ));
    let oauth_flows = Arc::new(OAuthFlows::new());
    let state = AppState { orchestrator, tracker, webhook_secret: Arc::from(""), oauth_flows: oauth_flows.clone() };
    let server = Server::start(build_router(state), 0, false, Arc::new(NoopTunnelProvider))
        .await
        .map_err(|e| ExitError::new(1, format!("failed to start local callback listener: {e}")))?;

    let flow_id = format!("refresh-{}", std::process::id());
    let rx = oauth_flows.register(&flow_id);
    println!(
        "Open this URL in your browser to authorize: {}/oauth/authorize?state={}&redirect_uri=http://{}/callback",
        graphql_url, flow_id, server.local_addr
    );
    println!("Waiting for authorization (up to {}s)...", AUTHORIZATION_WAIT.as_secs());

    let query = tokio::select! {
        result = rx => result.map_err(|_| anyhow!("authorization flow was cancelled")),
        _ = tokio::time::sleep(AUTHORIZATION_WAIT) => {
            oauth_flows.cancel(&flow_id);
            Err(anyhow!("timed out waiting for authorization"))
        }
    };
    server.shutdown().await;
    let query = query?;

    let mut replaced = 0;
    for repo in &mut config.repositories {
        if repo.tracker_token == old_token {
            repo.tracker_token = query.token.clone();
            repo.tracker_workspace_id = query.workspace_id.clone();
            replaced += 1;
        }
    }

    config_file::write(&path, &config).await?;
    println!("Refreshed token for {replaced} repositor{} (workspace: {})", if replaced == 1 { "y" } else { "ies" }, query.workspace_name);
    Ok(())
}
