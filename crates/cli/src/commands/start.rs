// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cyrus` (no subcommand) — start the orchestrator.

use crate::exit_error::ExitError;
use crate::{logging, tracker_endpoint};
use anyhow::{Context, Result};
use cyrus_adapters::{
    HttpTunnelProvider, LocalAgentRunner, LocalWorkspaceProvisioner, NoopTunnelProvider, ReqwestTrackerClient,
    TrackerClient, TunnelProvider,
};
use cyrus_core::SystemClock;
use cyrus_daemon::config;
use cyrus_daemon::oauth::OAuthFlows;
use cyrus_daemon::recovery::recover;
use cyrus_daemon::server::{build_router, AppState, Server};
use cyrus_daemon::{SessionOrchestrator, SessionStore};
use cyrus_storage::{quarantine, Snapshot, SnapshotSource, SnapshotWriter};
use std::path::PathBuf;
use std::sync::Arc;

/// Local agent binary to spawn, overridable for environments where `claude`
/// isn't on `PATH` under that name.
const AGENT_BINARY_ENV: &str = "CYRUS_AGENT_BIN";

pub async fn run(cyrus_home: PathBuf) -> Result<()> {
    let _log_guard = logging::init(&cyrus_home);

    let resolved = config::load(&cyrus_home).await.map_err(|e| ExitError::new(1, format!("configuration error: {e}")))?;
    tracing::info!(repositories = resolved.repositories.len(), port = resolved.port, "starting cyrus");

    let snapshot_path = config::snapshot_path(&cyrus_home);
    let snapshot = load_snapshot(&snapshot_path, &cyrus_home).await;

    let agent_bin = std::env::var(AGENT_BINARY_ENV).unwrap_or_else(|_| "claude".to_string());
    let graphql_url = tracker_endpoint::graphql_url(resolved.proxy_url.as_deref());
    let tracker: Arc<dyn TrackerClient> = Arc::new(ReqwestTrackerClient::new(graphql_url));

    let orchestrator = Arc::new(SessionOrchestrator::new(
        Arc::new(SessionStore::new()),
        resolved.repositories.clone(),
        tracker.clone(),
        Arc::new(LocalAgentRunner::new(agent_bin)),
        Arc::new(LocalWorkspaceProvisioner),
        SystemClock,
        config::config_path(&cyrus_home),
        resolved.global_setup_script.clone(),
    ));

    let (writer, shutdown_tx) = SnapshotWriter::spawn(snapshot_path.clone(), orchestrator.clone() as Arc<dyn SnapshotSource>);
    orchestrator.set_snapshot_writer(writer);

    let report = recover(&orchestrator, snapshot).await;
    tracing::info!(total = report.total, resumed = report.resumed, errored = report.errored, "crash recovery complete");

    let tunnel_provider: Arc<dyn TunnelProvider> = if resolved.host_external {
        Arc::new(NoopTunnelProvider)
    } else {
        match &resolved.tunnel_auth_token {
            Some(token) => Arc::new(HttpTunnelProvider::new(token.clone())),
            None => Arc::new(NoopTunnelProvider),
        }
    };

    let state = AppState {
        orchestrator: orchestrator.clone(),
        tracker,
        webhook_secret: Arc::from(resolved.webhook_secret.as_str()),
        oauth_flows: Arc::new(OAuthFlows::new()),
    };
    let router = build_router(state);

    let server = Server::start(router, resolved.port, resolved.host_external, tunnel_provider)
        .await
        .map_err(|e| ExitError::new(1, format!("failed to bind webhook server: {e}")))?;
    tracing::info!(addr = %server.local_addr, public_url = %server.public_url, "webhook server listening");
    println!("cyrus listening on {} ({})", server.local_addr, server.public_url);

    tokio::signal::ctrl_c().await.context("failed to install ctrl-c handler")?;
    tracing::info!("shutdown signal received, flushing snapshot");

    let final_snapshot = orchestrator.snapshot().await;
    if let Err(e) = cyrus_storage::write_atomic(&snapshot_path, &final_snapshot).await {
        tracing::error!(error = %e, "failed to persist final snapshot on shutdown");
    }
    let _ = shutdown_tx.send(()).await;

    server.shutdown().await;
    Ok(())
}

async fn load_snapshot(snapshot_path: &std::path::Path, cyrus_home: &std::path::Path) -> Snapshot {
    match cyrus_storage::load(snapshot_path).await {
        Ok(Some(snapshot)) => snapshot,
        Ok(None) => Snapshot::new(config::config_path(cyrus_home)),
        Err(e) => {
            tracing::error!(error = %e, "snapshot corrupt, quarantining and starting fresh");
            if let Err(quarantine_err) = quarantine(snapshot_path).await {
                tracing::error!(error = %quarantine_err, "failed to quarantine corrupt snapshot");
            }
            Snapshot::new(config::config_path(cyrus_home))
        }
    }
}
