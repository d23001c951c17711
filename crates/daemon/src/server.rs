// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Shared Application Server: one `axum` server per
//! process exposing `POST /webhook` and `GET /callback`, with the tunnel
//! (when configured) opened around its lifetime.

use crate::oauth::OAuthFlows;
use crate::orchestrator::SessionOrchestrator;
use crate::router::{self, EventIntent, RouteDecision};
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::Router;
use cyrus_adapters::{TrackerClient, TunnelHandle, TunnelProvider};
use cyrus_core::{Clock, RepositoryId};
use cyrus_wire::{verify_signature, CallbackQuery, WebhookPayload};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

/// Header the tracker signs its webhook body under.
const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// Soft deadline for the router's (normally-sync, occasionally-one-hop-async)
/// repository lookup before the handler acks the webhook regardless.
const ROUTE_DEADLINE: Duration = Duration::from_secs(2);

const CALLBACK_SUCCESS_HTML: &str = "<html><body><script>window.close()</script>Authorized. You can close this tab.</body></html>";
const CALLBACK_FAILURE_HTML: &str =
    "<html><body><script>window.close()</script>This authorization link is no longer valid. You can close this tab.</body></html>";

pub struct AppState<C: Clock + 'static> {
    pub orchestrator: Arc<SessionOrchestrator<C>>,
    pub tracker: Arc<dyn TrackerClient>,
    pub webhook_secret: Arc<str>,
    pub oauth_flows: Arc<OAuthFlows>,
}

impl<C: Clock + 'static> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            orchestrator: self.orchestrator.clone(),
            tracker: self.tracker.clone(),
            webhook_secret: self.webhook_secret.clone(),
            oauth_flows: self.oauth_flows.clone(),
        }
    }
}

pub fn build_router<C: Clock + 'static>(state: AppState<C>) -> Router {
    Router::new()
        .route("/webhook", post(webhook_handler::<C>))
        .route("/callback", get(callback_handler::<C>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn webhook_handler<C: Clock + 'static>(
    State(state): State<AppState<C>>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()).unwrap_or_default();
    if verify_signature(state.webhook_secret.as_bytes(), &body, signature).is_err() {
        tracing::warn!("webhook signature mismatch, dropping event");
        return StatusCode::UNAUTHORIZED;
    }

    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, "malformed webhook payload");
            return StatusCode::BAD_REQUEST;
        }
    };

    let repos = state.orchestrator.repositories_snapshot();
    let decision = tokio::time::timeout(ROUTE_DEADLINE, router::route(&payload, &repos, state.tracker.as_ref()))
        .await
        .unwrap_or(RouteDecision::NoMatch);

    match decision {
        RouteDecision::Matched { repository_id, intent } => {
            let orchestrator = state.orchestrator.clone();
            tokio::spawn(async move {
                dispatch(orchestrator, payload, repository_id, intent).await;
            });
        }
        RouteDecision::NoMatch => {
            tracing::debug!("webhook event matched no configured repository");
        }
    }

    StatusCode::OK
}

async fn dispatch<C: Clock + 'static>(
    orchestrator: Arc<SessionOrchestrator<C>>,
    payload: WebhookPayload,
    repository_id: RepositoryId,
    intent: EventIntent,
) {
    let Some(session) = payload.agent_session else { return };

    let result = match intent {
        EventIntent::SessionCreated => orchestrator.handle_session_created(&session, &repository_id).await,
        EventIntent::SessionPrompted => orchestrator.handle_session_prompted(&session, &repository_id).await,
        EventIntent::SessionStopSignal => {
            let actor_name =
                session.comment.as_ref().and_then(|c| c.user.as_ref()).map(|u| u.name.as_str()).unwrap_or("unknown actor");
            orchestrator.handle_session_stop_signal(&session, actor_name).await
        }
        // Routed for observability only; no session-level action.
        EventIntent::IssueUnassigned | EventIntent::LegacyNotification => Ok(()),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, session_id = %session.id, "failed to handle webhook event");
    }
}

async fn callback_handler<C: Clock + 'static>(
    State(state): State<AppState<C>>,
    Query(query): Query<CallbackQuery>,
) -> Html<&'static str> {
    let resolved = match &query.state {
        Some(flow_id) => state.oauth_flows.resolve(flow_id, query.clone()),
        None => state.oauth_flows.resolve_only_pending(query.clone()),
    };

    if resolved {
        Html(CALLBACK_SUCCESS_HTML)
    } else {
        tracing::warn!("oauth callback matched no pending flow");
        Html(CALLBACK_FAILURE_HTML)
    }
}

/// Owns the bound listener and (optional) tunnel for the process's
/// lifetime: the tunnel opens when the server starts and closes
/// when it stops.
pub struct Server {
    pub local_addr: SocketAddr,
    pub public_url: String,
    tunnel: Option<(Arc<dyn TunnelProvider>, TunnelHandle)>,
    task: tokio::task::JoinHandle<()>,
}

impl Server {
    /// Bind `router` to `port` (localhost-only unless `host_external`),
    /// open a tunnel if one is configured, and start serving in the
    /// background.
    pub async fn start(
        router: Router,
        port: u16,
        host_external: bool,
        tunnel_provider: Arc<dyn TunnelProvider>,
    ) -> std::io::Result<Self> {
        let bind_ip = if host_external { [0, 0, 0, 0] } else { [127, 0, 0, 1] };
        let addr = SocketAddr::from((bind_ip, port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        let tunnel_handle = tunnel_provider.open(local_addr.port()).await.ok();
        let public_url = tunnel_handle.as_ref().map(|h| h.public_url.clone()).unwrap_or_else(|| format!("http://{local_addr}"));

        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!(error = %e, "webhook server exited unexpectedly");
            }
        });

        Ok(Self { local_addr, public_url, tunnel: tunnel_handle.map(|h| (tunnel_provider, h)), task })
    }

    /// Stop serving and close the tunnel, if one was opened.
    pub async fn shutdown(self) {
        self.task.abort();
        if let Some((provider, handle)) = self.tunnel {
            provider.close(handle).await;
        }
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
