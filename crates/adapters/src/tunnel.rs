// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tunnel provider: opening a public URL for the webhook
//! server when the host isn't externally reachable. The third-party tunnel
//! call itself is out of scope — only the trait boundary and the
//! no-op case (external-host mode, or no tunnel token configured) are
//! implemented here.

use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct TunnelHandle {
    pub public_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TunnelError {
    #[error("tunnel provider not configured")]
    NotConfigured,
    #[error("tunnel failed to become ready within {0:?}")]
    NotReady(std::time::Duration),
}

#[async_trait]
pub trait TunnelProvider: Send + Sync + 'static {
    async fn open(&self, local_port: u16) -> Result<TunnelHandle, TunnelError>;
    async fn close(&self, handle: TunnelHandle);
}

/// Used whenever `CYRUS_HOST_EXTERNAL=true` or no tunnel token is
/// configured — the server is reachable directly, no tunnel needed.
pub struct NoopTunnelProvider;

#[async_trait]
impl TunnelProvider for NoopTunnelProvider {
    async fn open(&self, local_port: u16) -> Result<TunnelHandle, TunnelError> {
        Ok(TunnelHandle { public_url: format!("http://localhost:{local_port}") })
    }

    async fn close(&self, _handle: TunnelHandle) {}
}

/// Documents the shape of a real tunnel integration without implementing
/// one. Constructing it is legal; `open`
/// always fails with `NotConfigured` until a real backend is wired in.
pub struct HttpTunnelProvider {
    #[allow(dead_code)]
    auth_token: String,
}

impl HttpTunnelProvider {
    pub fn new(auth_token: impl Into<String>) -> Self {
        Self { auth_token: auth_token.into() }
    }
}

#[async_trait]
impl TunnelProvider for HttpTunnelProvider {
    async fn open(&self, _local_port: u16) -> Result<TunnelHandle, TunnelError> {
        Err(TunnelError::NotConfigured)
    }

    async fn close(&self, _handle: TunnelHandle) {}
}

#[cfg(test)]
#[path = "tunnel_tests.rs"]
mod tests;
