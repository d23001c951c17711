// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The error taxonomy, rolled up at the daemon crate boundary.
//!
//! Every session-handler entry point returns one of these. Per the
//! propagation policy, `SessionOrchestrator` catches all of them at the
//! session boundary: the session is marked `errored`, a log line is
//! emitted, and processing continues for other sessions. Only `ConfigError`
//! (surfaced at startup, via `cyrus-cli`) and a port-bind failure are fatal.

use cyrus_adapters::{AgentAdapterError, TrackerClientError};
use cyrus_storage::SnapshotError;

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("agent runner error: {0}")]
    Agent(#[from] AgentAdapterError),

    #[error("workspace provisioning failed irrecoverably: {0}")]
    Workspace(String),

    #[error(transparent)]
    Tracker(#[from] TrackerClientError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("webhook signature mismatch")]
    Signature,

    #[error("no session found for id {0:?}")]
    SessionNotFound(String),

    #[error("no repository configured with id {0:?}")]
    RepositoryNotFound(String),
}
