// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cyrus-adapters: the edge orchestrator's boundary with the outside world —
//! the Agent Runner Adapter, the Workspace Provisioner, the tracker client,
//! and the tunnel provider. Everything here does real I/O; `cyrus-core`
//! stays pure on purpose.

pub mod agent;
pub mod credential;
pub mod local_runner;
pub mod subprocess;
pub mod tracker;
pub mod tunnel;
pub mod workspace;

pub use agent::{AgentAdapterError, AgentEvent, AgentHandle, AgentRunner, StartRequest};
pub use credential::Credential;
pub use local_runner::LocalAgentRunner;
pub use tracker::{AuthError, ReqwestTrackerClient, TrackerClient, TrackerClientError, TransportError};
pub use tunnel::{HttpTunnelProvider, NoopTunnelProvider, TunnelError, TunnelHandle, TunnelProvider};
pub use workspace::{
    derive_branch_name, LocalWorkspaceProvisioner, NoopWorkspaceProvisioner, ProvisionRequest, WorkspaceProvisioner,
};

#[cfg(any(test, feature = "test-support"))]
pub mod fake;
