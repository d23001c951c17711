// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cyrus-wire: wire-format types for the two protocols the orchestrator
//! speaks — the tracker's inbound webhook payloads and OAuth
//! callback, and the outbound `agentActivity` shape posted back to it.
//!
//! No I/O lives here; just parsing, the HMAC signature check, and the
//! discriminated-union shapes. The Tracker HTTP/GraphQL client that
//! actually sends these over the wire is `cyrus-adapters`' concern —
//! out of scope here beyond the documented payloads.

pub mod inbound;
pub mod oauth;
pub mod outbound;
pub mod signature;

pub use inbound::{
    AgentActivitySignal, AgentSessionPayload, CommentPayload, EventAction, IssuePayload, NotificationPayload,
    ProjectPayload, TeamPayload, UserPayload, WebhookPayload, WebhookType,
};
pub use oauth::CallbackQuery;
pub use outbound::{AgentActivityContent, AgentActivityRecord};
pub use signature::{verify_signature, SignatureError};
