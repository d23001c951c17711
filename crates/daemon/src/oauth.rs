// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OAuth pending-flow registry: correlates the `GET
//! /callback` request the tracker redirects to with the in-process waiter
//! that opened the authorization URL (`check-tokens`/`add-repository`'s
//! "not yet authorized" path). Keyed by a `state` value the waiter mints
//! itself and threads through the authorization URL's query string.

use cyrus_wire::CallbackQuery;
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::oneshot;

/// Registry of OAuth flows awaiting their callback. Cheap to clone (an
/// `Arc` around the map in practice — callers hold it behind one).
#[derive(Default)]
pub struct OAuthFlows {
    pending: Mutex<HashMap<String, oneshot::Sender<CallbackQuery>>>,
}

impl OAuthFlows {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new flow under `flow_id`, returning the receiver the
    /// waiter should await (with its own timeout — this registry never
    /// expires an entry on its own).
    pub fn register(&self, flow_id: impl Into<String>) -> oneshot::Receiver<CallbackQuery> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(flow_id.into(), tx);
        rx
    }

    /// Resolve the flow named by `query.state`, if one is pending. Returns
    /// `true` if a waiter was actually woken.
    pub fn resolve(&self, flow_id: &str, query: CallbackQuery) -> bool {
        match self.pending.lock().remove(flow_id) {
            Some(tx) => tx.send(query).is_ok(),
            None => false,
        }
    }

    /// Resolve whichever single flow is pending, for the (common) case
    /// where the tracker's callback carries no `state` param and only one
    /// flow is in flight. Does nothing, and returns `false`, if zero or
    /// more than one flow is pending — an ambiguous callback is dropped
    /// rather than guessed at.
    pub fn resolve_only_pending(&self, query: CallbackQuery) -> bool {
        let mut pending = self.pending.lock();
        if pending.len() != 1 {
            return false;
        }
        let Some(flow_id) = pending.keys().next().cloned() else { return false };
        match pending.remove(&flow_id) {
            Some(tx) => tx.send(query).is_ok(),
            None => false,
        }
    }

    /// Drop a flow without resolving it (the waiter's own timeout fired).
    pub fn cancel(&self, flow_id: &str) {
        self.pending.lock().remove(flow_id);
    }
}

#[cfg(test)]
#[path = "oauth_tests.rs"]
mod tests;
