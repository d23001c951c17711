// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resolves the tracker's GraphQL endpoint. The tracker's concrete wire
//! format is out of scope — this only decides where outbound
//! requests go.

const DEFAULT_GRAPHQL_URL: &str = "https://api.tracker.internal/graphql";

/// `PROXY_URL` overrides the default
/// when the tracker is only reachable through a relay.
pub fn graphql_url(proxy_url: Option<&str>) -> String {
    proxy_url.map(str::to_string).unwrap_or_else(|| DEFAULT_GRAPHQL_URL.to_string())
}
