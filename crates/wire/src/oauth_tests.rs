// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parses_from_query_string() {
    let qs = "token=abc123&workspaceId=ws-1&workspaceName=Acme";
    let parsed: CallbackQuery = serde_urlencoded_lite(qs);
    assert_eq!(parsed.token, "abc123");
    assert_eq!(parsed.workspace_id, "ws-1");
    assert_eq!(parsed.workspace_name, "Acme");
    assert_eq!(parsed.state, None);
}

#[test]
fn state_is_optional() {
    let qs = "token=abc&workspaceId=ws-1&workspaceName=Acme&state=flow-9";
    let parsed: CallbackQuery = serde_urlencoded_lite(qs);
    assert_eq!(parsed.state.as_deref(), Some("flow-9"));
}

/// Minimal query-string decoder for the test — avoids pulling in a full
/// `serde_urlencoded` dependency just for this one shape.
fn serde_urlencoded_lite(qs: &str) -> CallbackQuery {
    let mut token = None;
    let mut workspace_id = None;
    let mut workspace_name = None;
    let mut state = None;
    for pair in qs.split('&') {
        let mut parts = pair.splitn(2, '=');
        let key = parts.next().unwrap_or_default();
        let value = parts.next().unwrap_or_default().to_string();
        match key {
            "token" => token = Some(value),
            "workspaceId" => workspace_id = Some(value),
            "workspaceName" => workspace_name = Some(value),
            "state" => state = Some(value),
            _ => {}
        }
    }
    CallbackQuery {
        token: token.expect("token"),
        workspace_id: workspace_id.expect("workspaceId"),
        workspace_name: workspace_name.expect("workspaceName"),
        state,
    }
}
