// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn system_init_event_round_trips_through_json() {
    let event = AgentEvent::SystemInit { agent_token: "tok-1".into(), model: "claude".into() };
    let json = serde_json::to_string(&event).unwrap();
    assert!(json.contains("\"type\":\"system_init\""));
    let back: AgentEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(back, event);
}

#[test]
fn action_result_event_round_trips() {
    let event = AgentEvent::ActionResult {
        tool_name: "Bash".into(),
        outputs: serde_json::json!({ "stdout": "ok" }),
    };
    let json = serde_json::to_string(&event).unwrap();
    let back: AgentEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(back, event);
}

#[test]
fn end_event_carries_optional_exit_code() {
    let event = AgentEvent::End { exit_code: Some(0) };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["exit_code"], 0);

    let event = AgentEvent::End { exit_code: None };
    let json = serde_json::to_value(&event).unwrap();
    assert!(json["exit_code"].is_null());
}
