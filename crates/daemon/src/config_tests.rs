// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use cyrus_core::RepositoryId;
use serial_test::serial;
use std::path::PathBuf;

fn minimal_config() -> Config {
    Config {
        repositories: vec![RepositoryConfig {
            id: RepositoryId::new("repo-1"),
            name: "repo-1".to_string(),
            root_path: "/repos/one".into(),
            base_branch: "main".to_string(),
            workspace_root: "/workspaces/one".into(),
            tracker_token: "token".to_string(),
            tracker_workspace_id: "org-1".to_string(),
            team_keys: Vec::new(),
            project_keys: Vec::new(),
            allowed_tools: vec!["Read".to_string()],
            disallowed_tools: Vec::new(),
            label_prompts: Default::default(),
            is_active: true,
        }],
        port: None,
        host_external: None,
        webhook_secret: Some("shh".to_string()),
        tunnel_auth_token: None,
        global_setup_script: None,
        customer_id: None,
    }
}

fn clear_env() {
    for key in [
        "CYRUS_SERVER_PORT",
        "CYRUS_HOST_EXTERNAL",
        "CYRUS_BASE_URL",
        "PROXY_URL",
        "CYRUS_DEFAULT_MODEL",
        "CYRUS_DEFAULT_FALLBACK_MODEL",
        "ALLOWED_TOOLS",
        "DISALLOWED_TOOLS",
        "LINEAR_OAUTH_TOKEN",
        "LINEAR_WORKSPACE_ID",
    ] {
        std::env::remove_var(key);
    }
}

#[tokio::test]
#[serial]
async fn load_reads_config_and_applies_defaults() {
    clear_env();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = config_path(dir.path());
    tokio::fs::create_dir_all(path.parent().expect("parent")).await.expect("mkdir");
    tokio::fs::write(&path, serde_json::to_vec(&minimal_config()).expect("serialize")).await.expect("write");

    let resolved = load(dir.path()).await.expect("load should succeed");
    assert_eq!(resolved.port, 3456);
    assert!(!resolved.host_external);
    assert_eq!(resolved.webhook_secret, "shh");
    assert_eq!(resolved.repositories.len(), 1);
}

#[tokio::test]
async fn load_errors_on_malformed_json() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = config_path(dir.path());
    tokio::fs::create_dir_all(path.parent().expect("parent")).await.expect("mkdir");
    tokio::fs::write(&path, b"not json").await.expect("write");

    let err = load(dir.path()).await.expect_err("malformed config should error");
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[tokio::test]
async fn load_errors_on_duplicate_repository_ids() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = config_path(dir.path());
    tokio::fs::create_dir_all(path.parent().expect("parent")).await.expect("mkdir");
    let mut config = minimal_config();
    config.repositories.push(config.repositories[0].clone());
    tokio::fs::write(&path, serde_json::to_vec(&config).expect("serialize")).await.expect("write");

    let err = load(dir.path()).await.expect_err("duplicate ids should error");
    assert!(matches!(err, ConfigError::Validation(cyrus_core::ConfigError::DuplicateRepositoryId(_))));
}

#[test]
#[serial]
fn resolve_with_env_overrides_port_and_host_external() {
    clear_env();
    std::env::set_var("CYRUS_SERVER_PORT", "9000");
    std::env::set_var("CYRUS_HOST_EXTERNAL", "true");

    let resolved = resolve_with_env(PathBuf::from("/cyrus-home"), minimal_config());
    assert_eq!(resolved.port, 9000);
    assert!(resolved.host_external);
    clear_env();
}

#[test]
#[serial]
fn resolve_with_env_config_value_wins_when_env_unset() {
    clear_env();
    let mut config = minimal_config();
    config.port = Some(4242);

    let resolved = resolve_with_env(PathBuf::from("/cyrus-home"), config);
    assert_eq!(resolved.port, 4242);
}

#[test]
#[serial]
fn resolve_with_env_fills_blank_tracker_credentials_from_legacy_env() {
    clear_env();
    std::env::set_var("LINEAR_OAUTH_TOKEN", "legacy-token");
    std::env::set_var("LINEAR_WORKSPACE_ID", "legacy-workspace");

    let mut config = minimal_config();
    config.repositories[0].tracker_token = String::new();
    config.repositories[0].tracker_workspace_id = String::new();

    let resolved = resolve_with_env(PathBuf::from("/cyrus-home"), config);
    assert_eq!(resolved.repositories[0].tracker_token, "legacy-token");
    assert_eq!(resolved.repositories[0].tracker_workspace_id, "legacy-workspace");
    clear_env();
}

#[test]
#[serial]
fn resolve_with_env_does_not_override_a_populated_tracker_token() {
    clear_env();
    std::env::set_var("LINEAR_OAUTH_TOKEN", "legacy-token");

    let resolved = resolve_with_env(PathBuf::from("/cyrus-home"), minimal_config());
    assert_eq!(resolved.repositories[0].tracker_token, "token");
    clear_env();
}

#[test]
#[serial]
fn resolve_with_env_fills_blank_tool_lists_from_csv_env() {
    clear_env();
    std::env::set_var("ALLOWED_TOOLS", "Read, Write , Bash");
    std::env::set_var("DISALLOWED_TOOLS", "rm");

    let mut config = minimal_config();
    config.repositories[0].allowed_tools = Vec::new();

    let resolved = resolve_with_env(PathBuf::from("/cyrus-home"), config);
    assert_eq!(resolved.repositories[0].allowed_tools, vec!["Read", "Write", "Bash"]);
    assert_eq!(resolved.repositories[0].disallowed_tools, vec!["rm"]);
    clear_env();
}

#[test]
fn default_cyrus_home_ends_with_dot_cyrus() {
    let home = default_cyrus_home();
    assert_eq!(home.file_name().expect("file name"), std::ffi::OsStr::new(".cyrus"));
}

#[test]
fn snapshot_path_lives_under_state() {
    let path = snapshot_path(std::path::Path::new("/cyrus-home"));
    assert_eq!(path, PathBuf::from("/cyrus-home/state/snapshot.json"));
}
