// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn repo(id: &str, workspace_id: &str, team_keys: &[&str], project_keys: &[&str]) -> RepositoryConfig {
    RepositoryConfig {
        id: RepositoryId::new(id),
        name: id.to_string(),
        root_path: PathBuf::from("/repos").join(id),
        base_branch: "main".to_string(),
        workspace_root: PathBuf::from("/workspaces").join(id),
        tracker_token: "token".to_string(),
        tracker_workspace_id: workspace_id.to_string(),
        team_keys: team_keys.iter().map(|s| s.to_string()).collect(),
        project_keys: project_keys.iter().map(|s| s.to_string()).collect(),
        allowed_tools: vec!["Read".to_string()],
        disallowed_tools: Vec::new(),
        label_prompts: BTreeMap::new(),
        is_active: true,
    }
}

#[test]
fn catch_all_has_no_team_or_project_keys() {
    let r = repo("r1", "ws1", &[], &[]);
    assert!(r.is_catch_all());
}

#[test]
fn repo_with_team_keys_is_not_catch_all() {
    let r = repo("r1", "ws1", &["CEE"], &[]);
    assert!(!r.is_catch_all());
}

#[test]
fn duplicate_repository_ids_are_rejected() {
    let repos = vec![repo("dup", "ws1", &["CEE"], &[]), repo("dup", "ws1", &["ABC"], &[])];
    let err = validate_repositories(&repos).unwrap_err();
    assert!(matches!(err, ConfigError::DuplicateRepositoryId(id) if id == "dup"));
}

#[test]
fn multiple_catch_alls_in_one_workspace_warn_but_do_not_error() {
    let repos = vec![repo("a", "ws1", &[], &[]), repo("b", "ws1", &[], &[])];
    let warnings = validate_repositories(&repos).expect("should not be fatal");
    assert_eq!(warnings.len(), 1);
    assert!(matches!(&warnings[0], ConfigError::MultipleCatchAll { first, second, .. } if first == "a" && second == "b"));
}

#[test]
fn catch_alls_in_different_workspaces_do_not_warn() {
    let repos = vec![repo("a", "ws1", &[], &[]), repo("b", "ws2", &[], &[])];
    let warnings = validate_repositories(&repos).expect("should not be fatal");
    assert!(warnings.is_empty());
}

#[test]
fn repository_config_roundtrips_through_json_with_field_renames() {
    let r = repo("r1", "ws1", &["CEE"], &[]);
    let json = serde_json::to_value(&r).expect("serialize");
    assert_eq!(json["tracker-token"], "token");
    assert_eq!(json["tracker-workspace-id"], "ws1");
    let back: RepositoryConfig = serde_json::from_value(json).expect("deserialize");
    assert_eq!(back, r);
}
