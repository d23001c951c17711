// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
#[serial]
fn load_sets_variables_not_already_present() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(".env");
    std::fs::write(&path, "FOO_BAR_TEST=from-file\n# a comment\n\nQUOTED_TEST=\"quoted value\"\n").expect("write");
    std::env::remove_var("FOO_BAR_TEST");
    std::env::remove_var("QUOTED_TEST");

    load(&path).expect("load should succeed");

    assert_eq!(std::env::var("FOO_BAR_TEST").unwrap(), "from-file");
    assert_eq!(std::env::var("QUOTED_TEST").unwrap(), "quoted value");
    std::env::remove_var("FOO_BAR_TEST");
    std::env::remove_var("QUOTED_TEST");
}

#[test]
#[serial]
fn load_does_not_override_an_existing_variable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(".env");
    std::fs::write(&path, "ALREADY_SET_TEST=from-file\n").expect("write");
    std::env::set_var("ALREADY_SET_TEST", "from-shell");

    load(&path).expect("load should succeed");

    assert_eq!(std::env::var("ALREADY_SET_TEST").unwrap(), "from-shell");
    std::env::remove_var("ALREADY_SET_TEST");
}

#[test]
fn load_errors_when_file_is_missing() {
    let err = load(std::path::Path::new("/no/such/env/file")).expect_err("missing file should error");
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
}
