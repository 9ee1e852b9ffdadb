// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 lipiflow contributors

//! Binary smoke tests

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("lipiflow")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("align"))
        .stdout(predicate::str::contains("amalgamate"))
        .stdout(predicate::str::contains("pipeline"));
}

#[test]
fn test_version_flag() {
    Command::cargo_bin("lipiflow")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_unknown_subcommand_is_rejected() {
    Command::cargo_bin("lipiflow")
        .unwrap()
        .arg("frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_state_show_reports_empty_store() {
    let temp = tempfile::TempDir::new().unwrap();

    Command::cargo_bin("lipiflow")
        .unwrap()
        .args(["state", "show"])
        .arg("--config-dir")
        .arg(temp.path())
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No recorded state"));
}
