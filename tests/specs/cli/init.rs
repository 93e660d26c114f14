// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Rust specs for `rollcall init`.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use yare::parameterized;

fn rc() -> Command {
    let mut cmd = cargo_bin_cmd!("rollcall");
    cmd.env_remove("ROLLCALL_DIR").env_remove("ROLLCALL_LOG");
    cmd
}

#[test]
fn creates_rollcall_directory() {
    let temp = TempDir::new().unwrap();

    rc().arg("init")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized rollcall"))
        .stdout(predicate::str::contains("No remote configured"));

    assert!(temp.path().join(".rollcall/config.toml").exists());
    let gitignore = std::fs::read_to_string(temp.path().join(".rollcall/.gitignore")).unwrap();
    assert!(gitignore.contains("queue.db"));
}

#[test]
fn fails_if_already_initialized() {
    let temp = TempDir::new().unwrap();
    rc().arg("init").current_dir(temp.path()).assert().success();

    rc().arg("init")
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialized"));
}

#[test]
fn path_option_initializes_elsewhere() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("school");
    std::fs::create_dir(&target).unwrap();

    rc().arg("init")
        .arg("--path")
        .arg(&target)
        .current_dir(temp.path())
        .assert()
        .success();

    assert!(target.join(".rollcall/config.toml").exists());
    assert!(!temp.path().join(".rollcall").exists());
}

#[test]
fn remote_is_written_to_config() {
    let temp = TempDir::new().unwrap();

    rc().args(["init", "--remote", "ws://10.0.0.5:7890"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Remote: ws://10.0.0.5:7890"));

    let config = std::fs::read_to_string(temp.path().join(".rollcall/config.toml")).unwrap();
    assert!(config.contains("[remote]"));
    assert!(config.contains("url = \"ws://10.0.0.5:7890\""));
}

#[parameterized(
    http = { "http://10.0.0.5:7890" },
    no_scheme = { "10.0.0.5:7890" },
    no_host = { "ws://" },
)]
fn rejects_non_websocket_remote(url: &str) {
    let temp = TempDir::new().unwrap();

    rc().args(["init", "--remote", url])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid remote URL"));

    assert!(!temp.path().join(".rollcall").exists());
}

#[test]
fn commands_outside_workspace_fail() {
    let temp = TempDir::new().unwrap();

    rc().arg("pending")
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

#[test]
fn subdirectories_find_the_workspace() {
    let temp = TempDir::new().unwrap();
    rc().arg("init").current_dir(temp.path()).assert().success();
    let nested = temp.path().join("reports/2026");
    std::fs::create_dir_all(&nested).unwrap();

    rc().arg("pending")
        .current_dir(&nested)
        .assert()
        .success()
        .stdout(predicate::str::contains("No pending changes"));
}

#[test]
fn rollcall_dir_overrides_lookup() {
    let temp = TempDir::new().unwrap();
    rc().arg("init").current_dir(temp.path()).assert().success();
    let elsewhere = TempDir::new().unwrap();

    rc().arg("status")
        .env("ROLLCALL_DIR", temp.path().join(".rollcall"))
        .current_dir(elsewhere.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Pending:    0"));
}
