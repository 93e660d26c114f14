// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Rust specs for queueing changes without a server:
//! `enqueue`, `pending`, `status` and the record commands in local-only mode.

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

fn init_temp() -> TempDir {
    let temp = TempDir::new().unwrap();
    rc().arg("init").current_dir(temp.path()).assert().success();
    temp
}

fn pending_json(temp: &TempDir) -> Vec<serde_json::Value> {
    let output = rc()
        .args(["pending", "-o", "json"])
        .current_dir(temp.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn enqueue_then_pending_lists_in_order() {
    let temp = init_temp();

    rc().args(["enqueue", "students", "insert", r#"{"id":"s1","name":"Amal"}"#])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Queued INSERT s1 on students"));
    rc().args(["enqueue", "fees", "update", r#"{"id":"f1","amount":40}"#])
        .current_dir(temp.path())
        .assert()
        .success();

    rc().arg("pending")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("INSERT  students  s1"))
        .stdout(predicate::str::contains("UPDATE  fees  f1"))
        .stdout(predicate::str::contains("2 pending"));

    let entries = pending_json(&temp);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["table"], "students");
    assert_eq!(entries[1]["operation"], "UPDATE");
    assert_eq!(entries[1]["sync_status"], "pending");
}

#[test]
fn pending_on_empty_queue() {
    let temp = init_temp();

    rc().arg("pending")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout("No pending changes\n");
}

#[parameterized(
    update = { "update" },
    delete = { "delete" },
)]
fn enqueue_without_id_is_refused(operation: &str) {
    let temp = init_temp();

    rc().args(["enqueue", "students", operation, r#"{"name":"Amal"}"#])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("requires a record id"));

    assert!(pending_json(&temp).is_empty());
}

#[test]
fn enqueue_rejects_bad_json() {
    let temp = init_temp();

    rc().args(["enqueue", "students", "insert", "{name: Amal}"])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid JSON payload"));
}

#[test]
fn enqueue_rejects_unknown_operation() {
    let temp = init_temp();

    rc().args(["enqueue", "students", "upsert", r#"{"id":"s1"}"#])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid operation"));
}

#[test]
fn status_in_local_only_mode() {
    let temp = init_temp();
    rc().args(["enqueue", "attendance", "insert", r#"{"student":"s1"}"#])
        .current_dir(temp.path())
        .assert()
        .success();

    rc().arg("status")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Pending:    1"))
        .stdout(predicate::str::contains("Last sync:  never"))
        .stdout(predicate::str::contains("local only"))
        .stdout(predicate::str::contains("Agent:      stopped"));
}

#[test]
fn status_json() {
    let temp = init_temp();

    let output = rc()
        .args(["status", "--output", "json"])
        .current_dir(temp.path())
        .output()
        .unwrap();

    let status: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(status["pending"], 0);
    assert!(status["last_sync"].is_null());
    assert!(status["remote"].is_null());
}

#[test]
fn sync_without_remote_fails_with_hint() {
    let temp = init_temp();

    rc().arg("sync")
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no remote configured"))
        .stderr(predicate::str::contains("hint:"));
}

#[test]
fn local_insert_is_queued_and_cached() {
    let temp = init_temp();

    rc().args(["insert", "students", r#"{"name":"Amal"}"#])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"local-"))
        .stdout(predicate::str::contains("Saved offline as q-"));

    rc().args(["fetch", "students"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\":\"Amal\""));

    let entries = pending_json(&temp);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["operation"], "INSERT");
}

#[test]
fn local_update_and_delete() {
    let temp = init_temp();
    rc().args(["insert", "fees", r#"{"id":"f1","amount":40}"#])
        .current_dir(temp.path())
        .assert()
        .success();

    rc().args(["update", "fees", "f1", r#"{"paid":true}"#])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"amount\": 40"))
        .stdout(predicate::str::contains("\"paid\": true"));

    rc().args(["delete", "fees", "f1"])
        .current_dir(temp.path())
        .assert()
        .success();

    rc().args(["fetch", "fees"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout("No records\n");

    let ops: Vec<_> = pending_json(&temp)
        .iter()
        .map(|e| e["operation"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ops, vec!["INSERT", "UPDATE", "DELETE"]);
}
