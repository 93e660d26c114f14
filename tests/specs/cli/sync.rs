// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Rust specs for `rollcall sync` against reachable and unreachable servers.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use fs2::FileExt;
use futures_util::{SinkExt, StreamExt};
use predicates::prelude::*;
use rc_core::protocol::{ClientMessage, ServerMessage};
use tempfile::TempDir;
use tokio_tungstenite::tungstenite::Message;

/// Nothing listens on port 1, so connects are refused immediately.
const UNREACHABLE: &str = "ws://127.0.0.1:1";

fn rc() -> Command {
    let mut cmd = cargo_bin_cmd!("rollcall");
    cmd.env_remove("ROLLCALL_DIR").env_remove("ROLLCALL_LOG");
    cmd
}

fn init_with_remote(url: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    rc().args(["init", "--remote", url])
        .current_dir(temp.path())
        .assert()
        .success();
    temp
}

fn enqueue(temp: &TempDir, table: &str, operation: &str, data: &str) {
    rc().args(["enqueue", table, operation, data])
        .current_dir(temp.path())
        .assert()
        .success();
}

/// Requests seen by [`spawn_server`], in arrival order.
type Seen = Arc<Mutex<Vec<ClientMessage>>>;

/// A record server on its own thread that accepts everything.
fn spawn_server() -> (SocketAddr, Seen) {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();
    let seen: Seen = Arc::default();

    let server_seen = Arc::clone(&seen);
    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, Arc::clone(&server_seen)));
            }
        });
    });

    (addr, seen)
}

async fn serve(stream: tokio::net::TcpStream, seen: Seen) {
    // Reachability probes connect and close without a handshake.
    let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
        return;
    };
    let (mut sink, mut stream) = ws.split();
    while let Some(Ok(Message::Text(text))) = stream.next().await {
        let msg = ClientMessage::from_json(&text).unwrap();
        let reply = match &msg {
            ClientMessage::Create {
                request_id, data, ..
            } => ServerMessage::ok(*request_id, Some(data.clone())),
            ClientMessage::Update { request_id, .. } | ClientMessage::Delete { request_id, .. } => {
                ServerMessage::ok(*request_id, None)
            }
            ClientMessage::Select { request_id, .. } => ServerMessage::rows(*request_id, vec![]),
            ClientMessage::Ping { id } => ServerMessage::pong(*id),
        };
        seen.lock().unwrap().push(msg);
        if sink
            .send(Message::Text(reply.to_json().unwrap().into()))
            .await
            .is_err()
        {
            break;
        }
    }
}

#[test]
fn offline_sync_keeps_changes() {
    let temp = init_with_remote(UNREACHABLE);
    enqueue(&temp, "students", "insert", r#"{"id":"s1","name":"Amal"}"#);

    rc().arg("sync")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Offline: 1 change(s) saved locally"));

    rc().arg("pending")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("1 pending"));
}

#[test]
fn status_reports_offline_remote() {
    let temp = init_with_remote(UNREACHABLE);

    rc().arg("status")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("offline (ws://127.0.0.1:1)"));
}

#[test]
fn offline_insert_falls_back_to_queue() {
    let temp = init_with_remote(UNREACHABLE);

    rc().args(["insert", "attendance", r#"{"student":"s1","status":"present"}"#])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved offline"));
}

#[test]
fn sync_replays_queue_in_order_and_drains_it() {
    let (addr, seen) = spawn_server();
    let temp = init_with_remote(&format!("ws://{}", addr));
    enqueue(&temp, "students", "insert", r#"{"id":"s1","name":"Amal"}"#);
    enqueue(&temp, "students", "update", r#"{"id":"s1","grade":4}"#);
    enqueue(&temp, "fees", "delete", r#"{"id":"f9"}"#);

    rc().arg("sync")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Synced 3 of 3 change(s)"));

    rc().arg("pending")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout("No pending changes\n");

    let seen = seen.lock().unwrap();
    let kinds: Vec<_> = seen
        .iter()
        .map(|m| match m {
            ClientMessage::Create { table, .. } => format!("create {}", table),
            ClientMessage::Update { table, id, .. } => format!("update {} {}", table, id),
            ClientMessage::Delete { table, id, .. } => format!("delete {} {}", table, id),
            other => panic!("unexpected request {:?}", other),
        })
        .collect();
    assert_eq!(
        kinds,
        vec!["create students", "update students s1", "delete fees f9"]
    );
}

#[test]
fn sync_with_empty_queue() {
    let (addr, _seen) = spawn_server();
    let temp = init_with_remote(&format!("ws://{}", addr));

    rc().arg("sync")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout("Nothing to sync\n");

    rc().arg("status")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Last sync:  never"));
}

#[test]
fn successful_sync_records_last_sync_time() {
    let (addr, _seen) = spawn_server();
    let temp = init_with_remote(&format!("ws://{}", addr));
    enqueue(&temp, "fees", "insert", r#"{"id":"f1","amount":40}"#);

    rc().arg("sync").current_dir(temp.path()).assert().success();

    rc().arg("status")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Last sync:  never").not())
        .stdout(predicate::str::contains("Pending:    0"));
}

#[test]
fn sync_refuses_while_agent_holds_lock() {
    let temp = init_with_remote(UNREACHABLE);
    let lock = std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(temp.path().join(".rollcall/agent.lock"))
        .unwrap();
    lock.try_lock_exclusive().unwrap();

    rc().arg("sync")
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("another sync agent is running"));

    rc().arg("status")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Agent:      running"));
}
