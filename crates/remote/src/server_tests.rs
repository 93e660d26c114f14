// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Test server utilities and request handling tests.

#![cfg(test)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use rc_core::protocol::{ClientMessage, ServerMessage};

use crate::server::{self, handle_client_message};
use crate::state::ServerState;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A record server on a random local port.
struct TestServer {
    addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    state: ServerState,
}

impl TestServer {
    async fn start() -> Self {
        let state = ServerState::in_memory().unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let state_clone = state.clone();
        tokio::spawn(async move {
            tokio::select! {
                result = accept_loop(listener, state_clone) => {
                    if let Err(e) = result {
                        eprintln!("Test server error: {}", e);
                    }
                }
                _ = shutdown_rx => {}
            }
        });

        TestServer {
            addr,
            shutdown_tx,
            state,
        }
    }

    fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    async fn connect(&self) -> (SplitSink<Socket, Message>, SplitStream<Socket>) {
        let (ws, _) = connect_async(&self.ws_url()).await.unwrap();
        ws.split()
    }

    fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
    }
}

async fn accept_loop(
    listener: TcpListener,
    state: ServerState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let state = state.clone();
        tokio::spawn(async move {
            let _ = server::handle_connection(stream, peer_addr, state).await;
        });
    }
}

async fn next_reply(stream: &mut SplitStream<Socket>) -> ServerMessage {
    match timeout(Duration::from_secs(5), stream.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => ServerMessage::from_json(&text).unwrap(),
        Ok(other) => panic!("expected a text reply, got {:?}", other),
        Err(_) => panic!("timed out waiting for a reply"),
    }
}

async fn request(
    sink: &mut SplitSink<Socket, Message>,
    stream: &mut SplitStream<Socket>,
    msg: ClientMessage,
) -> ServerMessage {
    sink.send(Message::Text(msg.to_json().unwrap().into()))
        .await
        .unwrap();
    next_reply(stream).await
}

#[tokio::test]
async fn test_ping_pong() {
    let server = TestServer::start().await;
    let (mut sink, mut stream) = server.connect().await;

    let reply = request(&mut sink, &mut stream, ClientMessage::ping(42)).await;

    assert_eq!(reply, ServerMessage::pong(42));
    server.shutdown();
}

#[tokio::test]
async fn test_crud_over_websocket() {
    let server = TestServer::start().await;
    let (mut sink, mut stream) = server.connect().await;

    let created = request(
        &mut sink,
        &mut stream,
        ClientMessage::create(1, "students", json!({"id": "s1", "name": "Amal"})),
    )
    .await;
    assert_eq!(
        created,
        ServerMessage::ok(1, Some(json!({"id": "s1", "name": "Amal"})))
    );

    let updated = request(
        &mut sink,
        &mut stream,
        ClientMessage::update(2, "students", "s1", json!({"grade": 4})),
    )
    .await;
    assert_eq!(
        updated,
        ServerMessage::ok(2, Some(json!({"id": "s1", "name": "Amal", "grade": 4})))
    );

    let rows = request(&mut sink, &mut stream, ClientMessage::select(3, "students")).await;
    assert_eq!(
        rows,
        ServerMessage::rows(3, vec![json!({"id": "s1", "name": "Amal", "grade": 4})])
    );

    let deleted = request(
        &mut sink,
        &mut stream,
        ClientMessage::delete(4, "students", "s1"),
    )
    .await;
    assert_eq!(deleted, ServerMessage::ok(4, None));
    assert!(server.state.select("students").await.unwrap().is_empty());

    server.shutdown();
}

#[tokio::test]
async fn test_malformed_json_returns_error_without_id() {
    let server = TestServer::start().await;
    let (mut sink, mut stream) = server.connect().await;

    sink.send(Message::Text("not json".into())).await.unwrap();
    let reply = next_reply(&mut stream).await;

    match reply {
        ServerMessage::Error {
            request_id: None,
            message,
        } => assert!(message.contains("malformed request")),
        other => panic!("expected an error reply, got {:?}", other),
    }
    server.shutdown();
}

#[tokio::test]
async fn test_websocket_ping_frame() {
    let server = TestServer::start().await;
    let (mut sink, mut stream) = server.connect().await;

    sink.send(Message::Ping(vec![1, 2, 3].into())).await.unwrap();

    match timeout(Duration::from_secs(5), stream.next()).await {
        Ok(Some(Ok(Message::Pong(data)))) => assert_eq!(data.as_ref(), &[1, 2, 3]),
        other => panic!("expected pong frame, got {:?}", other),
    }
    server.shutdown();
}

#[tokio::test]
async fn test_duplicate_create_is_rejected_with_request_id() {
    let state = ServerState::in_memory().unwrap();
    let create = ClientMessage::create(7, "fees", json!({"id": "f1", "amount": 40}));
    let text = create.to_json().unwrap();

    let first = handle_client_message(&text, &state).await;
    let second = handle_client_message(&text, &state).await;

    assert!(matches!(first, ServerMessage::Ok { request_id: 7, .. }));
    assert_eq!(
        second,
        ServerMessage::error(Some(7), "record f1 already exists in fees")
    );
}

#[tokio::test]
async fn test_update_unknown_record_is_ok_without_record() {
    let state = ServerState::in_memory().unwrap();
    let text = ClientMessage::update(3, "students", "ghost", json!({"grade": 1}))
        .to_json()
        .unwrap();

    let reply = handle_client_message(&text, &state).await;

    assert_eq!(reply, ServerMessage::ok(3, None));
}

#[tokio::test]
async fn test_delete_unknown_record_is_ok() {
    let state = ServerState::in_memory().unwrap();
    let text = ClientMessage::delete(5, "fees", "f404").to_json().unwrap();

    assert_eq!(
        handle_client_message(&text, &state).await,
        ServerMessage::ok(5, None)
    );
}

#[tokio::test]
async fn test_replies_follow_request_order() {
    let server = TestServer::start().await;
    let (mut sink, mut stream) = server.connect().await;

    for rid in 1..=3 {
        let msg = ClientMessage::create(rid, "attendance", json!({"id": format!("a{}", rid)}));
        sink.send(Message::Text(msg.to_json().unwrap().into()))
            .await
            .unwrap();
    }

    for rid in 1..=3 {
        assert_eq!(next_reply(&mut stream).await.request_id(), Some(rid));
    }
    server.shutdown();
}
