// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket server implementation.
//!
//! Each text frame is one request. Every request gets exactly one reply
//! carrying the same `request_id`; frames that do not parse get an error
//! with no id.

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info};

use rc_core::protocol::{ClientMessage, ServerMessage};

use crate::state::ServerState;

/// Run the WebSocket server on the given address.
pub async fn run(addr: SocketAddr, state: ServerState) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on: {}", addr);

    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let state = state.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }
}

/// Handle a single WebSocket connection.
pub(crate) async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: ServerState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    info!("New WebSocket connection from: {}", peer_addr);

    let (mut ws_sink, mut ws_stream) = ws_stream.split();

    while let Some(msg) = ws_stream.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let response = handle_client_message(&text, &state).await;
                ws_sink.send(Message::Text(response.to_json()?.into())).await?;
            }
            Ok(Message::Close(_)) => {
                info!("Client {} disconnected", peer_addr);
                break;
            }
            Ok(Message::Ping(data)) => {
                ws_sink.send(Message::Pong(data)).await?;
            }
            Ok(_) => {
                // Binary, Pong and raw frames carry no requests.
            }
            Err(e) => {
                error!("WebSocket error from {}: {}", peer_addr, e);
                break;
            }
        }
    }

    info!("Connection closed: {}", peer_addr);
    Ok(())
}

/// Process one client frame and build its reply.
pub(crate) async fn handle_client_message(text: &str, state: &ServerState) -> ServerMessage {
    let msg = match ClientMessage::from_json(text) {
        Ok(msg) => msg,
        Err(e) => return ServerMessage::error(None, format!("malformed request: {}", e)),
    };
    debug!("Received message: {:?}", msg);

    let reply = match msg {
        ClientMessage::Create {
            request_id,
            table,
            data,
        } => state
            .create(&table, data)
            .await
            .map(|record| ServerMessage::ok(request_id, Some(record)))
            .map_err(|e| (request_id, e)),

        ClientMessage::Update {
            request_id,
            table,
            id,
            patch,
        } => state
            .update(&table, &id, &patch)
            .await
            .map(|record| {
                if record.is_none() {
                    debug!(table, id, "update for unknown record ignored");
                }
                ServerMessage::ok(request_id, record)
            })
            .map_err(|e| (request_id, e)),

        ClientMessage::Delete {
            request_id,
            table,
            id,
        } => state
            .delete(&table, &id)
            .await
            .map(|_| ServerMessage::ok(request_id, None))
            .map_err(|e| (request_id, e)),

        ClientMessage::Select { request_id, table } => state
            .select(&table)
            .await
            .map(|rows| {
                debug!("Select response: {} rows from {}", rows.len(), table);
                ServerMessage::rows(request_id, rows)
            })
            .map_err(|e| (request_id, e)),

        ClientMessage::Ping { id } => {
            debug!("Ping received: {}", id);
            Ok(ServerMessage::pong(id))
        }
    };

    reply.unwrap_or_else(|(request_id, e)| {
        debug!(request_id, error = %e, "request rejected");
        ServerMessage::error(Some(request_id), e.to_string())
    })
}
