// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Message transport between the client and the record server.
//!
//! [`Transport`] is the seam tests mock; [`WebSocketTransport`] is the
//! tokio-tungstenite implementation used in production.

use std::future::Future;
use std::pin::Pin;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use rc_core::protocol::{ClientMessage, ServerMessage};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

/// Error type for transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// A frame could not be encoded or decoded.
    #[error("serialization error: {0}")]
    SerializationError(String),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = TransportResult<T>> + Send + 'a>>;

/// A bidirectional, message-oriented connection to the record server.
pub trait Transport: Send + Sync {
    /// Open a connection to `url`, replacing any existing one.
    fn connect(&mut self, url: &str) -> TransportFuture<'_, ()>;

    /// Close the connection. Closing an unconnected transport is a no-op.
    fn disconnect(&mut self) -> TransportFuture<'_, ()>;

    /// Send one request frame.
    fn send(&mut self, msg: ClientMessage) -> TransportFuture<'_, ()>;

    /// Wait for the next reply frame.
    ///
    /// Returns `None` once the server has closed the connection.
    fn recv(&mut self) -> TransportFuture<'_, Option<ServerMessage>>;

    fn is_connected(&self) -> bool;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct Socket {
    sink: SplitSink<WsStream, Message>,
    stream: SplitStream<WsStream>,
}

/// WebSocket transport using tokio-tungstenite.
///
/// Any I/O failure drops the socket, so the next call to
/// [`Transport::is_connected`] reports false and the owner reconnects.
#[derive(Default)]
pub struct WebSocketTransport {
    socket: Option<Socket>,
}

impl WebSocketTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn socket(&mut self) -> TransportResult<&mut Socket> {
        self.socket.as_mut().ok_or(TransportError::ConnectionClosed)
    }

    async fn write_frame(&mut self, text: String) -> TransportResult<()> {
        let socket = self.socket()?;
        let sent = match socket.sink.send(Message::Text(text.into())).await {
            Ok(()) => socket.sink.flush().await,
            Err(e) => Err(e),
        };
        sent.map_err(|e| {
            self.socket = None;
            TransportError::SendFailed(e.to_string())
        })
    }

    async fn read_frame(&mut self) -> TransportResult<Option<String>> {
        let socket = self.socket()?;
        loop {
            match socket.stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text.to_string())),
                Some(Ok(Message::Close(_))) | None => break,
                // Control and binary frames carry nothing for us.
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    self.socket = None;
                    return Err(TransportError::ReceiveFailed(e.to_string()));
                }
            }
        }
        self.socket = None;
        Ok(None)
    }
}

impl Transport for WebSocketTransport {
    fn connect(&mut self, url: &str) -> TransportFuture<'_, ()> {
        let url = url.to_string();
        Box::pin(async move {
            let (ws, _response) = tokio_tungstenite::connect_async(url.as_str())
                .await
                .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
            let (sink, stream) = ws.split();
            self.socket = Some(Socket { sink, stream });
            Ok(())
        })
    }

    fn disconnect(&mut self) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            if let Some(mut socket) = self.socket.take() {
                // Best effort; the peer may already be gone.
                let _ = socket.sink.close().await;
            }
            Ok(())
        })
    }

    fn send(&mut self, msg: ClientMessage) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            let text = msg
                .to_json()
                .map_err(|e| TransportError::SerializationError(e.to_string()))?;
            self.write_frame(text).await
        })
    }

    fn recv(&mut self) -> TransportFuture<'_, Option<ServerMessage>> {
        Box::pin(async move {
            match self.read_frame().await? {
                Some(text) => ServerMessage::from_json(&text)
                    .map(Some)
                    .map_err(|e| TransportError::SerializationError(e.to_string())),
                None => Ok(None),
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.socket.is_some()
    }
}
