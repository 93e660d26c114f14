// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! [`Backend`] implementation that talks to `rc-remote` over a [`Transport`].
//!
//! Calls are serialized over a single connection. The connection is opened
//! lazily on the first call and reopened after any transport failure.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use rc_core::protocol::{ClientMessage, ServerMessage};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::backend::{Backend, BackendFuture, DispatchError, DispatchResult};
use super::transport::{Transport, WebSocketTransport};

/// Remote record server reached through a request/response transport.
pub struct RemoteBackend<T: Transport = WebSocketTransport> {
    url: String,
    connect_timeout: Duration,
    transport: Mutex<T>,
    next_request_id: AtomicU64,
}

impl RemoteBackend<WebSocketTransport> {
    pub fn new(url: impl Into<String>, connect_timeout: Duration) -> Self {
        Self::with_transport(url, connect_timeout, WebSocketTransport::new())
    }
}

impl<T: Transport> RemoteBackend<T> {
    /// Create a backend over a custom transport (for testing).
    pub fn with_transport(url: impl Into<String>, connect_timeout: Duration, transport: T) -> Self {
        RemoteBackend {
            url: url.into(),
            connect_timeout,
            transport: Mutex::new(transport),
            next_request_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one request and wait for the reply carrying its `request_id`.
    ///
    /// Replies to earlier, abandoned requests are skipped.
    async fn request(
        &self,
        build: impl FnOnce(u64) -> ClientMessage,
    ) -> DispatchResult<ServerMessage> {
        let mut transport = self.transport.lock().await;

        if !transport.is_connected() {
            debug!(url = %self.url, "connecting to record server");
            match tokio::time::timeout(self.connect_timeout, transport.connect(&self.url)).await {
                Ok(result) => result?,
                Err(_) => return Err(DispatchError::Timeout(self.connect_timeout)),
            }
        }

        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        if let Err(e) = transport.send(build(request_id)).await {
            let _ = transport.disconnect().await;
            return Err(e.into());
        }

        loop {
            match transport.recv().await {
                Ok(Some(reply)) if reply.request_id() == Some(request_id) => return Ok(reply),
                // Id-less errors are not attributable to the request in flight.
                Ok(Some(ServerMessage::Error {
                    request_id: None,
                    message,
                })) => {
                    warn!(%message, request_id, "server error without a request id");
                }
                Ok(Some(stale)) => {
                    debug!(?stale, request_id, "skipping unrelated reply");
                }
                Ok(None) => {
                    return Err(DispatchError::Unavailable(
                        "connection closed by server".to_string(),
                    ))
                }
                Err(e) => {
                    let _ = transport.disconnect().await;
                    return Err(e.into());
                }
            }
        }
    }
}

fn unexpected(reply: ServerMessage) -> DispatchError {
    match reply {
        ServerMessage::Error { message, .. } => DispatchError::Rejected(message),
        other => DispatchError::Protocol(format!("unexpected reply: {:?}", other)),
    }
}

impl<T: Transport> Backend for RemoteBackend<T> {
    fn create<'a>(&'a self, table: &'a str, data: &'a Value) -> BackendFuture<'a, Value> {
        Box::pin(async move {
            let reply = self
                .request(|rid| ClientMessage::create(rid, table, data.clone()))
                .await?;
            match reply {
                ServerMessage::Ok { record, .. } => Ok(record.unwrap_or_else(|| data.clone())),
                other => Err(unexpected(other)),
            }
        })
    }

    fn update<'a>(
        &'a self,
        table: &'a str,
        id: &'a str,
        patch: &'a Value,
    ) -> BackendFuture<'a, Option<Value>> {
        Box::pin(async move {
            let reply = self
                .request(|rid| ClientMessage::update(rid, table, id, patch.clone()))
                .await?;
            match reply {
                ServerMessage::Ok { record, .. } => Ok(record),
                other => Err(unexpected(other)),
            }
        })
    }

    fn delete<'a>(&'a self, table: &'a str, id: &'a str) -> BackendFuture<'a, ()> {
        Box::pin(async move {
            let reply = self
                .request(|rid| ClientMessage::delete(rid, table, id))
                .await?;
            match reply {
                ServerMessage::Ok { .. } => Ok(()),
                other => Err(unexpected(other)),
            }
        })
    }

    fn select<'a>(&'a self, table: &'a str) -> BackendFuture<'a, Vec<Value>> {
        Box::pin(async move {
            let reply = self.request(|rid| ClientMessage::select(rid, table)).await?;
            match reply {
                ServerMessage::Rows { rows, .. } => Ok(rows),
                other => Err(unexpected(other)),
            }
        })
    }
}
