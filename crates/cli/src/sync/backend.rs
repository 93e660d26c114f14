// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The remote data service the queue drains into.
//!
//! Everything above this trait treats the backend as "four CRUD calls that
//! may fail". Tests substitute an in-memory backend; production uses
//! [`RemoteBackend`](super::RemoteBackend) over a WebSocket.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use super::transport::TransportError;

/// Why a single backend call did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The backend could not be reached.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The call did not complete within the dispatch timeout.
    #[error("no response within {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The backend answered with an error.
    #[error("rejected by backend: {0}")]
    Rejected(String),

    /// The backend answered with something that was not a valid reply.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The entry cannot be turned into a backend call.
    #[error("invalid entry: {0}")]
    InvalidEntry(String),
}

impl From<TransportError> for DispatchError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::SerializationError(msg) => DispatchError::Protocol(msg),
            other => DispatchError::Unavailable(other.to_string()),
        }
    }
}

/// Result type for backend calls.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Boxed future returned by [`Backend`] methods.
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = DispatchResult<T>> + Send + 'a>>;

/// CRUD access to the remote data service, addressed by collection name.
pub trait Backend: Send + Sync {
    /// Create a record. Returns the record as the backend stored it.
    fn create<'a>(&'a self, table: &'a str, data: &'a Value) -> BackendFuture<'a, Value>;

    /// Merge `patch` into the record `id`.
    ///
    /// Returns the updated record when the backend reports one.
    fn update<'a>(
        &'a self,
        table: &'a str,
        id: &'a str,
        patch: &'a Value,
    ) -> BackendFuture<'a, Option<Value>>;

    /// Remove the record `id`.
    fn delete<'a>(&'a self, table: &'a str, id: &'a str) -> BackendFuture<'a, ()>;

    /// List every record in a collection.
    fn select<'a>(&'a self, table: &'a str) -> BackendFuture<'a, Vec<Value>>;
}

impl<B: Backend + ?Sized> Backend for Arc<B> {
    fn create<'a>(&'a self, table: &'a str, data: &'a Value) -> BackendFuture<'a, Value> {
        (**self).create(table, data)
    }

    fn update<'a>(
        &'a self,
        table: &'a str,
        id: &'a str,
        patch: &'a Value,
    ) -> BackendFuture<'a, Option<Value>> {
        (**self).update(table, id, patch)
    }

    fn delete<'a>(&'a self, table: &'a str, id: &'a str) -> BackendFuture<'a, ()> {
        (**self).delete(table, id)
    }

    fn select<'a>(&'a self, table: &'a str) -> BackendFuture<'a, Vec<Value>> {
        (**self).select(table)
    }
}

/// Backend for local-only workspaces. Every call reports [`DispatchError::Unavailable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Disconnected;

impl Disconnected {
    fn refuse<'a, T: Send + 'a>() -> BackendFuture<'a, T> {
        Box::pin(async { Err(DispatchError::Unavailable("no remote configured".to_string())) })
    }
}

impl Backend for Disconnected {
    fn create<'a>(&'a self, _table: &'a str, _data: &'a Value) -> BackendFuture<'a, Value> {
        Self::refuse()
    }

    fn update<'a>(
        &'a self,
        _table: &'a str,
        _id: &'a str,
        _patch: &'a Value,
    ) -> BackendFuture<'a, Option<Value>> {
        Self::refuse()
    }

    fn delete<'a>(&'a self, _table: &'a str, _id: &'a str) -> BackendFuture<'a, ()> {
        Self::refuse()
    }

    fn select<'a>(&'a self, _table: &'a str) -> BackendFuture<'a, Vec<Value>> {
        Self::refuse()
    }
}

/// Runs a backend call under a deadline, mapping expiry to [`DispatchError::Timeout`].
pub async fn with_timeout<T>(
    limit: Duration,
    call: impl Future<Output = DispatchResult<T>>,
) -> DispatchResult<T> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(DispatchError::Timeout(limit)),
    }
}
