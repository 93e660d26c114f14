// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline-first sync against the rollcall record server.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐ events ┌─────────────┐ run_pass ┌─────────────┐
//! │ Connectivity │───────►│  SyncAgent  │─────────►│ SyncEngine  │
//! │   Monitor    │        └─────────────┘          └──────┬──────┘
//! └──────────────┘                                   ▲    │ dispatch
//!        ▲ probe                          list/mark  │    ▼
//! ┌──────────────┐                       ┌───────────┴─┐ ┌─────────────┐
//! │   TcpProbe   │                       │ QueueStore  │ │  Backend    │
//! └──────────────┘                       └─────────────┘ │  (trait)    │
//!                                               ▲        └──────┬──────┘
//! ┌──────────────────┐  offline writes          │               ▼
//! │OfflineDataManager│──────────────────────────┘        RemoteBackend
//! └──────────────────┘                                  over Transport
//! ```
//!
//! - Writes made while offline are appended to the durable queue
//! - Every offline-to-online transition triggers one drain of the queue
//! - Entries replay in enqueue order; failures stay queued for the next pass
//! - At most one pass runs at a time

mod agent;
mod backend;
mod engine;
mod manager;
mod monitor;
mod remote;
mod transport;

pub use agent::SyncAgent;
pub use backend::{
    with_timeout, Backend, BackendFuture, DispatchError, DispatchResult, Disconnected,
};
pub use engine::{
    EntryFailure, PassOutcome, PassReport, SkipReason, SyncEngine, SyncError, SyncSession,
};
pub use manager::{OfflineDataManager, WriteOutcome};
pub use monitor::{ConnectivityEvent, ConnectivityMonitor, Probe, TcpProbe};
pub use remote::RemoteBackend;
pub use transport::{Transport, TransportError, TransportResult, WebSocketTransport};

#[cfg(test)]
mod test_helpers;
