// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! rc-core: Shared library for the rollcall offline sync engine
//!
//! This crate provides the queue entry model, the durable SQLite-backed
//! queue store, the local record cache, and the wire protocol spoken
//! between the rollcall client and its remote backend.

pub mod cache;
pub mod entry;
pub mod error;
pub mod id;
pub mod protocol;
pub mod queue;

pub use cache::RecordCache;
pub use entry::{merge_fields, record_id, NewQueueEntry, Operation, QueueEntry, SyncStatus};
pub use error::{Error, Result};
pub use queue::QueueStore;
