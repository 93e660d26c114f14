// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Online-first data access with offline fallback.
//!
//! Reads and writes go straight to the backend while online. When offline,
//! or when the backend call fails, reads are served from the [`RecordCache`]
//! and writes are applied to the cache and queued for the sync engine.
//! A write to a record that already has queued entries is queued as well,
//! even while online.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rc_core::id::{generate_unique_id, LOCAL_RECORD_PREFIX};
use rc_core::{
    merge_fields, record_id, NewQueueEntry, Operation, QueueEntry, QueueStore, RecordCache,
};
use serde_json::Value;
use tracing::{debug, warn};

use super::backend::{with_timeout, Backend};
use super::monitor::ConnectivityMonitor;

/// How a write was carried out.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    /// The backend accepted the write directly.
    Applied(Value),
    /// The write was saved locally and queued for the next sync pass.
    Queued { record: Value, entry: QueueEntry },
}

impl WriteOutcome {
    pub fn record(&self) -> &Value {
        match self {
            WriteOutcome::Applied(record) | WriteOutcome::Queued { record, .. } => record,
        }
    }

    pub fn is_queued(&self) -> bool {
        matches!(self, WriteOutcome::Queued { .. })
    }
}

/// Collection-level CRUD that keeps working without a connection.
pub struct OfflineDataManager<B: Backend> {
    backend: B,
    store: Arc<QueueStore>,
    cache: Arc<RecordCache>,
    monitor: Arc<ConnectivityMonitor>,
    timeout: Duration,
}

impl<B: Backend> OfflineDataManager<B> {
    pub fn new(
        backend: B,
        store: Arc<QueueStore>,
        cache: Arc<RecordCache>,
        monitor: Arc<ConnectivityMonitor>,
        timeout: Duration,
    ) -> Self {
        OfflineDataManager {
            backend,
            store,
            cache,
            monitor,
            timeout,
        }
    }

    /// All records in `table`, from the backend when possible.
    ///
    /// A successful online read refreshes the cache. Records with a local
    /// delete still waiting to sync are left out.
    pub async fn fetch(&self, table: &str) -> rc_core::Result<Vec<Value>> {
        if self.monitor.is_online() {
            match with_timeout(self.timeout, self.backend.select(table)).await {
                Ok(rows) => return self.refresh_cache(table, rows),
                Err(e) => warn!(table, error = %e, "online fetch failed, using cached data"),
            }
        }
        self.cache.all(table)
    }

    fn refresh_cache(&self, table: &str, rows: Vec<Value>) -> rc_core::Result<Vec<Value>> {
        let mut live = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(id) = record_id(&row) else {
                debug!(table, "row without id, not cached");
                live.push(row);
                continue;
            };
            if self.is_tombstoned(table, &id)? {
                continue;
            }
            self.cache.put(table, &row)?;
            live.push(row);
        }
        Ok(live)
    }

    /// A tombstone hides a record only while its DELETE is still queued.
    ///
    /// Once the delete has synced, the tombstone is dropped so a row the
    /// server still (or again) holds for that id shows up normally.
    fn is_tombstoned(&self, table: &str, id: &str) -> rc_core::Result<bool> {
        if !self.cache.contains(table, id)? || self.cache.get(table, id)?.is_some() {
            return Ok(false);
        }
        let delete_queued = self
            .store
            .pending_for(table, id)?
            .iter()
            .any(|e| e.operation == Operation::Delete);
        if !delete_queued {
            debug!(table, id, "dropping tombstone with no pending delete");
            self.cache.remove(table, id)?;
        }
        Ok(delete_queued)
    }

    /// Whether a write to `id` may go straight to the backend.
    ///
    /// Writes to a record with queued entries are queued behind them so the
    /// backend sees them in the order they were made.
    fn can_write_online(&self, table: &str, id: Option<&str>) -> rc_core::Result<bool> {
        if !self.monitor.is_online() {
            return Ok(false);
        }
        let Some(id) = id else {
            return Ok(true);
        };
        let queued = self.store.pending_for(table, id)?.len();
        if queued > 0 {
            debug!(table, id, queued, "record has queued writes, queueing behind them");
        }
        Ok(queued == 0)
    }

    /// Create a record.
    ///
    /// Offline inserts get a local id so the cached copy and the queued
    /// entry refer to the same record.
    pub async fn insert(&self, table: &str, data: Value) -> rc_core::Result<WriteOutcome> {
        if self.can_write_online(table, record_id(&data).as_deref())? {
            match with_timeout(self.timeout, self.backend.create(table, &data)).await {
                Ok(record) => {
                    if record_id(&record).is_some() {
                        self.cache.put(table, &record)?;
                    }
                    return Ok(WriteOutcome::Applied(record));
                }
                Err(e) => warn!(table, error = %e, "online insert failed, saving offline"),
            }
        }

        let record = self.with_local_id(table, data)?;
        let entry = self
            .store
            .append(NewQueueEntry::insert(table, record.clone()))?;
        self.cache.put(table, &record)?;
        Ok(WriteOutcome::Queued { record, entry })
    }

    /// Merge `patch` into the record `id`.
    pub async fn update(&self, table: &str, id: &str, patch: Value) -> rc_core::Result<WriteOutcome> {
        let mut payload = patch;
        if let Some(fields) = payload.as_object_mut() {
            fields.insert("id".to_string(), Value::String(id.to_string()));
        }

        if self.can_write_online(table, Some(id))? {
            match with_timeout(self.timeout, self.backend.update(table, id, &payload)).await {
                Ok(returned) => {
                    let record = match returned {
                        Some(record) => record,
                        None => self.merged(table, id, &payload)?,
                    };
                    self.cache.put(table, &record)?;
                    return Ok(WriteOutcome::Applied(record));
                }
                Err(e) => warn!(table, id, error = %e, "online update failed, saving offline"),
            }
        }

        let entry = self
            .store
            .append(NewQueueEntry::update(table, payload.clone()))?;
        let record = self.merged(table, id, &payload)?;
        self.cache.put(table, &record)?;
        Ok(WriteOutcome::Queued { record, entry })
    }

    /// Remove the record `id`.
    ///
    /// An offline delete leaves a tombstone in the cache until it syncs.
    pub async fn delete(&self, table: &str, id: &str) -> rc_core::Result<WriteOutcome> {
        let record = serde_json::json!({ "id": id });

        if self.can_write_online(table, Some(id))? {
            match with_timeout(self.timeout, self.backend.delete(table, id)).await {
                Ok(()) => {
                    self.cache.remove(table, id)?;
                    return Ok(WriteOutcome::Applied(record));
                }
                Err(e) => warn!(table, id, error = %e, "online delete failed, saving offline"),
            }
        }

        let entry = self
            .store
            .append(NewQueueEntry::delete(table, record.clone()))?;
        self.cache.mark_deleted(table, id)?;
        Ok(WriteOutcome::Queued { record, entry })
    }

    /// The cached record with `patch` applied, or the patch alone if uncached.
    fn merged(&self, table: &str, id: &str, patch: &Value) -> rc_core::Result<Value> {
        let mut record = self.cache.get(table, id)?.unwrap_or_else(|| patch.clone());
        merge_fields(&mut record, patch);
        Ok(record)
    }

    fn with_local_id(&self, table: &str, mut data: Value) -> rc_core::Result<Value> {
        if record_id(&data).is_some() {
            return Ok(data);
        }
        let seed = format!("{}|{}", table, data);
        let id = generate_unique_id(LOCAL_RECORD_PREFIX, &seed, &Utc::now(), |candidate| {
            self.cache.contains(table, candidate).unwrap_or(false)
        });
        if let Some(fields) = data.as_object_mut() {
            fields.insert("id".to_string(), Value::String(id));
        }
        Ok(data)
    }
}
