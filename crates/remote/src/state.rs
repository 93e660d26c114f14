// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Server state management.
//!
//! The canonical copy of every collection, stored in one SQLite file.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::Mutex;

use rc_core::id::generate_unique_id;
use rc_core::{merge_fields, record_id, RecordCache};

/// Prefix for ids the server assigns to records created without one.
const SERVER_RECORD_PREFIX: &str = "r";

/// Why a request could not be applied.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("record {id} already exists in {table}")]
    Duplicate { table: String, id: String },

    #[error("record for {table} must be a JSON object")]
    NotObject { table: String },

    #[error(transparent)]
    Store(#[from] rc_core::Error),
}

/// Shared server state.
#[derive(Clone)]
pub struct ServerState {
    inner: Arc<Mutex<RecordCache>>,
}

impl ServerState {
    /// Opens (or creates) `records.db` in the given directory.
    pub fn new(data_dir: &Path) -> Result<Self, StateError> {
        let records = RecordCache::open(&data_dir.join("records.db"))?;
        Ok(Self::from_records(records))
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self, StateError> {
        Ok(Self::from_records(RecordCache::open_in_memory()?))
    }

    fn from_records(records: RecordCache) -> Self {
        ServerState {
            inner: Arc::new(Mutex::new(records)),
        }
    }

    /// Store a new record, assigning an id when it has none.
    pub async fn create(&self, table: &str, data: Value) -> Result<Value, StateError> {
        if !data.is_object() {
            return Err(StateError::NotObject {
                table: table.to_string(),
            });
        }
        let records = self.inner.lock().await;

        let mut record = data;
        match record_id(&record) {
            Some(id) if records.get(table, &id)?.is_some() => {
                return Err(StateError::Duplicate {
                    table: table.to_string(),
                    id,
                });
            }
            Some(_) => {}
            None => {
                let seed = format!("{}{}", table, record);
                let id = generate_unique_id(SERVER_RECORD_PREFIX, &seed, &Utc::now(), |candidate| {
                    records.contains(table, candidate).unwrap_or(true)
                });
                if let Some(fields) = record.as_object_mut() {
                    fields.insert("id".to_string(), Value::String(id));
                }
            }
        }

        records.put(table, &record)?;
        Ok(record)
    }

    /// Merge `patch` into record `id`. Unknown ids are left alone.
    pub async fn update(
        &self,
        table: &str,
        id: &str,
        patch: &Value,
    ) -> Result<Option<Value>, StateError> {
        let records = self.inner.lock().await;
        let Some(mut record) = records.get(table, id)? else {
            return Ok(None);
        };
        merge_fields(&mut record, patch);
        // The id is the row key and never changes.
        if let Some(fields) = record.as_object_mut() {
            fields.insert("id".to_string(), Value::String(id.to_string()));
        }
        records.put(table, &record)?;
        Ok(Some(record))
    }

    /// Remove record `id`. Returns false if there was nothing to remove.
    pub async fn delete(&self, table: &str, id: &str) -> Result<bool, StateError> {
        Ok(self.inner.lock().await.remove(table, id)?)
    }

    pub async fn select(&self, table: &str) -> Result<Vec<Value>, StateError> {
        Ok(self.inner.lock().await.all(table)?)
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
