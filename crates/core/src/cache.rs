// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Local copy of backend records, grouped by collection.
//!
//! The client uses this to keep showing students, fees, attendance, etc.
//! while offline. Deletes made offline are kept as tombstones so a later
//! fetch does not resurrect them before the queued delete reaches the
//! backend. The remote server uses the same type as its record table.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::entry::record_id;
use crate::error::{Error, Result};
use crate::queue::{format_timestamp, open_connection};

/// SQL schema for the record cache.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS records (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    data TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    deleted INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (collection, id)
);

CREATE INDEX IF NOT EXISTS idx_records_live ON records(collection, deleted);
"#;

/// SQLite table of JSON records keyed by `(collection, id)`.
pub struct RecordCache {
    conn: Mutex<Connection>,
}

impl RecordCache {
    /// Open the cache at the given path, creating the schema if needed.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = open_connection(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(RecordCache {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory cache (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(RecordCache {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::LockPoisoned)
    }

    /// Insert or replace a record. The record must carry an `id`.
    pub fn put(&self, collection: &str, record: &Value) -> Result<()> {
        let id = record_id(record).ok_or_else(|| Error::MissingRecordId {
            table: collection.to_string(),
            operation: "cache".to_string(),
        })?;
        let data = serde_json::to_string(record)?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO records (collection, id, data, updated_at, deleted)
             VALUES (?1, ?2, ?3, ?4, 0)
             ON CONFLICT(collection, id) DO UPDATE SET
                 data = excluded.data,
                 updated_at = excluded.updated_at,
                 deleted = 0",
            params![collection, id, data, format_timestamp(&Utc::now())],
        )?;
        Ok(())
    }

    /// Fetch a live record.
    pub fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let conn = self.lock()?;
        let data: Option<String> = conn
            .query_row(
                "SELECT data FROM records WHERE collection = ?1 AND id = ?2 AND deleted = 0",
                params![collection, id],
                |row| row.get(0),
            )
            .optional()?;
        match data {
            Some(d) => Ok(Some(serde_json::from_str(&d)?)),
            None => Ok(None),
        }
    }

    /// Whether a row exists for `id`, live or tombstoned.
    pub fn contains(&self, collection: &str, id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare_cached("SELECT 1 FROM records WHERE collection = ?1 AND id = ?2")?;
        Ok(stmt.exists(params![collection, id])?)
    }

    /// All live records in a collection, ordered by id.
    pub fn all(&self, collection: &str) -> Result<Vec<Value>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT data FROM records WHERE collection = ?1 AND deleted = 0 ORDER BY id",
        )?;
        let rows = stmt
            .query_map([collection], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.iter()
            .map(|d| serde_json::from_str(d).map_err(Error::from))
            .collect()
    }

    /// Replace the cached copy of `id` with a tombstone.
    pub fn mark_deleted(&self, collection: &str, id: &str) -> Result<()> {
        let conn = self.lock()?;
        let tombstone = serde_json::json!({ "id": id, "_deleted": true }).to_string();
        conn.execute(
            "INSERT INTO records (collection, id, data, updated_at, deleted)
             VALUES (?1, ?2, ?3, ?4, 1)
             ON CONFLICT(collection, id) DO UPDATE SET
                 data = excluded.data,
                 updated_at = excluded.updated_at,
                 deleted = 1",
            params![collection, id, tombstone, format_timestamp(&Utc::now())],
        )?;
        Ok(())
    }

    /// Physically remove a row. Returns true if something was removed.
    pub fn remove(&self, collection: &str, id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM records WHERE collection = ?1 AND id = ?2",
            params![collection, id],
        )?;
        Ok(removed > 0)
    }

    /// Number of live records in a collection.
    pub fn count(&self, collection: &str) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM records WHERE collection = ?1 AND deleted = 0",
            [collection],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
