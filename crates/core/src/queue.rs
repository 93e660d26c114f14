// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed durable queue of pending mutations.
//!
//! The [`QueueStore`] is the single source of truth for what has not yet
//! reached the backend. Every write is committed with `synchronous = FULL`
//! before the call returns, so an entry reported as appended survives a
//! process restart.
//!
//! The store is shared between application code (appending) and the sync
//! engine (listing, marking, clearing). All access goes through one
//! connection behind a mutex, which makes each call atomic with respect to
//! the others:
//!
//! - an append racing a pass lands either before the pass's snapshot read
//!   or after it, never half-visible;
//! - `clear_synced` only deletes rows already `synced`, so pending rows added
//!   concurrently are untouched.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::entry::{NewQueueEntry, Operation, QueueEntry, SyncStatus};
use crate::error::{Error, Result};
use crate::id::{generate_unique_id, ENTRY_PREFIX};

/// SQL schema for the queue store.
pub const SCHEMA: &str = r#"
-- Pending mutations, in insertion order
CREATE TABLE IF NOT EXISTS sync_queue (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    table_name TEXT NOT NULL,
    operation TEXT NOT NULL,
    data TEXT NOT NULL,
    created_at TEXT NOT NULL,
    sync_status TEXT NOT NULL DEFAULT 'pending'
);

-- Sync bookkeeping (last successful drain, etc.)
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sync_queue_status ON sync_queue(sync_status, created_at, seq);
"#;

const LAST_SYNC_KEY: &str = "last_sync";

const ENTRY_COLUMNS: &str = "id, table_name, operation, data, created_at, sync_status";

/// Format a timestamp so that lexicographic order equals chronological order.
pub(crate) fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse an RFC3339 timestamp from the database.
pub(crate) fn parse_timestamp(
    value: &str,
    column: &str,
) -> std::result::Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(Error::CorruptedData(format!(
                    "invalid timestamp '{value}' in column '{column}'"
                ))),
            )
        })
}

/// Parse a string value from the database, returning a rusqlite error on parse failure.
fn parse_db<T: std::str::FromStr>(
    value: &str,
    column: &str,
) -> std::result::Result<T, rusqlite::Error> {
    value.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(Error::CorruptedData(format!(
                "invalid value '{value}' in column '{column}'"
            ))),
        )
    })
}

fn entry_from_row(row: &Row<'_>) -> std::result::Result<QueueEntry, rusqlite::Error> {
    let operation: String = row.get(2)?;
    let data: String = row.get(3)?;
    let created_at: String = row.get(4)?;
    let sync_status: String = row.get(5)?;

    let data = serde_json::from_str(&data).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(QueueEntry {
        id: row.get(0)?,
        table: row.get(1)?,
        operation: parse_db::<Operation>(&operation, "operation")?,
        data,
        created_at: parse_timestamp(&created_at, "created_at")?,
        sync_status: parse_db::<SyncStatus>(&sync_status, "sync_status")?,
    })
}

/// Open a SQLite connection with the durability settings shared by the
/// queue store and the record cache.
pub(crate) fn open_connection(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let conn = Connection::open(path)?;
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = FULL;
         PRAGMA busy_timeout = 5000;",
    )?;
    Ok(conn)
}

/// Durable queue of [`QueueEntry`] records.
pub struct QueueStore {
    conn: Mutex<Connection>,
}

impl QueueStore {
    /// Open the queue at the given path, creating the schema if needed.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = open_connection(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(QueueStore {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory queue (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(QueueStore {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::LockPoisoned)
    }

    /// Append a new pending entry, stamped with the current time.
    pub fn append(&self, entry: NewQueueEntry) -> Result<QueueEntry> {
        self.append_at(entry, Utc::now())
    }

    /// Append a new pending entry stamped no earlier than `now`.
    ///
    /// `created_at` never goes backwards relative to entries already in the
    /// store: if the clock has stepped back, the newest existing timestamp is
    /// reused and insertion order breaks the tie.
    pub fn append_at(&self, entry: NewQueueEntry, now: DateTime<Utc>) -> Result<QueueEntry> {
        entry.validate()?;
        let data = serde_json::to_string(&entry.data)?;
        // Stored with microsecond precision; keep the returned entry identical.
        let now = now.trunc_subsecs(6);

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let newest: Option<String> =
            tx.query_row("SELECT MAX(created_at) FROM sync_queue", [], |row| {
                row.get(0)
            })?;
        let created_at = match newest {
            Some(ts) => {
                let newest = DateTime::parse_from_rfc3339(&ts)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|_| {
                        Error::CorruptedData(format!(
                            "invalid timestamp '{ts}' in column 'created_at'"
                        ))
                    })?;
                newest.max(now)
            }
            None => now,
        };

        let seed = format!("{}|{}|{}", entry.table, entry.operation, data);
        let id = {
            // A failed probe reads as free; the UNIQUE constraint still rejects a clash.
            let mut stmt = tx.prepare_cached("SELECT 1 FROM sync_queue WHERE id = ?1")?;
            generate_unique_id(ENTRY_PREFIX, &seed, &created_at, |candidate| {
                stmt.exists([candidate]).unwrap_or(false)
            })
        };

        tx.execute(
            "INSERT INTO sync_queue (id, table_name, operation, data, created_at, sync_status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                entry.table,
                entry.operation.as_str(),
                data,
                format_timestamp(&created_at),
                SyncStatus::Pending.as_str(),
            ],
        )?;
        tx.commit()?;

        Ok(QueueEntry {
            id,
            table: entry.table,
            operation: entry.operation,
            data: entry.data,
            created_at,
            sync_status: SyncStatus::Pending,
        })
    }

    /// Snapshot of all pending entries in replay order.
    pub fn list_pending(&self) -> Result<Vec<QueueEntry>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM sync_queue
             WHERE sync_status = 'pending'
             ORDER BY created_at ASC, seq ASC"
        ))?;
        let entries = stmt
            .query_map([], entry_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Look up a single entry regardless of status.
    pub fn get(&self, id: &str) -> Result<Option<QueueEntry>> {
        let conn = self.lock()?;
        let entry = conn
            .query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM sync_queue WHERE id = ?1"),
                [id],
                entry_from_row,
            )
            .optional()?;
        Ok(entry)
    }

    /// Number of entries still waiting for delivery.
    pub fn pending_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sync_queue WHERE sync_status = 'pending'",
            [],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Pending entries in `table` that target record `id`, in replay order.
    pub fn pending_for(&self, table: &str, id: &str) -> Result<Vec<QueueEntry>> {
        Ok(self
            .list_pending()?
            .into_iter()
            .filter(|e| e.table == table && e.record_id().as_deref() == Some(id))
            .collect())
    }

    /// Mark an entry as delivered.
    ///
    /// Idempotent: unknown ids and already-synced entries are left as they are.
    pub fn mark_synced(&self, id: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE sync_queue SET sync_status = 'synced'
             WHERE id = ?1 AND sync_status = 'pending'",
            [id],
        )?;
        Ok(())
    }

    /// Delete every synced entry. Pending entries are never touched.
    ///
    /// Returns the number of entries removed.
    pub fn clear_synced(&self) -> Result<usize> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM sync_queue WHERE sync_status = 'synced'", [])?;
        Ok(removed)
    }

    /// Record the time of the last completed sync pass.
    pub fn set_last_sync_time(&self, at: DateTime<Utc>) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO metadata (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![LAST_SYNC_KEY, format_timestamp(&at)],
        )?;
        Ok(())
    }

    /// Time of the last completed sync pass, if any.
    pub fn last_sync_time(&self) -> Result<Option<DateTime<Utc>>> {
        let conn = self.lock()?;
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM metadata WHERE key = ?1",
                [LAST_SYNC_KEY],
                |row| row.get(0),
            )
            .optional()?;
        match value {
            Some(v) => Ok(Some(parse_timestamp(&v, "metadata.value")?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
