// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Queue entry types.
//!
//! A [`QueueEntry`] is one mutation the application intended to make against
//! the backend. Entries are immutable once stored; the only field that ever
//! changes is [`SyncStatus`], and only from `Pending` to `Synced`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Kind of mutation carried by a queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    /// Create a new record.
    Insert,
    /// Patch the record identified by `data.id`.
    Update,
    /// Remove the record identified by `data.id`.
    Delete,
}

impl Operation {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Insert => "INSERT",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
        }
    }

    /// Whether the payload must name an existing record.
    pub fn requires_record_id(&self) -> bool {
        matches!(self, Operation::Update | Operation::Delete)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "insert" => Ok(Operation::Insert),
            "update" => Ok(Operation::Update),
            "delete" => Ok(Operation::Delete),
            _ => Err(Error::InvalidOperation(s.to_string())),
        }
    }
}

/// Delivery state of a queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Not yet confirmed by the backend.
    Pending,
    /// Confirmed by the backend; awaiting removal from the store.
    Synced,
}

impl SyncStatus {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Pending => "pending",
            SyncStatus::Synced => "synced",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(SyncStatus::Pending),
            "synced" => Ok(SyncStatus::Synced),
            _ => Err(Error::InvalidSyncStatus(s.to_string())),
        }
    }
}

/// A mutation as submitted by application code, before the store assigns
/// an id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewQueueEntry {
    /// Target collection on the backend.
    pub table: String,
    pub operation: Operation,
    /// Operation payload. Must carry `id` for updates and deletes.
    pub data: Value,
}

impl NewQueueEntry {
    pub fn new(table: impl Into<String>, operation: Operation, data: Value) -> Self {
        NewQueueEntry {
            table: table.into(),
            operation,
            data,
        }
    }

    /// Shorthand for an `INSERT` entry.
    pub fn insert(table: impl Into<String>, data: Value) -> Self {
        Self::new(table, Operation::Insert, data)
    }

    /// Shorthand for an `UPDATE` entry.
    pub fn update(table: impl Into<String>, data: Value) -> Self {
        Self::new(table, Operation::Update, data)
    }

    /// Shorthand for a `DELETE` entry.
    pub fn delete(table: impl Into<String>, data: Value) -> Self {
        Self::new(table, Operation::Delete, data)
    }

    /// Checks the entry is something the sync engine can replay.
    pub fn validate(&self) -> Result<()> {
        if self.table.trim().is_empty() {
            return Err(Error::EmptyTable);
        }
        if !self.data.is_object() {
            return Err(Error::PayloadNotObject {
                table: self.table.clone(),
            });
        }
        if self.operation.requires_record_id() && record_id(&self.data).is_none() {
            return Err(Error::MissingRecordId {
                table: self.table.clone(),
                operation: self.operation.to_string(),
            });
        }
        Ok(())
    }
}

/// A stored mutation awaiting (or having completed) delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    /// Opaque id assigned at enqueue time.
    pub id: String,
    pub table: String,
    pub operation: Operation,
    pub data: Value,
    /// Enqueue time; replay order is ascending `created_at`.
    pub created_at: DateTime<Utc>,
    pub sync_status: SyncStatus,
}

impl QueueEntry {
    /// The id of the backend record this entry targets, if the payload has one.
    pub fn record_id(&self) -> Option<String> {
        record_id(&self.data)
    }

    pub fn is_pending(&self) -> bool {
        self.sync_status == SyncStatus::Pending
    }
}

/// Extracts a record id from a payload's `id` field.
///
/// Accepts non-empty strings and numbers; anything else is treated as absent.
pub fn record_id(data: &Value) -> Option<String> {
    match data.get("id")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Shallow-merges the top-level fields of `patch` into `target`.
///
/// Non-object targets are replaced by the patch outright.
pub fn merge_fields(target: &mut Value, patch: &Value) {
    match (target.as_object_mut(), patch.as_object()) {
        (Some(base), Some(fields)) => {
            for (key, value) in fields {
                base.insert(key.clone(), value.clone());
            }
        }
        _ => *target = patch.clone(),
    }
}

#[cfg(test)]
#[path = "entry_tests.rs"]
mod tests;
