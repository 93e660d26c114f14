// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for rc-core operations.
//!
//! Every variant here is a local storage or validation failure. Callers of
//! [`QueueStore::append`](crate::QueueStore::append) receive these directly so
//! they can tell the user an action was not saved.

use thiserror::Error;

/// All possible errors that can occur in rc-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid operation: '{0}'\n  hint: valid operations are: insert, update, delete")]
    InvalidOperation(String),

    #[error("invalid sync status: '{0}'\n  hint: valid statuses are: pending, synced")]
    InvalidSyncStatus(String),

    #[error("table name cannot be empty")]
    EmptyTable,

    #[error("payload for {table} must be a JSON object")]
    PayloadNotObject { table: String },

    #[error("{operation} on {table} requires a record id in the payload\n  hint: include an \"id\" field")]
    MissingRecordId { table: String, operation: String },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),

    #[error("store lock poisoned")]
    LockPoisoned,
}

impl Error {
    /// Returns true if this error came from the persistence layer rather than
    /// from validating the caller's input.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Error::Database(_)
                | Error::Io(_)
                | Error::Json(_)
                | Error::CorruptedData(_)
                | Error::LockPoisoned
        )
    }
}

/// A specialized Result type for rc-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
