// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use rc_core::{NewQueueEntry, Operation, QueueEntry, QueueStore};

use super::{parse_payload, Workspace};
use crate::error::Result;

pub fn run(table: String, operation: Operation, data: String) -> Result<()> {
    let ws = Workspace::open()?;
    let entry = append(&ws.store, table, operation, &data)?;
    println!(
        "Queued {} {} on {} ({})",
        entry.operation,
        entry.record_id().unwrap_or_else(|| "new record".to_string()),
        entry.table,
        entry.id
    );
    Ok(())
}

pub(crate) fn append(
    store: &QueueStore,
    table: String,
    operation: Operation,
    data: &str,
) -> Result<QueueEntry> {
    let payload = parse_payload(data)?;
    Ok(store.append(NewQueueEntry::new(table, operation, payload))?)
}

#[cfg(test)]
#[path = "enqueue_tests.rs"]
mod tests;
