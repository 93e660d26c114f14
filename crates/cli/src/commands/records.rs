// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Record commands: `fetch`, `insert`, `update` and `delete`.
//!
//! Each goes to the record server when it is reachable and falls back to
//! the local cache and queue when it is not. Workspaces without a remote
//! always take the offline path.

use std::sync::Arc;

use serde_json::Value;

use super::{parse_payload, runtime, Remote, Workspace};
use crate::cli::OutputFormat;
use crate::error::Result;
use crate::sync::{Backend, ConnectivityMonitor, Disconnected, OfflineDataManager, WriteOutcome};

type Manager = OfflineDataManager<Arc<dyn Backend>>;

async fn open_manager(ws: &Workspace) -> Result<Manager> {
    let cache = ws.open_cache()?;
    let (backend, monitor, timeout) = match &ws.config.remote {
        Some(config) => {
            let remote = Remote::connect(config).await?;
            let backend: Arc<dyn Backend> = remote.backend;
            (backend, remote.monitor, config.dispatch_timeout())
        }
        None => {
            let backend: Arc<dyn Backend> = Arc::new(Disconnected);
            let monitor = Arc::new(ConnectivityMonitor::new(false));
            (backend, monitor, std::time::Duration::ZERO)
        }
    };
    Ok(OfflineDataManager::new(
        backend,
        Arc::clone(&ws.store),
        cache,
        monitor,
        timeout,
    ))
}

pub fn fetch(table: String, output: OutputFormat) -> Result<()> {
    let ws = Workspace::open()?;
    let rt = runtime()?;
    let records = rt.block_on(async {
        let manager = open_manager(&ws).await?;
        Ok::<_, crate::error::Error>(manager.fetch(&table).await?)
    })?;
    print!("{}", render_records(&records, output)?);
    Ok(())
}

pub fn insert(table: String, data: String) -> Result<()> {
    let data = parse_payload(&data)?;
    let ws = Workspace::open()?;
    let rt = runtime()?;
    let outcome = rt.block_on(async {
        let manager = open_manager(&ws).await?;
        Ok::<_, crate::error::Error>(manager.insert(&table, data).await?)
    })?;
    print!("{}", render_outcome(&outcome)?);
    Ok(())
}

pub fn update(table: String, id: String, data: String) -> Result<()> {
    let patch = parse_payload(&data)?;
    let ws = Workspace::open()?;
    let rt = runtime()?;
    let outcome = rt.block_on(async {
        let manager = open_manager(&ws).await?;
        Ok::<_, crate::error::Error>(manager.update(&table, &id, patch).await?)
    })?;
    print!("{}", render_outcome(&outcome)?);
    Ok(())
}

pub fn delete(table: String, id: String) -> Result<()> {
    let ws = Workspace::open()?;
    let rt = runtime()?;
    let outcome = rt.block_on(async {
        let manager = open_manager(&ws).await?;
        Ok::<_, crate::error::Error>(manager.delete(&table, &id).await?)
    })?;
    print!("{}", render_outcome(&outcome)?);
    Ok(())
}

pub(crate) fn render_records(records: &[Value], output: OutputFormat) -> Result<String> {
    match output {
        OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(records)?)),
        OutputFormat::Text if records.is_empty() => Ok("No records\n".to_string()),
        OutputFormat::Text => {
            let mut out = String::new();
            for record in records {
                out.push_str(&serde_json::to_string(record)?);
                out.push('\n');
            }
            Ok(out)
        }
    }
}

/// The record as JSON, followed by a note when the write was queued.
pub(crate) fn render_outcome(outcome: &WriteOutcome) -> Result<String> {
    let mut out = format!("{}\n", serde_json::to_string_pretty(outcome.record())?);
    if let WriteOutcome::Queued { entry, .. } = outcome {
        out.push_str(&format!("Saved offline as {}, will sync when online\n", entry.id));
    }
    Ok(out)
}

#[cfg(test)]
#[path = "records_tests.rs"]
mod tests;
