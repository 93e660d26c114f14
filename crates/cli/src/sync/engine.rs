// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync pass: drain the queue into the backend.
//!
//! A pass reads a snapshot of the pending entries in replay order, sends
//! each one to the backend, marks the ones the backend accepted, then purges
//! synced entries and records the pass time. One failing entry never stops
//! the rest of the pass; it stays pending and is retried on the next pass.
//!
//! Delivery is at-least-once. An entry is marked synced only after the
//! backend confirms it, so a crash between confirmation and marking resends
//! it on the next pass.
//!
//! At most one pass runs per engine. The guard flag is taken before the
//! first await, so a second trigger that arrives mid-pass returns
//! [`SkipReason::InProgress`] instead of starting a concurrent pass.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rc_core::{Operation, QueueEntry, QueueStore};
use tracing::{debug, error, info, warn};

use super::backend::{with_timeout, Backend, DispatchError, DispatchResult};
use super::monitor::ConnectivityMonitor;

/// Error that prevents a pass from running or from completing its bookkeeping.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Reading the queue failed before anything was sent.
    #[error("queue store error: {0}")]
    Storage(#[from] rc_core::Error),

    /// Entries were delivered but the pass could not finish updating the store.
    ///
    /// Delivered entries stay marked synced and are purged by the next pass.
    #[error("sync pass aborted after {synced} entries: {source}")]
    PassAborted {
        synced: usize,
        #[source]
        source: rc_core::Error,
    },
}

/// Why a requested pass did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Offline,
    InProgress,
}

/// One entry the backend did not accept during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFailure {
    pub entry_id: String,
    pub table: String,
    pub operation: Operation,
    pub error: DispatchError,
}

/// Summary of a completed pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Entries in the snapshot the pass worked through.
    pub attempted: usize,
    /// Entries the backend accepted and the store marked synced.
    pub synced: usize,
    /// Entries the backend did not accept.
    pub failures: Vec<EntryFailure>,
    /// Entries the backend accepted but the store could not mark.
    pub unmarked: usize,
    /// Synced entries removed from the store.
    pub cleared: usize,
}

impl PassReport {
    /// Entries that remain pending after this pass.
    pub fn remaining(&self) -> usize {
        self.failures.len() + self.unmarked
    }

    pub fn is_clean(&self) -> bool {
        self.remaining() == 0
    }
}

/// Result of asking the engine to run a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    Skipped(SkipReason),
    Completed(PassReport),
}

/// Observable sync state for a UI or status command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSession {
    pub is_syncing: bool,
    /// When the last non-empty pass finished, this session.
    pub last_sync_time: Option<DateTime<Utc>>,
    pub last_report: Option<PassReport>,
}

/// Releases the in-progress flag when a pass ends, however it ends.
struct PassGuard<'a>(&'a AtomicBool);

impl<'a> PassGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| PassGuard(flag))
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Replays queued entries against a [`Backend`].
pub struct SyncEngine<B: Backend> {
    store: Arc<QueueStore>,
    backend: B,
    monitor: Arc<ConnectivityMonitor>,
    dispatch_timeout: Duration,
    syncing: AtomicBool,
    session: Mutex<SyncSession>,
}

impl<B: Backend> SyncEngine<B> {
    pub fn new(
        store: Arc<QueueStore>,
        backend: B,
        monitor: Arc<ConnectivityMonitor>,
        dispatch_timeout: Duration,
    ) -> Self {
        SyncEngine {
            store,
            backend,
            monitor,
            dispatch_timeout,
            syncing: AtomicBool::new(false),
            session: Mutex::new(SyncSession::default()),
        }
    }

    pub fn store(&self) -> &Arc<QueueStore> {
        &self.store
    }

    pub fn monitor(&self) -> &Arc<ConnectivityMonitor> {
        &self.monitor
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::Acquire)
    }

    /// Snapshot of the session state.
    pub fn session(&self) -> SyncSession {
        let mut session = self
            .session
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        session.is_syncing = self.is_syncing();
        session
    }

    /// Run one pass if online and no pass is already running.
    pub async fn run_pass(&self) -> Result<PassOutcome, SyncError> {
        if !self.monitor.is_online() {
            debug!("offline, skipping sync pass");
            return Ok(PassOutcome::Skipped(SkipReason::Offline));
        }
        let Some(_guard) = PassGuard::acquire(&self.syncing) else {
            debug!("sync pass already running");
            return Ok(PassOutcome::Skipped(SkipReason::InProgress));
        };

        // Purge entries a previous, aborted pass delivered but never cleared.
        let leftover = self.store.clear_synced()?;
        if leftover > 0 {
            debug!(leftover, "cleared synced entries from an earlier pass");
        }

        let pending = crate::time_phase!("sync::list_pending", { self.store.list_pending()? });
        if pending.is_empty() {
            debug!("nothing to sync");
            return Ok(PassOutcome::Completed(PassReport::default()));
        }

        info!(count = pending.len(), "syncing pending changes");
        let mut report = PassReport {
            attempted: pending.len(),
            ..PassReport::default()
        };

        for entry in &pending {
            match self.dispatch(entry).await {
                Ok(()) => match self.store.mark_synced(&entry.id) {
                    Ok(()) => report.synced += 1,
                    Err(e) => {
                        warn!(entry = %entry.id, error = %e, "delivered but could not mark synced; will resend");
                        report.unmarked += 1;
                    }
                },
                Err(e) => {
                    warn!(
                        entry = %entry.id,
                        table = %entry.table,
                        operation = %entry.operation,
                        error = %e,
                        "failed to sync entry"
                    );
                    report.failures.push(EntryFailure {
                        entry_id: entry.id.clone(),
                        table: entry.table.clone(),
                        operation: entry.operation,
                        error: e,
                    });
                }
            }
        }

        let synced = report.synced;
        let abort = |source: rc_core::Error| {
            error!(error = %source, synced, "sync pass aborted");
            SyncError::PassAborted { synced, source }
        };
        report.cleared = self.store.clear_synced().map_err(abort)?;
        let finished_at = Utc::now();
        self.store.set_last_sync_time(finished_at).map_err(abort)?;

        if report.is_clean() {
            info!(synced, "sync pass complete");
        } else {
            warn!(
                synced,
                remaining = report.remaining(),
                "some changes failed to sync, will retry later"
            );
        }

        let mut session = self.session.lock().unwrap_or_else(|e| e.into_inner());
        session.last_sync_time = Some(finished_at);
        session.last_report = Some(report.clone());

        Ok(PassOutcome::Completed(report))
    }

    async fn dispatch(&self, entry: &QueueEntry) -> DispatchResult<()> {
        let table = entry.table.as_str();
        let call = async {
            match entry.operation {
                Operation::Insert => self.backend.create(table, &entry.data).await.map(|_| ()),
                Operation::Update => {
                    let id = target_id(entry)?;
                    self.backend
                        .update(table, &id, &entry.data)
                        .await
                        .map(|_| ())
                }
                Operation::Delete => {
                    let id = target_id(entry)?;
                    self.backend.delete(table, &id).await
                }
            }
        };
        with_timeout(self.dispatch_timeout, call).await
    }
}

fn target_id(entry: &QueueEntry) -> DispatchResult<String> {
    entry.record_id().ok_or_else(|| {
        DispatchError::InvalidEntry(format!(
            "{} on {} has no record id",
            entry.operation, entry.table
        ))
    })
}
