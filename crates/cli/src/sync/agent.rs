// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Long-lived sync agent.
//!
//! Ties a [`SyncEngine`] to its [`ConnectivityMonitor`]: one pass at start
//! when already online, and one pass on every offline-to-online transition.
//! Each triggered pass runs as its own task so the listener keeps draining
//! events while a pass is in flight; the engine's guard turns overlapping
//! triggers into no-ops.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::backend::Backend;
use super::engine::{PassOutcome, SyncEngine, SyncError, SyncSession};
use super::monitor::{ConnectivityEvent, ConnectivityMonitor};

/// Background sync driven by connectivity transitions.
pub struct SyncAgent<B: Backend + 'static> {
    engine: Arc<SyncEngine<B>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl<B: Backend + 'static> SyncAgent<B> {
    pub fn new(engine: Arc<SyncEngine<B>>) -> Self {
        SyncAgent {
            engine,
            listener: Mutex::new(None),
        }
    }

    pub fn engine(&self) -> &Arc<SyncEngine<B>> {
        &self.engine
    }

    fn monitor(&self) -> &Arc<ConnectivityMonitor> {
        self.engine.monitor()
    }

    /// Start listening for connectivity changes. Calling it twice is a no-op.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut listener = self.listener.lock().unwrap_or_else(|e| e.into_inner());
        if listener.is_some() {
            return;
        }

        // Subscribe before the initial check so a transition in between is not lost.
        let mut events = self.monitor().subscribe();
        if self.monitor().is_online() {
            spawn_pass(&self.engine, "startup");
        } else {
            info!("starting offline; changes will sync when the connection returns");
        }

        let engine = Arc::clone(&self.engine);
        *listener = Some(tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(ConnectivityEvent::BecameOnline) => {
                        info!("back online, syncing data");
                        spawn_pass(&engine, "reconnect");
                    }
                    Ok(ConnectivityEvent::BecameOffline) => {
                        warn!("offline: changes will be saved locally and synced when online");
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "connectivity events lagged");
                        if engine.monitor().is_online() {
                            spawn_pass(&engine, "reconnect");
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }));
    }

    /// Stop listening. A pass already in flight runs to completion.
    pub fn stop(&self) {
        let handle = self
            .listener
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.listener
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    pub fn is_online(&self) -> bool {
        self.monitor().is_online()
    }

    pub fn is_syncing(&self) -> bool {
        self.engine.is_syncing()
    }

    pub fn last_sync_time(&self) -> Option<DateTime<Utc>> {
        self.engine.session().last_sync_time
    }

    pub fn session(&self) -> SyncSession {
        self.engine.session()
    }

    /// Run a pass now, on the caller's task.
    pub async fn sync_pending_changes(&self) -> Result<PassOutcome, SyncError> {
        self.engine.run_pass().await
    }
}

impl<B: Backend + 'static> Drop for SyncAgent<B> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn spawn_pass<B: Backend + 'static>(engine: &Arc<SyncEngine<B>>, trigger: &'static str) {
    let engine = Arc::clone(engine);
    tokio::spawn(async move {
        match engine.run_pass().await {
            Ok(PassOutcome::Completed(report)) => {
                debug!(trigger, synced = report.synced, remaining = report.remaining(), "pass finished");
            }
            Ok(PassOutcome::Skipped(reason)) => {
                debug!(trigger, ?reason, "pass skipped");
            }
            Err(e) => error!(trigger, error = %e, "sync pass failed"),
        }
    });
}
