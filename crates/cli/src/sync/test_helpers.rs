// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rc_core::{record_id, NewQueueEntry, QueueStore};
use serde_json::Value;
use tokio::sync::Semaphore;

use super::backend::{Backend, BackendFuture, DispatchError};
use super::engine::SyncEngine;
use super::monitor::{ConnectivityMonitor, Probe};

/// A backend call as observed by [`MockBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create { table: String, data: Value },
    Update { table: String, id: String, patch: Value },
    Delete { table: String, id: String },
    Select { table: String },
}

impl Call {
    fn record_id(&self) -> Option<String> {
        match self {
            Call::Create { data, .. } => record_id(data),
            Call::Update { id, .. } | Call::Delete { id, .. } => Some(id.clone()),
            Call::Select { .. } => None,
        }
    }
}

/// In-memory backend that records every call.
///
/// Calls can be made to fail per record id, to fail wholesale, to never
/// answer, or to block until released.
#[derive(Default)]
pub struct MockBackend {
    calls: Mutex<Vec<Call>>,
    failing: Mutex<HashSet<String>>,
    fail_all: AtomicBool,
    hang: AtomicBool,
    gate: Mutex<Option<Arc<Semaphore>>>,
    rows: Mutex<HashMap<String, Vec<Value>>>,
    next_id: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Reject every call that targets `id`.
    pub fn fail_record(&self, id: &str) {
        self.failing.lock().unwrap().insert(id.to_string());
    }

    pub fn heal_record(&self, id: &str) {
        self.failing.lock().unwrap().remove(id);
    }

    pub fn fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    /// Never answer; the caller's timeout decides.
    pub fn hang(&self, hang: bool) {
        self.hang.store(hang, Ordering::SeqCst);
    }

    /// Block every call after it is recorded until [`release`](Self::release).
    pub fn hold(&self) {
        *self.gate.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn release(&self) {
        if let Some(gate) = self.gate.lock().unwrap().take() {
            gate.add_permits(Semaphore::MAX_PERMITS / 2);
        }
    }

    pub fn set_rows(&self, table: &str, rows: Vec<Value>) {
        self.rows.lock().unwrap().insert(table.to_string(), rows);
    }

    fn admit(&self, call: Call) -> impl Future<Output = Result<(), DispatchError>> + Send + '_ {
        let target = call.record_id();
        self.calls.lock().unwrap().push(call);
        let gate = self.gate.lock().unwrap().clone();
        async move {
            if let Some(gate) = gate {
                let _permit = gate.acquire().await;
            }
            if self.hang.load(Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
            let rejected = self.fail_all.load(Ordering::SeqCst)
                || target.is_some_and(|id| self.failing.lock().unwrap().contains(&id));
            if rejected {
                return Err(DispatchError::Unavailable("mock backend refused".into()));
            }
            Ok(())
        }
    }
}

impl Backend for MockBackend {
    fn create<'a>(&'a self, table: &'a str, data: &'a Value) -> BackendFuture<'a, Value> {
        let admitted = self.admit(Call::Create {
            table: table.to_string(),
            data: data.clone(),
        });
        Box::pin(async move {
            admitted.await?;
            let mut record = data.clone();
            if record_id(&record).is_none() {
                let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
                if let Some(fields) = record.as_object_mut() {
                    fields.insert("id".into(), Value::String(format!("srv-{}", n)));
                }
            }
            Ok(record)
        })
    }

    fn update<'a>(
        &'a self,
        table: &'a str,
        id: &'a str,
        patch: &'a Value,
    ) -> BackendFuture<'a, Option<Value>> {
        let admitted = self.admit(Call::Update {
            table: table.to_string(),
            id: id.to_string(),
            patch: patch.clone(),
        });
        Box::pin(async move {
            admitted.await?;
            Ok(None)
        })
    }

    fn delete<'a>(&'a self, table: &'a str, id: &'a str) -> BackendFuture<'a, ()> {
        let admitted = self.admit(Call::Delete {
            table: table.to_string(),
            id: id.to_string(),
        });
        Box::pin(admitted)
    }

    fn select<'a>(&'a self, table: &'a str) -> BackendFuture<'a, Vec<Value>> {
        let admitted = self.admit(Call::Select {
            table: table.to_string(),
        });
        Box::pin(async move {
            admitted.await?;
            Ok(self
                .rows
                .lock()
                .unwrap()
                .get(table)
                .cloned()
                .unwrap_or_default())
        })
    }
}

/// Probe whose answer the test controls.
#[derive(Clone, Default)]
pub struct FakeProbe {
    reachable: Arc<AtomicBool>,
    checks: Arc<AtomicUsize>,
}

impl FakeProbe {
    pub fn new(reachable: bool) -> Self {
        let probe = Self::default();
        probe.set(reachable);
        probe
    }

    pub fn set(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }
}

impl Probe for FakeProbe {
    fn check(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        let reachable = self.reachable.load(Ordering::SeqCst);
        Box::pin(async move { reachable })
    }
}

pub const TEST_TIMEOUT: Duration = Duration::from_millis(500);

/// Engine over an in-memory store and a mock backend.
pub fn make_engine(
    online: bool,
) -> (
    Arc<SyncEngine<Arc<MockBackend>>>,
    Arc<QueueStore>,
    Arc<MockBackend>,
) {
    let store = Arc::new(QueueStore::open_in_memory().unwrap());
    let backend = MockBackend::new();
    let monitor = Arc::new(ConnectivityMonitor::new(online));
    let engine = Arc::new(SyncEngine::new(
        Arc::clone(&store),
        Arc::clone(&backend),
        monitor,
        TEST_TIMEOUT,
    ));
    (engine, store, backend)
}

/// Append an entry and return its queue id.
pub fn enqueue(store: &QueueStore, entry: NewQueueEntry) -> String {
    store.append(entry).unwrap().id
}

/// Poll `cond` until it holds or two seconds pass.
pub async fn wait_until(cond: impl Fn() -> bool) -> bool {
    for _ in 0..200 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
