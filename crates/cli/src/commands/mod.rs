// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod enqueue;
pub mod init;
pub mod pending;
pub mod records;
pub mod status;
pub mod sync;
pub mod watch;

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fs2::FileExt;
use rc_core::{QueueStore, RecordCache};
use serde_json::Value;

use crate::config::{find_work_dir, get_db_path, get_lock_path, Config, RemoteConfig};
use crate::error::{Error, Result};
use crate::sync::{ConnectivityMonitor, RemoteBackend, TcpProbe};

/// An opened `.rollcall` directory.
pub struct Workspace {
    pub work_dir: PathBuf,
    pub config: Config,
    pub store: Arc<QueueStore>,
}

impl Workspace {
    /// Open the workspace found from the current directory.
    pub fn open() -> Result<Self> {
        Self::open_at(&find_work_dir()?)
    }

    pub fn open_at(work_dir: &Path) -> Result<Self> {
        let config = Config::load(work_dir)?;
        let store = crate::time_phase!("queue::open", {
            QueueStore::open(&get_db_path(work_dir))?
        });
        Ok(Workspace {
            work_dir: work_dir.to_path_buf(),
            config,
            store: Arc::new(store),
        })
    }

    /// The record cache shares the queue's database file.
    pub fn open_cache(&self) -> Result<Arc<RecordCache>> {
        Ok(Arc::new(RecordCache::open(&get_db_path(&self.work_dir))?))
    }

    /// Take the agent lock, or `None` if another process holds it.
    ///
    /// The lock is released when the returned file is dropped.
    pub fn try_lock_agent(&self) -> Result<Option<File>> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(get_lock_path(&self.work_dir))?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(file)),
            Err(_) => Ok(None),
        }
    }
}

/// Connection pieces built from `[remote]`.
pub struct Remote {
    pub config: RemoteConfig,
    pub probe: TcpProbe,
    pub monitor: Arc<ConnectivityMonitor>,
    pub backend: Arc<RemoteBackend>,
}

impl Remote {
    /// Build the backend and probe, and take an initial reachability reading.
    pub async fn connect(config: &RemoteConfig) -> Result<Self> {
        let probe = TcpProbe::from_url(&config.url, config.connect_timeout())?;
        let monitor = crate::time_phase!("remote::probe", {
            ConnectivityMonitor::detect(&probe).await
        });
        let backend = RemoteBackend::new(config.url.clone(), config.connect_timeout());
        Ok(Remote {
            config: config.clone(),
            probe,
            monitor: Arc::new(monitor),
            backend: Arc::new(backend),
        })
    }
}

/// Tokio runtime for commands that talk to the network.
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

/// Parse a command-line JSON payload.
pub fn parse_payload(data: &str) -> Result<Value> {
    serde_json::from_str(data).map_err(|e| Error::InvalidPayload {
        reason: e.to_string(),
    })
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
