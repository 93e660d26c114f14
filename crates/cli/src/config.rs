// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Project configuration management.
//!
//! Configuration is stored in `.rollcall/config.toml`. The only section is
//! `[remote]`; without it the client runs in local-only mode and every
//! change stays queued.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

const WORK_DIR_NAME: &str = ".rollcall";
const CONFIG_FILE_NAME: &str = "config.toml";
const DB_FILE_NAME: &str = "queue.db";
const LOCK_FILE_NAME: &str = "agent.lock";
const LOG_FILE_NAME: &str = "agent.log";
const GITIGNORE_FILE_NAME: &str = ".gitignore";

/// Project configuration stored in `.rollcall/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Record server connection (optional - if absent, runs in local-only mode).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteConfig>,
}

/// Record server connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// WebSocket URL of the record server (`ws://` or `wss://`).
    pub url: String,
    /// Max time to wait for one backend call in milliseconds (default: 10000).
    #[serde(default = "default_dispatch_timeout_ms")]
    pub dispatch_timeout_ms: u64,
    /// Max time to wait for the WebSocket handshake in milliseconds (default: 5000).
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// How often `watch` re-checks reachability in milliseconds (default: 5000).
    #[serde(default = "default_probe_interval_ms")]
    pub probe_interval_ms: u64,
}

fn default_dispatch_timeout_ms() -> u64 {
    10_000
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_probe_interval_ms() -> u64 {
    5_000
}

impl RemoteConfig {
    /// Remote settings with default timeouts.
    pub fn new(url: impl Into<String>) -> Self {
        RemoteConfig {
            url: url.into(),
            dispatch_timeout_ms: default_dispatch_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            probe_interval_ms: default_probe_interval_ms(),
        }
    }

    /// Validates that the URL is a WebSocket URL with a host.
    pub fn validate(&self) -> Result<()> {
        let rest = self
            .url
            .strip_prefix("ws://")
            .or_else(|| self.url.strip_prefix("wss://"))
            .ok_or_else(|| Error::InvalidRemoteUrl(self.url.clone()))?;
        if rest.is_empty() || rest.starts_with('/') || rest.starts_with(':') {
            return Err(Error::InvalidRemoteUrl(self.url.clone()));
        }
        if self.probe_interval_ms == 0 {
            return Err(Error::Config("probe_interval_ms must be positive".to_string()));
        }
        Ok(())
    }

    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_millis(self.dispatch_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }
}

impl Config {
    /// Loads configuration from the given `.rollcall/` directory.
    pub fn load(work_dir: &Path) -> Result<Self> {
        let config_path = work_dir.join(CONFIG_FILE_NAME);
        let content = fs::read_to_string(&config_path)
            .map_err(|e| Error::Config(format!("failed to read config: {}", e)))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        if let Some(remote) = &config.remote {
            remote.validate()?;
        }
        Ok(config)
    }

    /// Saves configuration to the given `.rollcall/` directory.
    pub fn save(&self, work_dir: &Path) -> Result<()> {
        let config_path = work_dir.join(CONFIG_FILE_NAME);
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        fs::write(&config_path, content)?;
        Ok(())
    }

    /// Returns the remote settings, or [`Error::NoRemote`] in local-only mode.
    pub fn require_remote(&self) -> Result<&RemoteConfig> {
        self.remote.as_ref().ok_or(Error::NoRemote)
    }
}

/// Find the `.rollcall` directory.
///
/// `ROLLCALL_DIR` wins when set; otherwise walk up from the current directory.
pub fn find_work_dir() -> Result<PathBuf> {
    if let Some(dir) = crate::env::work_dir_override() {
        return if dir.is_dir() {
            Ok(dir)
        } else {
            Err(Error::NotInitialized)
        };
    }

    let mut current = std::env::current_dir()?;
    loop {
        let work_dir = current.join(WORK_DIR_NAME);
        if work_dir.is_dir() {
            return Ok(work_dir);
        }
        if !current.pop() {
            return Err(Error::NotInitialized);
        }
    }
}

/// Path of the SQLite file holding the queue and the record cache.
pub fn get_db_path(work_dir: &Path) -> PathBuf {
    work_dir.join(DB_FILE_NAME)
}

/// Path of the lock that keeps sync passes from overlapping across processes.
pub fn get_lock_path(work_dir: &Path) -> PathBuf {
    work_dir.join(LOCK_FILE_NAME)
}

/// Path of the log file written by `rollcall watch`.
pub fn get_log_path(work_dir: &Path) -> PathBuf {
    work_dir.join(LOG_FILE_NAME)
}

/// Initialize a new `.rollcall` directory at the given path.
pub fn init_work_dir(path: &Path, remote: Option<RemoteConfig>) -> Result<PathBuf> {
    let work_dir = path.join(WORK_DIR_NAME);

    if work_dir.exists() {
        return Err(Error::AlreadyInitialized(work_dir.display().to_string()));
    }
    if let Some(remote) = &remote {
        remote.validate()?;
    }

    fs::create_dir_all(&work_dir)?;

    let config = Config { remote };
    config.save(&work_dir)?;
    write_gitignore(&work_dir)?;

    Ok(work_dir)
}

/// Keep device-local state out of version control.
fn write_gitignore(work_dir: &Path) -> Result<()> {
    let content = "# Device-local queue and cache\nqueue.db*\n\n# Agent runtime files\nagent.lock\nagent.log\n";
    fs::write(work_dir.join(GITIGNORE_FILE_NAME), content)?;
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
