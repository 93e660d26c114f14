// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::sync::SyncError;

/// All possible errors that can occur in the rcrs library.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not initialized: run 'rollcall init' first")]
    NotInitialized,

    #[error("already initialized at {0}")]
    AlreadyInitialized(String),

    #[error("no remote configured\n  hint: run 'rollcall init --remote ws://host:port' or add a [remote] section to .rollcall/config.toml")]
    NoRemote,

    #[error("invalid remote URL '{0}'\n  hint: use ws://host[:port][/path] or wss://host[:port][/path]")]
    InvalidRemoteUrl(String),

    #[error("invalid JSON payload: {reason}\n  hint: pass a JSON object, e.g. '{{\"id\": \"s1\", \"name\": \"Amal\"}}'")]
    InvalidPayload { reason: String },

    #[error("another sync agent is running\n  hint: stop the running 'rollcall watch' or wait for its pass to finish")]
    AgentRunning,

    #[error(transparent)]
    Store(#[from] rc_core::Error),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),
}

/// Result type alias for rcrs operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
