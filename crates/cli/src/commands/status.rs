// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use super::{runtime, Remote, Workspace};
use crate::cli::OutputFormat;
use crate::error::Result;

/// Snapshot reported by `rollcall status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct Status {
    pub pending: usize,
    pub last_sync: Option<DateTime<Utc>>,
    pub remote: Option<String>,
    /// `None` when no remote is configured.
    pub online: Option<bool>,
    pub agent_running: bool,
}

pub fn run(output: OutputFormat) -> Result<()> {
    let ws = Workspace::open()?;

    let online = match &ws.config.remote {
        Some(remote) => {
            let rt = runtime()?;
            let remote = rt.block_on(Remote::connect(remote))?;
            Some(remote.monitor.is_online())
        }
        None => None,
    };
    // The probe lock is released at the end of this statement.
    let agent_running = ws.try_lock_agent()?.is_none();

    let status = Status {
        pending: ws.store.pending_count()?,
        last_sync: ws.store.last_sync_time()?,
        remote: ws.config.remote.as_ref().map(|r| r.url.clone()),
        online,
        agent_running,
    };
    print!("{}", render(&status, output)?);
    Ok(())
}

pub(crate) fn render(status: &Status, output: OutputFormat) -> Result<String> {
    if output == OutputFormat::Json {
        return Ok(format!("{}\n", serde_json::to_string_pretty(status)?));
    }

    let last_sync = status
        .last_sync
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| "never".to_string());
    let connection = match (&status.remote, status.online) {
        (Some(url), Some(true)) => format!("online ({})", url),
        (Some(url), _) => format!("offline ({})", url),
        (None, _) => "local only (no remote configured)".to_string(),
    };
    let agent = if status.agent_running {
        "running"
    } else {
        "stopped"
    };

    Ok(format!(
        "Pending:    {}\nLast sync:  {}\nConnection: {}\nAgent:      {}\n",
        status.pending, last_sync, connection, agent
    ))
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
