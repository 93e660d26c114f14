// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use super::{runtime, Remote, Workspace};
use crate::error::{Error, Result};
use crate::sync::{PassOutcome, SkipReason, SyncEngine};

pub fn run() -> Result<()> {
    let ws = Workspace::open()?;
    let remote_config = ws.config.require_remote()?.clone();
    let Some(_lock) = ws.try_lock_agent()? else {
        return Err(Error::AgentRunning);
    };

    let rt = runtime()?;
    let outcome = rt.block_on(async {
        let remote = Remote::connect(&remote_config).await?;
        let engine = SyncEngine::new(
            Arc::clone(&ws.store),
            Arc::clone(&remote.backend),
            Arc::clone(&remote.monitor),
            remote_config.dispatch_timeout(),
        );
        let outcome = crate::time_phase!("sync::pass", { engine.run_pass().await? });
        Ok::<_, Error>(outcome)
    })?;

    print!("{}", describe(&outcome, ws.store.pending_count()?));
    Ok(())
}

/// Human summary of a pass. `pending` is the queue size after the pass.
pub(crate) fn describe(outcome: &PassOutcome, pending: usize) -> String {
    match outcome {
        PassOutcome::Skipped(SkipReason::Offline) => format!(
            "Offline: {} change(s) saved locally, will sync when online\n",
            pending
        ),
        PassOutcome::Skipped(SkipReason::InProgress) => {
            "A sync pass is already running\n".to_string()
        }
        PassOutcome::Completed(report) if report.attempted == 0 => "Nothing to sync\n".to_string(),
        PassOutcome::Completed(report) => {
            let mut out = format!(
                "Synced {} of {} change(s)\n",
                report.synced, report.attempted
            );
            for failure in &report.failures {
                out.push_str(&format!(
                    "  failed: {} {} {}: {}\n",
                    failure.entry_id, failure.operation, failure.table, failure.error
                ));
            }
            if !report.is_clean() {
                out.push_str(&format!(
                    "{} change(s) will retry on the next sync\n",
                    report.remaining()
                ));
            }
            out
        }
    }
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
