// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `rollcall watch`: keep syncing in the foreground until interrupted.

use std::sync::Arc;

use tracing::info;

use super::{runtime, Remote, Workspace};
use crate::config::get_log_path;
use crate::error::{Error, Result};
use crate::sync::{SyncAgent, SyncEngine};

pub fn run() -> Result<()> {
    let ws = Workspace::open()?;
    crate::logging::init_file(&get_log_path(&ws.work_dir));

    let remote_config = ws.config.require_remote()?.clone();
    let Some(_lock) = ws.try_lock_agent()? else {
        return Err(Error::AgentRunning);
    };

    let rt = runtime()?;
    rt.block_on(async {
        let Remote {
            config,
            probe,
            monitor,
            backend,
        } = Remote::connect(&remote_config).await?;

        let engine = Arc::new(SyncEngine::new(
            Arc::clone(&ws.store),
            backend,
            Arc::clone(&monitor),
            config.dispatch_timeout(),
        ));
        let prober = monitor.spawn_probe(probe, config.probe_interval());
        let agent = SyncAgent::new(engine);
        agent.start();

        info!(url = %config.url, online = monitor.is_online(), "sync agent started");
        println!(
            "Watching {} ({}). Press Ctrl-C to stop.",
            config.url,
            if monitor.is_online() { "online" } else { "offline" }
        );

        let signal = tokio::signal::ctrl_c().await;

        agent.stop();
        monitor.stop();
        let _ = prober.await;
        signal?;

        let session = agent.session();
        info!(
            last_sync = ?session.last_sync_time,
            pending = ws.store.pending_count()?,
            "sync agent stopped"
        );
        Ok(())
    })
}
