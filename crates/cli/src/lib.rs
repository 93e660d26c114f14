// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! rcrs - offline-first sync client for school records.
//!
//! Changes to students, teachers, fees, attendance and the rest are written
//! to a durable local queue first and replayed against the record server
//! once it is reachable.
//!
//! # Main Components
//!
//! - [`Config`] - `.rollcall/config.toml`, including the optional `[remote]`
//! - [`sync::SyncEngine`] - one ordered replay pass over the queue
//! - [`sync::SyncAgent`] - runs passes when connectivity returns
//! - [`sync::OfflineDataManager`] - CRUD that falls back to the queue and cache
//! - [`Error`] - Error types for all commands
//!
//! The queue and record cache themselves live in `rc-core`.
//!
//! ```rust,ignore
//! use rcrs::{find_work_dir, get_db_path, Config};
//! use rc_core::QueueStore;
//!
//! let work_dir = find_work_dir()?;
//! let config = Config::load(&work_dir)?;
//! let store = QueueStore::open(&get_db_path(&work_dir))?;
//! println!("{} pending", store.pending_count()?);
//! ```

mod cli;
mod commands;
mod logging;
pub mod timings;

pub mod config;
pub mod env;
pub mod error;
pub mod sync;

pub use cli::{Cli, Command, OutputFormat};
pub use config::{find_work_dir, get_db_path, init_work_dir, Config, RemoteConfig};
pub use error::{Error, Result};

/// Run one parsed command.
pub fn run(command: Command) -> Result<()> {
    // `watch` logs to a file once it has found the workspace.
    if !matches!(command, Command::Watch) {
        logging::init_stderr();
    }

    match command {
        Command::Init { remote, path } => commands::init::run(path, remote),
        Command::Enqueue {
            table,
            operation,
            data,
        } => commands::enqueue::run(table, operation, data),
        Command::Pending { output } => commands::pending::run(output),
        Command::Status { output } => commands::status::run(output),
        Command::Sync => commands::sync::run(),
        Command::Watch => commands::watch::run(),
        Command::Fetch { table, output } => commands::records::fetch(table, output),
        Command::Insert { table, data } => commands::records::insert(table, data),
        Command::Update { table, id, data } => commands::records::update(table, id, data),
        Command::Delete { table, id } => commands::records::delete(table, id),
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
