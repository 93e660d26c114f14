// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing subscriber setup.
//!
//! One-shot commands log warnings and errors to stderr. `rollcall watch`
//! logs at info level to `.rollcall/agent.log`. `ROLLCALL_LOG` overrides
//! the filter in both cases (e.g. `ROLLCALL_LOG=rcrs=debug`).

use std::fs;
use std::path::Path;

use tracing_subscriber::EnvFilter;

fn filter(default: &str) -> EnvFilter {
    crate::env::log_filter()
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(default))
}

/// Log to stderr at `warn` unless overridden.
pub fn init_stderr() {
    // A second init in the same process keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter("warn"))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Log to `log_path` at `info`, falling back to stderr if it cannot be opened.
pub fn init_file(log_path: &Path) {
    let filter = filter("info");

    if let Ok(file) = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
    {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(file)
            .with_ansi(false)
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}
