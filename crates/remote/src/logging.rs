// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing setup for the server.
//!
//! Logs at `info` (`debug` with `--verbose`). `RUST_LOG` overrides both.

use tracing_subscriber::EnvFilter;

/// Build the filter from an optional directive string, falling back to the
/// verbosity default when it is absent or does not parse.
pub fn filter(directive: Option<&str>, verbose: bool) -> EnvFilter {
    let default = if verbose { "debug" } else { "info" };
    directive
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(default))
}

pub fn init(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let directive = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(filter(directive.as_deref(), verbose))
        .try_init()
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
