// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! The variable name constants are generated by `build.rs` and live in the
//! [`vars`] submodule.

use std::path::PathBuf;

/// Generated environment variable name constants.
pub mod vars {
    include!(concat!(env!("OUT_DIR"), "/env_vars.rs"));
}

/// Returns `true` if `ROLLCALL_TIMINGS` is set (any value).
pub fn timings() -> bool {
    std::env::var(vars::ROLLCALL_TIMINGS).is_ok()
}

/// Returns the value of `ROLLCALL_DIR` if set and non-empty.
///
/// Points directly at a `.rollcall` directory, bypassing the upward search.
pub fn work_dir_override() -> Option<PathBuf> {
    std::env::var(vars::ROLLCALL_DIR)
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Returns the tracing filter directive in `ROLLCALL_LOG`, if set.
pub fn log_filter() -> Option<String> {
    std::env::var(vars::ROLLCALL_LOG)
        .ok()
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
