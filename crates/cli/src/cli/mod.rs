// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use clap::{Parser, Subcommand, ValueEnum};
use rc_core::Operation;

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

/// Parse an operation name (insert, update, delete; any case).
fn parse_operation(s: &str) -> Result<Operation, String> {
    s.parse::<Operation>().map_err(|e| e.to_string())
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "rollcall")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Offline-first record sync for school management data")]
#[command(
    long_about = "Offline-first record sync for school management data.\n\n\
    Changes made without a connection are queued on this device and replayed \
    to the record server, in order, once the connection returns."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize a .rollcall directory in the current project
    #[command(after_help = "\
Examples:
  rollcall init                               Local-only; changes stay queued
  rollcall init --remote ws://10.0.0.5:7890   Sync with a record server")]
    Init {
        /// Record server WebSocket URL
        #[arg(long, value_name = "url")]
        remote: Option<String>,

        /// Directory to initialize (default: current directory)
        #[arg(long, value_name = "path", default_value = ".")]
        path: String,
    },

    /// Queue a raw mutation without contacting the server
    #[command(after_help = "\
Examples:
  rollcall enqueue attendance insert '{\"student\":\"s1\",\"status\":\"present\"}'
  rollcall enqueue students update '{\"id\":\"s1\",\"grade\":4}'
  rollcall enqueue fees delete '{\"id\":\"f9\"}'")]
    Enqueue {
        /// Target collection (students, teachers, fees, attendance, ...)
        #[arg(value_parser = non_empty_string)]
        table: String,

        /// insert, update, or delete
        #[arg(value_parser = parse_operation)]
        operation: Operation,

        /// JSON object payload; updates and deletes need an "id"
        data: String,
    },

    /// List queued changes waiting to sync
    Pending {
        #[arg(long, short, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Show queue size, last sync time, and reachability
    Status {
        #[arg(long, short, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Run one sync pass now
    Sync,

    /// Keep running, syncing whenever the connection returns
    Watch,

    /// List records in a collection (cached copy when offline)
    Fetch {
        #[arg(value_parser = non_empty_string)]
        table: String,

        #[arg(long, short, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Create a record, online if possible, otherwise queued
    Insert {
        #[arg(value_parser = non_empty_string)]
        table: String,

        /// JSON object payload
        data: String,
    },

    /// Merge fields into a record, online if possible, otherwise queued
    Update {
        #[arg(value_parser = non_empty_string)]
        table: String,

        #[arg(value_parser = non_empty_string)]
        id: String,

        /// JSON object with the fields to change
        data: String,
    },

    /// Delete a record, online if possible, otherwise queued
    Delete {
        #[arg(value_parser = non_empty_string)]
        table: String,

        #[arg(value_parser = non_empty_string)]
        id: String,
    },
}

#[cfg(test)]
#[path = "../cli_tests/mod.rs"]
mod tests;
