// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! rc-remote: record server for rollcall clients.
//!
//! Holds the canonical copy of every collection and answers the CRUD
//! requests that rollcall replays from its offline queue.

mod logging;
mod server;
#[cfg(test)]
mod server_tests;
mod state;

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;

/// rc-remote: record server for rollcall
#[derive(Parser, Debug)]
#[command(name = "rc-remote")]
#[command(about = "WebSocket record server for rollcall offline sync")]
struct Args {
    /// Address to bind the server to
    #[arg(short, long, default_value = "0.0.0.0:7890")]
    bind: SocketAddr,

    /// Directory for the record database
    #[arg(short, long, default_value = ".")]
    data: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    logging::init(args.verbose).map_err(|e| e as Box<dyn std::error::Error>)?;

    info!("Starting rc-remote server");
    info!("  Bind address: {}", args.bind);
    info!("  Data directory: {}", args.data.display());

    std::fs::create_dir_all(&args.data)?;
    let state = state::ServerState::new(&args.data)?;

    server::run(args.bind, state).await?;

    Ok(())
}
