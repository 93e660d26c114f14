// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use crate::config::{init_work_dir, RemoteConfig};
use crate::error::Result;

pub fn run(path: String, remote: Option<String>) -> Result<()> {
    let target = PathBuf::from(path);
    let remote = remote.map(RemoteConfig::new);
    let url = remote.as_ref().map(|r| r.url.clone());

    let work_dir = init_work_dir(&target, remote)?;

    println!("Initialized rollcall at {}", work_dir.display());
    match url {
        Some(url) => println!("Remote: {}", url),
        None => println!("No remote configured; changes will stay queued on this device"),
    }
    Ok(())
}
