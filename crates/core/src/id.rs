// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Id generation for queue entries and locally created records.

use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};

/// Prefix for queue entry ids.
pub const ENTRY_PREFIX: &str = "q";

/// Prefix for record ids assigned on the device before the backend sees them.
pub const LOCAL_RECORD_PREFIX: &str = "local";

/// Generate an id from a prefix, arbitrary seed text, and a timestamp.
/// Format: {prefix}-{hash} where hash is the first 12 hex chars of
/// SHA256(seed + timestamp).
pub fn generate_id(prefix: &str, seed: &str, at: &DateTime<Utc>) -> String {
    let input = format!(
        "{}{}",
        seed,
        at.to_rfc3339_opts(SecondsFormat::Nanos, true)
    );
    let hash = Sha256::digest(input.as_bytes());
    let short_hash = hex::encode(&hash[..6]);
    format!("{}-{}", prefix, short_hash)
}

/// Generate a unique id, handling collisions by appending an incrementing suffix.
pub fn generate_unique_id<F>(prefix: &str, seed: &str, at: &DateTime<Utc>, mut exists: F) -> String
where
    F: FnMut(&str) -> bool,
{
    let base_id = generate_id(prefix, seed, at);

    if !exists(&base_id) {
        return base_id;
    }

    let mut suffix = 2;
    loop {
        let id = format!("{}-{}", base_id, suffix);
        if !exists(&id) {
            return id;
        }
        suffix += 1;
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
