// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use yare::parameterized;

#[parameterized(
    not_initialized = { Error::NotInitialized, "rollcall init" },
    already_initialized = { Error::AlreadyInitialized("/school/.rollcall".into()), "/school/.rollcall" },
    no_remote = { Error::NoRemote, "hint: run 'rollcall init --remote" },
    bad_url = { Error::InvalidRemoteUrl("ftp://x".into()), "ftp://x" },
    bad_payload = { Error::InvalidPayload { reason: "expected value".into() }, "expected value" },
    agent_running = { Error::AgentRunning, "another sync agent is running" },
    config = { Error::Config("failed to parse config".into()), "config error: failed to parse config" },
)]
fn test_error_display(err: Error, expected: &str) {
    assert!(
        err.to_string().contains(expected),
        "'{}' should contain '{}'",
        err,
        expected
    );
}

#[test]
fn test_payload_hint_renders_braces() {
    let err = Error::InvalidPayload {
        reason: "x".into(),
    };
    assert!(err.to_string().contains("{\"id\": \"s1\""));
}

#[test]
fn test_store_error_is_transparent() {
    let err: Error = rc_core::Error::EmptyTable.into();
    assert_eq!(err.to_string(), rc_core::Error::EmptyTable.to_string());
}

#[test]
fn test_from_io_error() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    let err: Error = io_err.into();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_from_json_error() {
    let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let err: Error = json_err.into();
    assert!(err.to_string().starts_with("json error"));
}

#[test]
fn test_from_sync_error() {
    let sync_err = SyncError::PassAborted {
        synced: 2,
        source: rc_core::Error::LockPoisoned,
    };
    let err: Error = sync_err.into();
    assert!(err.to_string().contains("aborted after 2 entries"));
}
