// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! CLI argument parsing tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use super::*;
use yare::parameterized;

/// Helper to parse CLI args into a Cli struct.
fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(args)
}

#[test]
fn test_init_defaults() {
    let cli = parse(&["rollcall", "init"]).unwrap();
    match cli.command {
        Command::Init { remote, path } => {
            assert_eq!(remote, None);
            assert_eq!(path, ".");
        }
        _ => panic!("expected init"),
    }
}

#[test]
fn test_init_with_remote_and_path() {
    let cli = parse(&[
        "rollcall",
        "init",
        "--remote",
        "ws://localhost:7890",
        "--path",
        "/tmp/school",
    ])
    .unwrap();
    match cli.command {
        Command::Init { remote, path } => {
            assert_eq!(remote.as_deref(), Some("ws://localhost:7890"));
            assert_eq!(path, "/tmp/school");
        }
        _ => panic!("expected init"),
    }
}

#[parameterized(
    lower = { "insert", Operation::Insert },
    upper = { "UPDATE", Operation::Update },
    mixed = { "Delete", Operation::Delete },
)]
fn test_enqueue_operation_parsing(op: &str, expected: Operation) {
    let cli = parse(&["rollcall", "enqueue", "students", op, "{\"id\":\"s1\"}"]).unwrap();
    match cli.command {
        Command::Enqueue {
            table,
            operation,
            data,
        } => {
            assert_eq!(table, "students");
            assert_eq!(operation, expected);
            assert_eq!(data, "{\"id\":\"s1\"}");
        }
        _ => panic!("expected enqueue"),
    }
}

#[test]
fn test_enqueue_rejects_unknown_operation() {
    assert!(parse(&["rollcall", "enqueue", "students", "upsert", "{}"]).is_err());
}

#[test]
fn test_enqueue_rejects_blank_table() {
    assert!(parse(&["rollcall", "enqueue", "  ", "insert", "{}"]).is_err());
}

#[parameterized(
    default = { &["rollcall", "pending"], OutputFormat::Text },
    long = { &["rollcall", "pending", "--output", "json"], OutputFormat::Json },
    short = { &["rollcall", "pending", "-o", "json"], OutputFormat::Json },
)]
fn test_pending_output(args: &[&str], expected: OutputFormat) {
    match parse(args).unwrap().command {
        Command::Pending { output } => assert_eq!(output, expected),
        _ => panic!("expected pending"),
    }
}

#[parameterized(
    sync = { &["rollcall", "sync"] },
    watch = { &["rollcall", "watch"] },
    status = { &["rollcall", "status"] },
    fetch = { &["rollcall", "fetch", "teachers"] },
    insert = { &["rollcall", "insert", "fees", "{\"amount\":10}"] },
    update = { &["rollcall", "update", "fees", "f1", "{\"amount\":12}"] },
    delete = { &["rollcall", "delete", "fees", "f1"] },
)]
fn test_commands_parse(args: &[&str]) {
    assert!(parse(args).is_ok());
}

#[test]
fn test_delete_requires_id() {
    assert!(parse(&["rollcall", "delete", "fees"]).is_err());
}

#[test]
fn test_unknown_output_format_rejected() {
    assert!(parse(&["rollcall", "pending", "-o", "yaml"]).is_err());
}
