// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use chrono::SecondsFormat;
use rc_core::QueueEntry;

use super::Workspace;
use crate::cli::OutputFormat;
use crate::error::Result;

pub fn run(output: OutputFormat) -> Result<()> {
    let ws = Workspace::open()?;
    let entries = crate::time_phase!("queue::list_pending", { ws.store.list_pending()? });
    print!("{}", render(&entries, output)?);
    Ok(())
}

pub(crate) fn render(entries: &[QueueEntry], output: OutputFormat) -> Result<String> {
    match output {
        OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(entries)?)),
        OutputFormat::Text if entries.is_empty() => Ok("No pending changes\n".to_string()),
        OutputFormat::Text => {
            let mut out = String::new();
            for entry in entries {
                out.push_str(&format_line(entry));
                out.push('\n');
            }
            out.push_str(&format!("{} pending\n", entries.len()));
            Ok(out)
        }
    }
}

fn format_line(entry: &QueueEntry) -> String {
    format!(
        "{}  {}  {:<6}  {}  {}",
        entry.id,
        entry.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        entry.operation.as_str(),
        entry.table,
        entry.record_id().unwrap_or_else(|| "-".to_string())
    )
}

#[cfg(test)]
#[path = "pending_tests.rs"]
mod tests;
