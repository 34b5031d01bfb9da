//! Offline event source: newline-delimited JSON message events.
//!
//! Each non-blank line is one raw Slack `message` event payload, in the same
//! shape Socket Mode delivers.

use std::io::BufRead;
use std::path::Path;

use anyhow::{Context, Result};

use slackprint_core::IncomingEvent;

pub fn read_events(path: &Path) -> Result<Vec<IncomingEvent>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open event file '{}'", path.display()))?;
    parse_events(std::io::BufReader::new(file))
        .with_context(|| format!("failed to read events from '{}'", path.display()))
}

pub fn parse_events(reader: impl BufRead) -> Result<Vec<IncomingEvent>> {
    let mut events = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let raw: serde_json::Value = serde_json::from_str(line)
            .with_context(|| format!("line {}: invalid JSON", index + 1))?;
        events.push(IncomingEvent::from_value(&raw));
    }
    Ok(events)
}
