//! Output formatting module
//!
//! Handles:
//! - Building the canonical detection event for a matched log line
//! - Human-readable formatting of detection events
//! - JSON line output

use crate::constants::EVENT_MAC_DETECTED;
use crate::mac::MacMatch;
use crate::models::{MacDetectionEvent, Verdict};
use anyhow::Result;
use std::time::SystemTime;

/// Create a MacDetectionEvent for a match found in `line`.
/// This is the canonical way to build an event for output, so field names and
/// structure stay the same across stdout and structured logs.
pub fn create_detection_event(
    found: &MacMatch,
    line: &str,
    verdict: Verdict,
    seen_at: SystemTime,
) -> Result<MacDetectionEvent> {
    use time::OffsetDateTime;

    let timestamp = OffsetDateTime::from(seen_at);
    let timestamp_str = timestamp.format(&time::format_description::well_known::Iso8601::DEFAULT)?;

    Ok(MacDetectionEvent {
        timestamp: timestamp_str,
        event_type: EVENT_MAC_DETECTED.to_string(),
        raw: found.raw.clone(),
        mac: found.mac.to_string(),
        verdict,
        line: line.trim_end_matches(['\r', '\n']).to_string(),
    })
}

/// Format a detection event as human-readable text
pub fn format_event_human(event: &MacDetectionEvent) -> String {
    let status = match event.verdict {
        Verdict::Detected => "",
        Verdict::Authorized => " - authorized",
        Verdict::Unauthorized => " - NOT authorized",
        Verdict::AlreadyHandled => " - NOT authorized (already handled)",
    };

    format!(
        "[{}] MAC Address found: {} (normalized: {}){}",
        event.timestamp, event.raw, event.mac, status
    )
}

/// Format a detection event as a single JSON line
pub fn format_event_json(event: &MacDetectionEvent) -> Result<String> {
    Ok(serde_json::to_string(event)?)
}
