//! Data models module
//!
//! Defines core data structures shared by both tools:
//! - WatchConfiguration / EnrollConfiguration: resolved runtime settings
//! - MacDetectionEvent: canonical watcher output record
//! - Verdict / WatchOutcome: what the watcher decided and why it stopped

use crate::command::ActionCommand;
use crate::mac::MacAddress;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// How the watcher treats a detected MAC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchMode {
    /// Run the action for every MAC seen
    Naive,
    /// Look the MAC up in the users file; act only when it is missing
    Authorized,
}

/// Configuration for the log watcher
#[derive(Debug, Clone)]
pub struct WatchConfiguration {
    /// Log file to follow
    pub log_path: PathBuf,
    /// Delay between unsuccessful reads
    pub interval: Duration,
    pub mode: WatchMode,
    /// Users file consulted in authorized mode
    pub users_file: PathBuf,
    /// Command run for a detected (naive) or unauthorized (authorized) MAC
    pub action: ActionCommand,
    /// Keep monitoring after acting on an unauthorized MAC
    pub continuous: bool,
    /// Whether to output JSON format
    pub output_json: bool,
    /// Whether to run in quiet mode
    pub quiet_mode: bool,
}

/// Configuration for the enrollment tool
#[derive(Debug, Clone)]
pub struct EnrollConfiguration {
    /// MAC address exactly as given on the command line
    pub mac_input: String,
    pub users_file: PathBuf,
    /// Restart the service instead of rebooting
    pub no_reboot: bool,
    pub dry_run: bool,
    /// Skip the confirmation prompt for already enrolled MACs
    pub assume_yes: bool,
    pub service: String,
    pub reboot_countdown: u64,
    pub restart_command: ActionCommand,
    pub reboot_command: ActionCommand,
}

/// Decision taken for a detected MAC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Naive mode: no lookup performed
    Detected,
    Authorized,
    Unauthorized,
    /// Unauthorized, but the action already ran for this MAC
    AlreadyHandled,
}

/// Why the watcher loop returned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchOutcome {
    /// Stopped by SIGINT/SIGTERM
    Interrupted,
    /// Single-shot authorized mode acted on an unauthorized MAC
    ActedOnUnauthorized { mac: MacAddress, success: bool },
}

/// Canonical event structure for MAC detection output.
/// Used by watcher stdout (human or JSON) and structured logging so both
/// carry the same fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MacDetectionEvent {
    /// ISO 8601 timestamp of when the line was read
    pub timestamp: String,
    /// Event type identifier
    pub event_type: String,
    /// MAC as it appeared in the log
    pub raw: String,
    /// Normalized MAC
    pub mac: String,
    pub verdict: Verdict,
    /// The log line, without its trailing newline
    pub line: String,
}

/// Custom error types for monitoring operations
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Log file '{0}' not found.")]
    LogFileNotFound(PathBuf),
    /// Note: bounds must match POLL_INTERVAL_MIN/MAX in constants.rs
    #[error("Invalid polling interval: {0}. Must be between 0.01 and 60 seconds")]
    InvalidInterval(f64),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Verdict::AlreadyHandled).unwrap(), "\"already_handled\"");
        assert_eq!(serde_json::to_string(&Verdict::Authorized).unwrap(), "\"authorized\"");
    }

    #[test]
    fn test_invalid_interval_error_message() {
        let error = MonitorError::InvalidInterval(500.0);
        let msg = error.to_string();
        assert!(msg.contains("Invalid polling interval: 500"));
        assert!(msg.contains("Must be between 0.01 and 60 seconds"));
    }

    #[test]
    fn test_log_file_not_found_message() {
        let error = MonitorError::LogFileNotFound(PathBuf::from("/var/log/missing.log"));
        assert_eq!(error.to_string(), "Log file '/var/log/missing.log' not found.");
    }
}
