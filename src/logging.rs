//! Structured logging for both tools
//!
//! Diagnostics go through the `log` facade with an `env_logger` backend on
//! stderr. Lifecycle and detection events are logged as a short message
//! followed by a JSON payload, so they can be grepped or parsed later.

use crate::constants::{
    APP_NAME, EVENT_ACTION_EXECUTED, EVENT_ACTION_FAILED, EVENT_RECORD_ADDED,
    EVENT_WATCH_SHUTDOWN, EVENT_WATCH_STARTUP,
};
use crate::models::MacDetectionEvent;
use anyhow::Result;
use log::{error, info, LevelFilter};
use serde_json::json;
use std::path::Path;

/// Install the global logger.
///
/// `RUST_LOG` takes precedence; otherwise warnings only, or debug output
/// when `verbose` is set. Calling this twice is harmless.
pub fn init_logger(verbose: bool) {
    let default_level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    let _ = env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .format_target(false)
        .try_init();
}

/// Log levels for events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Info,
}

/// Structured event logger
#[derive(Debug, Clone)]
pub struct EventLogger {
    /// Minimum level emitted
    level: LogLevel,
}

impl Default for EventLogger {
    fn default() -> Self {
        Self::new(LogLevel::Info)
    }
}

impl EventLogger {
    pub fn new(level: LogLevel) -> Self {
        Self { level }
    }

    /// Log watcher startup
    pub fn log_startup(&self, log_path: &Path, mode: &str, pid: u32) -> Result<()> {
        let message = json!({
            "event": EVENT_WATCH_STARTUP,
            "app": APP_NAME,
            "pid": pid,
            "log_path": log_path.display().to_string(),
            "mode": mode,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        self.log_structured(LogLevel::Info, "Watcher started", &message)
    }

    /// Log watcher shutdown
    pub fn log_shutdown(&self, reason: &str) -> Result<()> {
        let message = json!({
            "event": EVENT_WATCH_SHUTDOWN,
            "reason": reason,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        self.log_structured(LogLevel::Info, "Watcher shutting down", &message)
    }

    /// Log a MAC detection using the canonical event structure
    pub fn log_detection(&self, event: &MacDetectionEvent) -> Result<()> {
        let message = serde_json::to_value(event)?;
        self.log_structured(LogLevel::Info, &format!("MAC detected: {}", event.mac), &message)
    }

    /// Log the result of an action command
    pub fn log_action(&self, mac: &str, command: &str, outcome: std::result::Result<&str, &str>) -> Result<()> {
        let (level, event, detail) = match outcome {
            Ok(stdout) => (LogLevel::Info, EVENT_ACTION_EXECUTED, json!({ "stdout": stdout })),
            Err(err) => (LogLevel::Error, EVENT_ACTION_FAILED, json!({ "error": err })),
        };
        let message = json!({
            "event": event,
            "mac": mac,
            "command": command,
            "detail": detail,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        self.log_structured(level, &format!("Action for {}", mac), &message)
    }

    /// Log a users file write
    pub fn log_record_added(&self, users_file: &Path, line: &str, backup: Option<&Path>) -> Result<()> {
        let message = json!({
            "event": EVENT_RECORD_ADDED,
            "users_file": users_file.display().to_string(),
            "record": line,
            "backup": backup.map(|p| p.display().to_string()),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        self.log_structured(LogLevel::Info, "Record added", &message)
    }

    /// Send a structured log message
    fn log_structured(&self, level: LogLevel, message: &str, data: &serde_json::Value) -> Result<()> {
        if !self.should_log(level) {
            return Ok(());
        }

        let full_message = format!("{} | {}", message, data);

        match level {
            LogLevel::Error => {
                error!("{}", full_message);
            }
            LogLevel::Info => {
                info!("{}", full_message);
            }
        }

        Ok(())
    }

    /// Check if we should log at this level
    fn should_log(&self, level: LogLevel) -> bool {
        matches!(
            (self.level, level),
            (LogLevel::Error, LogLevel::Error) | (LogLevel::Info, LogLevel::Error | LogLevel::Info)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_filtering() {
        let errors_only = EventLogger::new(LogLevel::Error);
        assert!(errors_only.should_log(LogLevel::Error));
        assert!(!errors_only.should_log(LogLevel::Info));

        let info = EventLogger::default();
        assert!(info.should_log(LogLevel::Error));
        assert!(info.should_log(LogLevel::Info));
    }

    #[test]
    fn test_logging_without_backend_is_ok() {
        init_logger(false);
        let logger = EventLogger::default();
        assert!(logger.log_shutdown("test").is_ok());
        assert!(logger
            .log_action("aabbccddeeff", "echo hi", Err("boom"))
            .is_ok());
    }
}
