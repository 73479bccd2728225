//! Global constants for radmac
//!
//! Centralized location for application-wide constants

/// Application name, used for the configuration directory and log events
pub const APP_NAME: &str = "radmac";

/// Configuration file name inside the per-user config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Default FreeRADIUS users file (Debian/Ubuntu layout)
pub const DEFAULT_USERS_FILE: &str = "/etc/freeradius/3.0/users";

/// Suffix appended to the users file path for the pre-write backup
pub const BACKUP_SUFFIX: &str = ".backup";

/// Default RADIUS service unit
pub const DEFAULT_SERVICE: &str = "freeradius";

/// Message passed to `shutdown` when rebooting after an enrollment
pub const REBOOT_MESSAGE: &str = "Rebooting after FreeRADIUS MAC addition";

/// Seconds the operator has to cancel a reboot
pub const DEFAULT_REBOOT_COUNTDOWN: u64 = 10;

/// Default poll interval for the log watcher, in seconds
pub const POLL_INTERVAL_DEFAULT: f64 = 0.1;

/// Poll interval bounds, in seconds.
/// Note: keep in sync with the message of `MonitorError::InvalidInterval`
pub const POLL_INTERVAL_MIN: f64 = 0.01;
pub const POLL_INTERVAL_MAX: f64 = 60.0;

/// Placeholder substituted with the normalized MAC in action arguments
pub const PLACEHOLDER_MAC: &str = "{mac}";

/// Placeholder substituted with the MAC exactly as matched in the log line
pub const PLACEHOLDER_RAW: &str = "{raw}";

/// Placeholder substituted with the service name in the restart command
pub const PLACEHOLDER_SERVICE: &str = "{service}";

/// Event type identifiers for detection output and structured logging
pub const EVENT_MAC_DETECTED: &str = "mac_detected";
pub const EVENT_ACTION_EXECUTED: &str = "action_executed";
pub const EVENT_ACTION_FAILED: &str = "action_failed";
pub const EVENT_WATCH_STARTUP: &str = "watch_startup";
pub const EVENT_WATCH_SHUTDOWN: &str = "watch_shutdown";
pub const EVENT_RECORD_ADDED: &str = "record_added";
