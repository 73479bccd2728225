//! Configuration management
//!
//! Handles TOML configuration parsing and validation. Every key is optional;
//! command-line flags override whatever the file provides.

use crate::command::ActionCommand;
use crate::constants::{
    APP_NAME, CONFIG_FILE_NAME, DEFAULT_REBOOT_COUNTDOWN, DEFAULT_SERVICE, DEFAULT_USERS_FILE,
    PLACEHOLDER_SERVICE, POLL_INTERVAL_DEFAULT, POLL_INTERVAL_MAX, POLL_INTERVAL_MIN,
    REBOOT_MESSAGE,
};
use crate::models::MonitorError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Configuration {
    pub watch: WatchSettings,
    pub enroll: EnrollSettings,
}

/// Log watcher settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchSettings {
    /// Poll interval in seconds (0.01-60.0)
    pub poll_interval: f64,
    /// Users file consulted in authorized mode
    pub users_file: PathBuf,
    /// Keep monitoring after acting on an unauthorized MAC
    pub continuous: bool,
    /// Action argument vector; defaults depend on the watch mode
    pub action: Option<ActionCommand>,
}

/// Enrollment tool settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnrollSettings {
    pub users_file: PathBuf,
    /// RADIUS service restarted after enrollment
    pub service: String,
    /// Seconds before the reboot starts
    pub reboot_countdown: u64,
    pub restart_command: ActionCommand,
    pub reboot_command: ActionCommand,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL_DEFAULT,
            users_file: PathBuf::from(DEFAULT_USERS_FILE),
            continuous: false,
            action: None,
        }
    }
}

impl Default for EnrollSettings {
    fn default() -> Self {
        Self {
            users_file: PathBuf::from(DEFAULT_USERS_FILE),
            service: DEFAULT_SERVICE.to_string(),
            reboot_countdown: DEFAULT_REBOOT_COUNTDOWN,
            restart_command: ActionCommand::new(
                "systemctl",
                vec!["restart".to_string(), PLACEHOLDER_SERVICE.to_string()],
            ),
            reboot_command: ActionCommand::new(
                "shutdown",
                vec!["-r".to_string(), "+0".to_string(), REBOOT_MESSAGE.to_string()],
            ),
        }
    }
}

impl WatchSettings {
    /// Poll interval as a `Duration`
    pub fn polling_duration(&self) -> Duration {
        Duration::from_secs_f64(self.poll_interval)
    }
}

/// Validate a poll interval given in seconds
pub fn validate_interval(seconds: f64) -> Result<Duration, MonitorError> {
    if !seconds.is_finite() || !(POLL_INTERVAL_MIN..=POLL_INTERVAL_MAX).contains(&seconds) {
        return Err(MonitorError::InvalidInterval(seconds));
    }
    Ok(Duration::from_secs_f64(seconds))
}

impl Configuration {
    /// Per-user configuration file location
    pub fn default_config_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().context("Could not determine configuration directory")?;
        Ok(dir.join(APP_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load and validate a configuration file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        let config: Configuration = toml::from_str(&content)
            .with_context(|| format!("Failed to parse configuration file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the explicit path if given, else the per-user file if it exists,
    /// else built-in defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                anyhow::bail!("Configuration file not found: {}", path.display());
            }
            return Self::load_from_file(path);
        }

        match Self::default_config_path() {
            Ok(path) if path.exists() => {
                log::debug!("Using configuration file {}", path.display());
                Self::load_from_file(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_interval(self.watch.poll_interval)?;
        if self.enroll.service.trim().is_empty() {
            anyhow::bail!("enroll.service must not be empty");
        }
        Ok(())
    }
}
