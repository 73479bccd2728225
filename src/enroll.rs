//! Enrollment of a MAC address into the FreeRADIUS users file
//!
//! Validates and normalizes the address, prepends a credential record,
//! then restarts the RADIUS service or reboots the host. Rebooting is
//! preceded by a countdown; interrupting it falls back to a service restart.
//! An interrupt at any other point cancels the whole operation.

use crate::command::ActionCommand;
use crate::logging::EventLogger;
use crate::mac::{self, MacAddress, SUPPORTED_FORMATS};
use crate::models::EnrollConfiguration;
use crate::store::{AuthorizationRecord, AuthorizationStore, StoreError};
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Granularity at which the reboot countdown checks for an interrupt
const COUNTDOWN_TICK: Duration = Duration::from_millis(100);

#[derive(Debug, thiserror::Error)]
pub enum EnrollError {
    #[error("This program must be run as root to modify system files and reboot.")]
    NotRoot,
    #[error("'{0}' does not appear to be a valid MAC address.\nSupported formats: {}", SUPPORTED_FORMATS)]
    InvalidMac(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Operation cancelled by user.")]
    Cancelled,
}

/// What an interrupt means at the moment it arrives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    /// Skip the pending reboot and restart the service instead
    CancelReboot,
    /// Abandon the operation
    CancelOperation,
}

/// Interrupt state shared between the signal handler thread and the enroller
#[derive(Debug, Clone, Default)]
pub struct Interrupts {
    requested: Arc<AtomicBool>,
    counting_down: Arc<AtomicBool>,
}

impl Interrupts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an interrupt and decide what it means
    pub fn interrupt(&self) -> InterruptAction {
        self.requested.store(true, Ordering::SeqCst);
        if self.is_counting_down() {
            InterruptAction::CancelReboot
        } else {
            InterruptAction::CancelOperation
        }
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    pub(crate) fn is_counting_down(&self) -> bool {
        self.counting_down.load(Ordering::SeqCst)
    }

    fn set_counting_down(&self, active: bool) {
        self.counting_down.store(active, Ordering::SeqCst);
    }

    fn clear(&self) {
        self.requested.store(false, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), EnrollError> {
        if self.is_requested() {
            return Err(EnrollError::Cancelled);
        }
        Ok(())
    }
}

/// What happened after the record was written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    Restarted,
    Rebooted,
    /// The reboot countdown was interrupted; the service was restarted instead
    RebootCancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollOutcome {
    /// Nothing was changed
    DryRun { mac: MacAddress },
    /// Operator declined to enroll an already present MAC
    Aborted { mac: MacAddress },
    Enrolled {
        mac: MacAddress,
        action: ServiceAction,
        /// Whether the restart/reboot command succeeded
        success: bool,
    },
}

/// Refuse to modify system state without root, unless only planning
pub fn check_privileges(dry_run: bool, is_root: bool) -> Result<(), EnrollError> {
    if !dry_run && !is_root {
        return Err(EnrollError::NotRoot);
    }
    Ok(())
}

/// Drives one enrollment. Prompts are read from `input`, progress is written
/// to `out`.
pub struct Enroller<R: BufRead, W: Write> {
    config: EnrollConfiguration,
    store: AuthorizationStore,
    logger: EventLogger,
    input: R,
    out: W,
}

impl<R: BufRead, W: Write> Enroller<R, W> {
    pub fn new(config: EnrollConfiguration, input: R, out: W) -> Self {
        let store = AuthorizationStore::new(&config.users_file);
        Self {
            config,
            store,
            logger: EventLogger::default(),
            input,
            out,
        }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Run the enrollment.
    ///
    /// An interrupt recorded in `interrupts` during the reboot countdown
    /// turns the reboot into a service restart; recorded at any other time it
    /// ends the run with [`EnrollError::Cancelled`] before the next change.
    pub fn run(&mut self, is_root: bool, interrupts: &Interrupts) -> Result<EnrollOutcome, EnrollError> {
        check_privileges(self.config.dry_run, is_root)?;

        if !mac::is_valid_notation(&self.config.mac_input) {
            return Err(EnrollError::InvalidMac(self.config.mac_input.clone()));
        }
        let mac = mac::normalize(&self.config.mac_input)
            .map_err(|_| EnrollError::InvalidMac(self.config.mac_input.clone()))?;
        writeln!(self.out, "Normalized MAC address: {}", mac)?;

        if self.config.dry_run {
            self.print_plan(&mac)?;
            return Ok(EnrollOutcome::DryRun { mac });
        }

        let file_exists = self.store.exists();
        if file_exists && self.store.contains(&mac) {
            writeln!(
                self.out,
                "MAC address {} already exists in {}",
                mac,
                self.store.path().display()
            )?;
            if !self.config.assume_yes && !self.confirm("Continue anyway? (y/N): ")? {
                writeln!(self.out, "Aborted.")?;
                return Ok(EnrollOutcome::Aborted { mac });
            }
        } else if file_exists && self.store.contains_substring(mac.as_str()) {
            log::warn!(
                "{} appears in {} outside of a MAC record",
                mac,
                self.store.path().display()
            );
        }

        interrupts.check()?;
        let appended = self.store.prepend(&mac)?;
        if let Some(backup) = &appended.backup {
            writeln!(self.out, "Backup created: {}", backup.display())?;
        }
        writeln!(self.out, "Added MAC address entry: {}", appended.line)?;
        if let Err(e) =
            self.logger
                .log_record_added(self.store.path(), &appended.line, appended.backup.as_deref())
        {
            log::debug!("Failed to log record: {}", e);
        }

        interrupts.check()?;
        let (action, success) = if self.config.no_reboot {
            (ServiceAction::Restarted, self.restart_service()?)
        } else if self.countdown(interrupts)? {
            interrupts.check()?;
            (ServiceAction::Rebooted, self.reboot()?)
        } else {
            writeln!(
                self.out,
                "\nReboot cancelled. Restarting {} service instead...",
                self.config.service
            )?;
            (ServiceAction::RebootCancelled, self.restart_service()?)
        };

        Ok(EnrollOutcome::Enrolled { mac, action, success })
    }

    fn print_plan(&mut self, mac: &MacAddress) -> io::Result<()> {
        let record = AuthorizationRecord::new(mac.clone());
        writeln!(self.out)?;
        writeln!(self.out, "--- DRY RUN MODE ---")?;
        writeln!(self.out, "Would add entry: {}", record.to_line())?;
        writeln!(self.out, "Would modify file: {}", self.store.path().display())?;
        if self.store.exists() && self.store.contains(mac) {
            writeln!(self.out, "Note: {} is already present", mac)?;
        }
        if self.config.no_reboot {
            writeln!(
                self.out,
                "Would restart {} service ({})",
                self.config.service,
                self.restart_command()
            )?;
        } else {
            writeln!(self.out, "Would reboot server ({})", self.config.reboot_command)?;
        }
        Ok(())
    }

    fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        write!(self.out, "{}", prompt)?;
        self.out.flush()?;
        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        Ok(answer.trim().eq_ignore_ascii_case("y"))
    }

    /// Count down to the reboot. Returns false if interrupted, in which case
    /// the interrupt is consumed.
    fn countdown(&mut self, interrupts: &Interrupts) -> io::Result<bool> {
        let seconds = self.config.reboot_countdown;
        interrupts.set_counting_down(true);
        let result = self.count_seconds(seconds, interrupts);
        interrupts.set_counting_down(false);
        result?;

        if interrupts.is_requested() {
            interrupts.clear();
            return Ok(false);
        }
        if seconds > 0 {
            writeln!(self.out)?;
        }
        Ok(true)
    }

    fn count_seconds(&mut self, seconds: u64, interrupts: &Interrupts) -> io::Result<()> {
        if seconds == 0 {
            return Ok(());
        }

        writeln!(
            self.out,
            "\nServer will reboot in {} seconds. Press Ctrl+C to cancel...",
            seconds
        )?;

        let ticks_per_second = (Duration::from_secs(1).as_millis() / COUNTDOWN_TICK.as_millis()) as u64;
        for remaining in (1..=seconds).rev() {
            write!(self.out, "Rebooting in {} seconds...\r", remaining)?;
            self.out.flush()?;
            for _ in 0..ticks_per_second {
                if interrupts.is_requested() {
                    return Ok(());
                }
                std::thread::sleep(COUNTDOWN_TICK);
            }
        }
        Ok(())
    }

    fn restart_command(&self) -> ActionCommand {
        self.config.restart_command.for_service(&self.config.service)
    }

    fn restart_service(&mut self) -> io::Result<bool> {
        writeln!(self.out, "Restarting {} service...", self.config.service)?;
        self.out.flush()?;
        match self.restart_command().run() {
            Ok(_) => {
                writeln!(self.out, "{} service restarted successfully.", self.config.service)?;
                Ok(true)
            }
            Err(e) => {
                eprintln!("Error restarting {} service: {}", self.config.service, e);
                Ok(false)
            }
        }
    }

    fn reboot(&mut self) -> io::Result<bool> {
        writeln!(self.out, "Rebooting server...")?;
        self.out.flush()?;
        match self.config.reboot_command.run() {
            Ok(_) => {
                writeln!(self.out, "Reboot initiated.")?;
                Ok(true)
            }
            Err(e) => {
                eprintln!("Error initiating reboot: {}", e);
                Ok(false)
            }
        }
    }
}
