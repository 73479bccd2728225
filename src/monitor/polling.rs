use crate::command::CommandError;
use crate::constants::EVENT_ACTION_EXECUTED;
use crate::logging::{EventLogger, LogLevel};
use crate::mac::{self, MacMatch};
use crate::models::{Verdict, WatchConfiguration, WatchMode, WatchOutcome};
use crate::monitor::{HandledTracker, LogTail, Waker};
use crate::output;
use crate::store::AuthorizationStore;
use anyhow::Result;
use serde_json::json;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

/// Log watcher: follows the configured log file and acts on MAC addresses
/// found in newly appended lines.
///
/// The log file is opened (and positioned at its end) by [`Watcher::open`],
/// so anything appended after `open` returns is seen by [`Watcher::run`].
pub struct Watcher<W: Write = io::Stdout> {
    config: WatchConfiguration,
    tail: LogTail,
    store: Option<AuthorizationStore>,
    tracker: HandledTracker,
    logger: EventLogger,
    out: W,
}

impl Watcher<io::Stdout> {
    /// Open the log file and prepare a watcher that prints to stdout
    pub fn open(config: WatchConfiguration) -> Result<Self> {
        Self::with_output(config, io::stdout())
    }
}

impl<W: Write> Watcher<W> {
    /// Open the log file and prepare a watcher that prints to `out`
    pub fn with_output(config: WatchConfiguration, out: W) -> Result<Self> {
        let tail = LogTail::open(&config.log_path)?;
        let store = match config.mode {
            WatchMode::Authorized => Some(AuthorizationStore::new(&config.users_file)),
            WatchMode::Naive => None,
        };
        // Quiet runs keep only failures in the structured log
        let logger = EventLogger::new(if config.quiet_mode { LogLevel::Error } else { LogLevel::Info });

        Ok(Self {
            config,
            tail,
            store,
            tracker: HandledTracker::new(),
            logger,
            out,
        })
    }

    /// Consume the watcher and return its output sink
    pub fn into_output(self) -> W {
        self.out
    }

    /// Run until interrupted or, in single-shot authorized mode, until the
    /// first unauthorized MAC has been acted on
    pub fn run(&mut self, interrupted: &AtomicBool) -> Result<WatchOutcome> {
        let mut waker = Waker::new(self.tail.path(), self.config.interval);

        self.print_banner(waker.is_event_driven())?;
        self.logger
            .log_startup(self.tail.path(), self.mode_name(), std::process::id())?;

        while !interrupted.load(Ordering::SeqCst) {
            match self.tail.next_line()? {
                Some(line) => {
                    if let Some(outcome) = self.process_line(&line)? {
                        self.logger.log_shutdown("Acted on unauthorized MAC")?;
                        return Ok(outcome);
                    }
                }
                None => waker.wait(),
            }
        }

        self.logger.log_shutdown("Received shutdown signal")?;
        Ok(WatchOutcome::Interrupted)
    }

    /// Handle one log line. Returns an outcome when the watcher should stop.
    pub fn process_line(&mut self, line: &str) -> Result<Option<WatchOutcome>> {
        let Some(found) = mac::find_in_line(line) else {
            return Ok(None);
        };

        match self.config.mode {
            WatchMode::Naive => {
                self.report(&found, line, Verdict::Detected)?;
                // Action failures are reported; monitoring goes on
                let _ = self.execute_action(&found)?;
                Ok(None)
            }
            WatchMode::Authorized => self.process_authorized(&found, line),
        }
    }

    fn process_authorized(&mut self, found: &MacMatch, line: &str) -> Result<Option<WatchOutcome>> {
        let authorized = self
            .store
            .as_ref()
            .is_some_and(|store| store.contains(&found.mac));

        if authorized {
            self.report(found, line, Verdict::Authorized)?;
            return Ok(None);
        }

        if self.tracker.is_handled(&found.mac) {
            self.report(found, line, Verdict::AlreadyHandled)?;
            return Ok(None);
        }

        self.report(found, line, Verdict::Unauthorized)?;
        let success = self.execute_action(found)?;
        self.tracker.mark_handled(found.mac.clone());

        if self.config.continuous {
            Ok(None)
        } else {
            Ok(Some(WatchOutcome::ActedOnUnauthorized {
                mac: found.mac.clone(),
                success,
            }))
        }
    }

    fn report(&mut self, found: &MacMatch, line: &str, verdict: Verdict) -> Result<()> {
        let event = output::create_detection_event(found, line, verdict, SystemTime::now())?;

        if self.config.output_json {
            writeln!(self.out, "{}", output::format_event_json(&event)?)?;
        } else {
            writeln!(self.out, "{}", output::format_event_human(&event))?;
        }
        self.out.flush()?;

        self.logger.log_detection(&event)?;
        Ok(())
    }

    /// Run the action for `found`; returns whether it succeeded
    fn execute_action(&mut self, found: &MacMatch) -> Result<bool> {
        let command = self.config.action.for_match(found);
        let result = command.run();

        match &result {
            Ok(output) => {
                self.logger
                    .log_action(found.mac.as_str(), &command.to_string(), Ok(output.stdout.as_str()))?;
                if self.config.output_json {
                    let event = json!({
                        "event_type": EVENT_ACTION_EXECUTED,
                        "mac": found.mac,
                        "command": command.to_string(),
                        "stdout": output.stdout,
                    });
                    writeln!(self.out, "{}", event)?;
                } else {
                    writeln!(self.out, "Command output: {}", output.stdout)?;
                }
            }
            Err(e) => {
                if let CommandError::Failed { stdout, .. } = e {
                    if !stdout.is_empty() && !self.config.output_json {
                        writeln!(self.out, "Command output: {}", stdout)?;
                    }
                }
                let message = e.to_string();
                self.logger
                    .log_action(found.mac.as_str(), &command.to_string(), Err(message.as_str()))?;
                report_command_error(e);
            }
        }
        self.out.flush()?;

        Ok(result.is_ok())
    }

    fn print_banner(&mut self, event_driven: bool) -> Result<()> {
        if self.config.quiet_mode {
            return Ok(());
        }

        writeln!(
            self.out,
            "Monitoring {} for MAC addresses (interval: {:.2}s{})...",
            self.config.log_path.display(),
            self.config.interval.as_secs_f64(),
            if event_driven { ", file notifications on" } else { "" }
        )?;
        if let Some(store) = &self.store {
            writeln!(self.out, "Checking MACs against {}", store.path().display())?;
            if self.config.continuous {
                writeln!(self.out, "Acting once per unauthorized MAC, then continuing.")?;
            } else {
                writeln!(self.out, "Stopping after the first unauthorized MAC.")?;
            }
        }
        writeln!(self.out, "Action: {}", self.config.action)?;
        writeln!(self.out, "Press Ctrl+C to stop monitoring.")?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }

    fn mode_name(&self) -> &'static str {
        match (self.config.mode, self.config.continuous) {
            (WatchMode::Naive, _) => "naive",
            (WatchMode::Authorized, false) => "authorized",
            (WatchMode::Authorized, true) => "authorized-continuous",
        }
    }
}

fn report_command_error(error: &CommandError) {
    eprintln!("Error executing command: {}", error);
}
