//! Wait strategy between unsuccessful reads
//!
//! On Linux an inotify watch on the log file wakes the loop as soon as the
//! file is modified; the poll interval still bounds every wait, so the loop
//! keeps working if the watch cannot be set up or misses an event (for
//! example on network filesystems). Elsewhere the waker simply sleeps for the
//! poll interval, so new lines are seen with a latency of at most one
//! interval while the process stays idle in between.

use std::path::Path;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

/// Blocks the monitoring loop until the log may have new data
pub struct Waker {
    interval: Duration,
    events: Option<Receiver<()>>,
}

impl Waker {
    /// Create a waker for `path`, falling back to plain polling when file
    /// notifications are unavailable
    pub fn new(path: &Path, interval: Duration) -> Self {
        let events = match watch_file(path) {
            Ok(events) => events,
            Err(e) => {
                log::debug!(
                    "File notifications unavailable for {}: {}; polling every {:?}",
                    path.display(),
                    e,
                    interval
                );
                None
            }
        };

        Self { interval, events }
    }

    /// A waker that never uses file notifications
    pub fn polling(interval: Duration) -> Self {
        Self {
            interval,
            events: None,
        }
    }

    /// Whether file notifications are active
    pub fn is_event_driven(&self) -> bool {
        self.events.is_some()
    }

    /// Wait until the file changes or the poll interval elapses
    pub fn wait(&mut self) {
        let received = match &self.events {
            Some(events) => {
                let received = events.recv_timeout(self.interval);
                if received.is_ok() {
                    // Coalesce bursts of modifications into one wake-up
                    while events.try_recv().is_ok() {}
                }
                received
            }
            None => {
                thread::sleep(self.interval);
                return;
            }
        };

        if let Err(RecvTimeoutError::Disconnected) = received {
            log::debug!("File notification thread ended; falling back to polling");
            self.events = None;
            thread::sleep(self.interval);
        }
    }
}

#[cfg(target_os = "linux")]
fn watch_file(path: &Path) -> std::io::Result<Option<Receiver<()>>> {
    use inotify::{Inotify, WatchMask};
    use std::sync::mpsc::{self, TrySendError};

    let mut inotify = Inotify::init()?;
    inotify
        .watches()
        .add(path, WatchMask::MODIFY | WatchMask::ATTRIB)?;

    let (tx, rx) = mpsc::sync_channel(1);
    thread::Builder::new()
        .name("radmac-inotify".to_string())
        .spawn(move || {
            let mut buffer = [0u8; 1024];
            loop {
                let events = match inotify.read_events_blocking(&mut buffer) {
                    Ok(events) => events,
                    Err(_) => break,
                };
                if events.count() == 0 {
                    continue;
                }
                match tx.try_send(()) {
                    Ok(()) | Err(TrySendError::Full(())) => {}
                    Err(TrySendError::Disconnected(())) => break,
                }
            }
        })?;

    Ok(Some(rx))
}

#[cfg(not(target_os = "linux"))]
fn watch_file(_path: &Path) -> std::io::Result<Option<Receiver<()>>> {
    Ok(None)
}
