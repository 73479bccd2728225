//! Line-oriented reader over a file that keeps growing

use crate::models::MonitorError;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Follows a log file from the end it had when opened.
///
/// Only complete, newline-terminated lines are returned; a partially written
/// line stays buffered until the rest of it arrives. If the file shrinks
/// below the current offset (truncated in place), reading restarts at 0.
pub struct LogTail {
    path: PathBuf,
    reader: BufReader<File>,
    position: u64,
    pending: Vec<u8>,
}

impl LogTail {
    /// Open `path` and position the reader at its current end
    pub fn open(path: &Path) -> Result<Self, MonitorError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => MonitorError::LogFileNotFound(path.to_path_buf()),
            _ => MonitorError::Io {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        let mut reader = BufReader::new(file);
        let position = reader.seek(SeekFrom::End(0)).map_err(|source| MonitorError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            reader,
            position,
            pending: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte offset of the next unread byte
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Return the next complete line, or `None` if there is none yet
    pub fn next_line(&mut self) -> Result<Option<String>, MonitorError> {
        self.reset_if_truncated()?;

        let read = self
            .reader
            .read_until(b'\n', &mut self.pending)
            .map_err(|source| self.io_error(source))?;
        if read == 0 {
            return Ok(None);
        }
        self.position += read as u64;

        if !self.pending.ends_with(b"\n") {
            // Writer is mid-line; keep what we have for the next call
            return Ok(None);
        }

        let line = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        Ok(Some(line))
    }

    fn reset_if_truncated(&mut self) -> Result<(), MonitorError> {
        let len = self
            .reader
            .get_ref()
            .metadata()
            .map_err(|source| self.io_error(source))?
            .len();

        if len < self.position {
            log::warn!(
                "{} shrank from {} to {} bytes, reading from the start",
                self.path.display(),
                self.position,
                len
            );
            self.position = self
                .reader
                .seek(SeekFrom::Start(0))
                .map_err(|source| self.io_error(source))?;
            self.pending.clear();
        }
        Ok(())
    }

    fn io_error(&self, source: io::Error) -> MonitorError {
        MonitorError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
