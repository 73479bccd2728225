//! Authorization store backed by a FreeRADIUS `users` file
//!
//! The file is plain text with one credential line per device:
//!
//! ```text
//! aabbccddeeff Cleartext-Password := "aabbccddeeff"
//! ```
//!
//! New records are prepended so they take precedence over `DEFAULT` entries
//! further down. Lookups parse each line and compare the leading MAC field,
//! so a MAC that merely occurs inside another line does not count as enrolled.
//!
//! There is no locking and no atomic replace: the store assumes a single
//! operator running one command at a time.

use crate::constants::BACKUP_SUFFIX;
use crate::mac::{self, MacAddress};
use log::{debug, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Errors raised by store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("Failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("Could not create backup {path}: {source}")]
    Backup { path: PathBuf, source: io::Error },
}

/// One credential line of the users file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRecord {
    pub mac: MacAddress,
}

impl AuthorizationRecord {
    pub fn new(mac: MacAddress) -> Self {
        Self { mac }
    }

    /// Render the record as it is written to the users file (no newline)
    pub fn to_line(&self) -> String {
        format!("{} Cleartext-Password := \"{}\"", self.mac, self.mac)
    }

    /// Parse the MAC field of a users file line.
    ///
    /// Returns `None` for blank lines, comments, indented attribute lines and
    /// entries whose name is not a MAC address (`DEFAULT`, user names).
    pub fn parse_line(line: &str) -> Option<Self> {
        if line.starts_with(char::is_whitespace) {
            return None;
        }
        let name = line.split_whitespace().next()?;
        if name.starts_with('#') {
            return None;
        }
        let name = name.trim_matches('"');
        mac::normalize(name).ok().map(Self::new)
    }
}

/// Result of a successful prepend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendOutcome {
    /// The line that was written
    pub line: String,
    /// Backup location, when a backup was made
    pub backup: Option<PathBuf>,
    /// Whether the users file existed before the write
    pub created: bool,
}

/// Result of looking a MAC up in the users file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Present,
    Absent,
    FileMissing,
    /// The file exists but could not be read
    Unreadable(String),
}

/// Accessor for the flat authorization file
#[derive(Debug, Clone)]
pub struct AuthorizationStore {
    path: PathBuf,
}

impl AuthorizationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path the backup copy is written to
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(BACKUP_SUFFIX);
        PathBuf::from(name)
    }

    fn read_content(&self) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// All MAC records in file order
    pub fn records(&self) -> Result<Vec<MacAddress>, StoreError> {
        let content = self.read_content()?.unwrap_or_default();
        Ok(content
            .lines()
            .filter_map(AuthorizationRecord::parse_line)
            .map(|record| record.mac)
            .collect())
    }

    /// Whether the users file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Look `mac` up, telling a missing file apart from a missing record
    pub fn lookup(&self, mac: &MacAddress) -> Lookup {
        match self.read_content() {
            Ok(Some(content)) => {
                let found = content
                    .lines()
                    .filter_map(AuthorizationRecord::parse_line)
                    .any(|record| &record.mac == mac);
                if found {
                    Lookup::Present
                } else {
                    Lookup::Absent
                }
            }
            Ok(None) => Lookup::FileMissing,
            Err(e) => Lookup::Unreadable(e.to_string()),
        }
    }

    /// Check whether `mac` has a record in the store.
    ///
    /// A missing or unreadable file counts as "not present" and is logged as
    /// a warning.
    pub fn contains(&self, mac: &MacAddress) -> bool {
        match self.lookup(mac) {
            Lookup::Present => true,
            Lookup::Absent => false,
            Lookup::FileMissing => {
                warn!(
                    "Users file {} not found; treating {} as not present",
                    self.path.display(),
                    mac
                );
                false
            }
            Lookup::Unreadable(reason) => {
                warn!("{}", reason);
                false
            }
        }
    }

    /// Raw substring search over the whole file.
    ///
    /// Over-broad by nature (matches inside attributes, comments and longer
    /// hex strings); only used to warn the operator about stray occurrences.
    pub fn contains_substring(&self, needle: &str) -> bool {
        match self.read_content() {
            Ok(Some(content)) => content.contains(needle),
            Ok(None) => {
                warn!("Users file {} not found", self.path.display());
                false
            }
            Err(e) => {
                warn!("{}", e);
                false
            }
        }
    }

    /// Copy the users file to its backup location.
    ///
    /// Returns `Ok(None)` when there is nothing to back up.
    pub fn backup(&self) -> Result<Option<PathBuf>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let backup = self.backup_path();
        fs::copy(&self.path, &backup).map_err(|source| StoreError::Backup {
            path: backup.clone(),
            source,
        })?;
        debug!("Backup created: {}", backup.display());
        Ok(Some(backup))
    }

    /// Write a record for `mac` at the top of the file.
    ///
    /// A backup is attempted first; failure to back up is logged and does not
    /// stop the write. Existing content is preserved below the new record.
    pub fn prepend(&self, mac: &MacAddress) -> Result<AppendOutcome, StoreError> {
        let backup = match self.backup() {
            Ok(backup) => backup,
            Err(e) => {
                warn!("{}", e);
                None
            }
        };

        let existing = self.read_content()?;
        let created = existing.is_none();
        let existing = existing.unwrap_or_default();

        let line = AuthorizationRecord::new(mac.clone()).to_line();
        let mut content = String::with_capacity(line.len() + existing.len() + 2);
        content.push_str(&line);
        content.push('\n');
        if !existing.is_empty() && !existing.starts_with('\n') {
            content.push('\n');
        }
        content.push_str(&existing);

        fs::write(&self.path, content).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;

        Ok(AppendOutcome { line, backup, created })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn mac(s: &str) -> MacAddress {
        mac::normalize(s).unwrap()
    }

    #[test]
    fn test_record_line_format() {
        let record = AuthorizationRecord::new(mac("AA:BB:CC:DD:EE:FF"));
        assert_eq!(
            record.to_line(),
            "aabbccddeeff Cleartext-Password := \"aabbccddeeff\""
        );
    }

    #[test]
    fn test_parse_line_variants() {
        assert_eq!(
            AuthorizationRecord::parse_line("aabbccddeeff Cleartext-Password := \"aabbccddeeff\""),
            Some(AuthorizationRecord::new(mac("aabbccddeeff")))
        );
        assert_eq!(
            AuthorizationRecord::parse_line("\"AA-BB-CC-DD-EE-FF\" Auth-Type := Accept"),
            Some(AuthorizationRecord::new(mac("aabbccddeeff")))
        );
        assert!(AuthorizationRecord::parse_line("").is_none());
        assert!(AuthorizationRecord::parse_line("# aabbccddeeff").is_none());
        assert!(AuthorizationRecord::parse_line("#aabbccddeeff old entry").is_none());
        assert!(AuthorizationRecord::parse_line("\tReply-Message = \"aabbccddeeff\"").is_none());
        assert!(AuthorizationRecord::parse_line("DEFAULT Auth-Type := Reject").is_none());
        assert!(AuthorizationRecord::parse_line("bob Cleartext-Password := \"hello\"").is_none());
    }

    #[test]
    fn test_prepend_to_missing_file_creates_exactly_one_record() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("users");
        let store = AuthorizationStore::new(&path);

        let outcome = store.prepend(&mac("aa:bb:cc:dd:ee:ff")).unwrap();

        assert!(outcome.created);
        assert!(outcome.backup.is_none());
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "aabbccddeeff Cleartext-Password := \"aabbccddeeff\"\n"
        );
    }

    #[test]
    fn test_prepend_preserves_existing_lines_below_new_record() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("users");
        let original = "112233445566 Cleartext-Password := \"112233445566\"\nDEFAULT Auth-Type := Reject\n";
        fs::write(&path, original).unwrap();
        let store = AuthorizationStore::new(&path);

        let outcome = store.prepend(&mac("aabbccddeeff")).unwrap();
        assert!(!outcome.created);

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("aabbccddeeff Cleartext-Password := \"aabbccddeeff\"")
        );
        assert!(content.ends_with(original));
        assert_eq!(
            store.records().unwrap(),
            vec![mac("aabbccddeeff"), mac("112233445566")]
        );
    }

    #[test]
    fn test_prepend_does_not_add_blank_line_when_content_starts_with_newline() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("users");
        fs::write(&path, "\nDEFAULT Auth-Type := Reject\n").unwrap();

        AuthorizationStore::new(&path).prepend(&mac("aabbccddeeff")).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "aabbccddeeff Cleartext-Password := \"aabbccddeeff\"\n\nDEFAULT Auth-Type := Reject\n"
        );
    }

    #[test]
    fn test_prepend_writes_backup_of_previous_content() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("users");
        fs::write(&path, "DEFAULT Auth-Type := Reject\n").unwrap();
        let store = AuthorizationStore::new(&path);

        let outcome = store.prepend(&mac("aabbccddeeff")).unwrap();

        let backup = outcome.backup.unwrap();
        assert_eq!(backup, temp.path().join("users.backup"));
        assert_eq!(fs::read_to_string(backup).unwrap(), "DEFAULT Auth-Type := Reject\n");
    }

    #[test]
    fn test_contains_matches_records_only() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("users");
        fs::write(
            &path,
            "aabbccddeeff Cleartext-Password := \"aabbccddeeff\"\n\
             bob Cleartext-Password := \"0011223344556677\"\n\
             # deadbeef0001 revoked\n",
        )
        .unwrap();
        let store = AuthorizationStore::new(&path);

        assert!(store.contains(&mac("aabbccddeeff")));
        assert!(store.contains(&mac("AA:BB:CC:DD:EE:FF")));
        // Present in the text, but not as a record
        assert!(!store.contains(&mac("001122334455")));
        assert!(!store.contains(&mac("deadbeef0001")));
        assert_eq!(store.lookup(&mac("aabbccddeeff")), Lookup::Present);
        assert_eq!(store.lookup(&mac("deadbeef0001")), Lookup::Absent);
    }

    #[test]
    fn test_substring_check_is_over_broad() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("users");
        fs::write(&path, "aabbccddeeff Cleartext-Password := \"aabbccddeeff\"\n").unwrap();
        let store = AuthorizationStore::new(&path);

        // A partial value is "contained" as text even though it is no record
        assert!(store.contains_substring("aabbccddee"));
        assert!(store.contains_substring("aabbccddeeff"));
        assert!(!store.contains_substring("deadbeef0001"));
    }

    #[test]
    fn test_missing_file_contains_nothing() {
        let temp = TempDir::new().unwrap();
        let store = AuthorizationStore::new(temp.path().join("absent"));

        assert!(!store.exists());
        assert_eq!(store.lookup(&mac("aabbccddeeff")), Lookup::FileMissing);
        assert!(!store.contains(&mac("aabbccddeeff")));
        assert!(!store.contains_substring("aabbccddeeff"));
        assert!(store.records().unwrap().is_empty());
        assert!(store.backup().unwrap().is_none());
    }

    #[test]
    fn test_unreadable_path_contains_nothing() {
        let temp = TempDir::new().unwrap();
        // A directory cannot be read as a file
        let store = AuthorizationStore::new(temp.path());

        assert!(store.records().is_err());
        assert!(matches!(store.lookup(&mac("aabbccddeeff")), Lookup::Unreadable(_)));
        assert!(!store.contains(&mac("aabbccddeeff")));
    }

    #[test]
    fn test_backup_path_appends_suffix() {
        let store = AuthorizationStore::new("/etc/freeradius/3.0/users");
        assert_eq!(store.backup_path(), PathBuf::from("/etc/freeradius/3.0/users.backup"));
    }
}
