//! MAC address validation and normalization
//!
//! Accepts the common notations operators paste from switches, controllers and
//! device labels, and reduces them to the canonical form used in the
//! FreeRADIUS users file: 12 lowercase hex characters, no separators.
//!
//! Also provides the narrower scanner used on log lines, which only recognizes
//! colon or dash separated octets.

use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Accepted whole-string notations, in the order they are tried
const NOTATION_PATTERNS: &[&str] = &[
    r"^([a-fA-F0-9]{2}[:-]){5}[a-fA-F0-9]{2}$", // AA:BB:CC:DD:EE:FF or AA-BB-CC-DD-EE-FF
    r"^([a-fA-F0-9]{2}_){5}[a-fA-F0-9]{2}$",    // AA_BB_CC_DD_EE_FF
    r"^[a-fA-F0-9]{12}$",                       // AABBCCDDEEFF
    r"^([a-fA-F0-9]{4}\.){2}[a-fA-F0-9]{4}$",   // aabb.ccdd.eeff
];

/// Unanchored pattern used to find a MAC inside a log line
const LOG_LINE_PATTERN: &str = r"([0-9A-Fa-f]{2}[:-]){5}[0-9A-Fa-f]{2}";

/// Human readable list of accepted notations, for error output
pub const SUPPORTED_FORMATS: &str =
    "AA:BB:CC:DD:EE:FF, AA-BB-CC-DD-EE-FF, AA_BB_CC_DD_EE_FF, AABBCCDDEEFF, aabb.ccdd.eeff";

fn notation_regexes() -> &'static [Regex] {
    static REGEXES: OnceLock<Vec<Regex>> = OnceLock::new();
    REGEXES.get_or_init(|| {
        NOTATION_PATTERNS
            .iter()
            .map(|pattern| Regex::new(pattern).expect("notation pattern is valid"))
            .collect()
    })
}

fn log_line_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(LOG_LINE_PATTERN).expect("log line pattern is valid"))
}

/// Errors produced while parsing a MAC address
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MacFormatError {
    #[error("Invalid MAC address format: {0}")]
    InvalidFormat(String),
}

/// A MAC address in canonical form (12 lowercase hex characters).
///
/// The only way to build one is through [`normalize`] (or `FromStr`), so a
/// `MacAddress` value is always canonical.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddress(String);

impl MacAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MacAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for MacAddress {
    type Err = MacFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize(s)
    }
}

impl Serialize for MacAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// A MAC address found in a log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacMatch {
    /// Text exactly as it appeared in the line
    pub raw: String,
    /// Canonical form of `raw`
    pub mac: MacAddress,
}

/// Check whether the input matches one of the accepted notations
pub fn is_valid_notation(input: &str) -> bool {
    notation_regexes().iter().any(|re| re.is_match(input))
}

/// Validate and normalize a MAC address to its canonical form
pub fn normalize(input: &str) -> Result<MacAddress, MacFormatError> {
    if !is_valid_notation(input) {
        return Err(MacFormatError::InvalidFormat(input.to_string()));
    }

    let canonical: String = input
        .chars()
        .filter(|c| c.is_ascii_hexdigit())
        .map(|c| c.to_ascii_lowercase())
        .collect();

    Ok(MacAddress(canonical))
}

/// Find the first colon- or dash-separated MAC address in a log line
pub fn find_in_line(line: &str) -> Option<MacMatch> {
    let found = log_line_regex().find(line)?;
    let raw = found.as_str().to_string();
    // The log pattern is a subset of the first accepted notation
    let mac = normalize(&raw).ok()?;
    Some(MacMatch { raw, mac })
}
