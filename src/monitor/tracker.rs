use crate::mac::MacAddress;
use std::collections::HashSet;

/// Remembers unauthorized MACs that already triggered an action, so
/// continuous watching acts once per device rather than once per log line
#[derive(Debug, Default)]
pub struct HandledTracker {
    handled: HashSet<MacAddress>,
}

impl HandledTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_handled(&self, mac: &MacAddress) -> bool {
        self.handled.contains(mac)
    }

    /// Record `mac` as handled; returns false if it already was
    pub fn mark_handled(&mut self, mac: MacAddress) -> bool {
        self.handled.insert(mac)
    }
}
