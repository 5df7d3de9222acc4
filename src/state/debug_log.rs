/// Capped log of recent API interactions
///
/// Feeds the collapsible debug panel. Entries are timestamped on insert
/// and the newest entry is always first; the ring drops the oldest entry
/// past the cap so a long session cannot grow without bound.
use std::collections::VecDeque;

use chrono::Local;

/// How many entries the panel keeps
const MAX_ENTRIES: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Local wall-clock time, HH:MM:SS
    pub at: String,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct DebugLog {
    entries: VecDeque<LogEntry>,
}

impl DebugLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event, newest first
    pub fn push(&mut self, text: impl Into<String>) {
        self.push_at(Local::now().format("%H:%M:%S").to_string(), text.into());
    }

    fn push_at(&mut self, at: String, text: String) {
        self.entries.push_front(LogEntry { at, text });
        self.entries.truncate(MAX_ENTRIES);
    }

    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_entry_comes_first() {
        let mut log = DebugLog::new();
        log.push("first");
        log.push("second");

        let texts: Vec<&str> = log.entries().map(|entry| entry.text.as_str()).collect();
        assert_eq!(texts, vec!["second", "first"]);
    }

    #[test]
    fn test_cap_drops_oldest() {
        let mut log = DebugLog::new();
        for i in 0..150 {
            log.push(format!("event {i}"));
        }

        assert_eq!(log.len(), MAX_ENTRIES);
        assert_eq!(log.entries().next().unwrap().text, "event 149");
        assert_eq!(log.entries().last().unwrap().text, "event 50");
    }
}
