// src/core/history.rs

//! # History Navigation
//!
//! Up/Down traversal of the persisted command log. The first navigation keystroke after the
//! user typed captures the buffer as a search prefix; repeated presses keep that prefix until
//! the user edits the line again.

/// Read access to the command log. Indices are 1-based.
pub trait HistoryLog {
    fn len(&self) -> usize;
    fn fetch(&self, index: usize) -> Option<String>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl HistoryLog for Vec<String> {
    fn len(&self) -> usize {
        <[String]>::len(self)
    }

    fn fetch(&self, index: usize) -> Option<String> {
        index.checked_sub(1).and_then(|i| self.get(i)).cloned()
    }
}

/// The history cursor of one edit session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryNavigator {
    /// Starts one past the newest entry so the first Up lands on it.
    index: usize,
    search_prefix: Option<String>,
}

impl HistoryNavigator {
    /// A navigator sitting past the newest of `history_len` entries.
    pub fn new(history_len: usize) -> Self {
        Self {
            index: history_len + 1,
            search_prefix: None,
        }
    }

    /// The 1-based entry currently shown; `len + 1` means the live line.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The text Up/Down entries must start with, once a search is active.
    pub fn search_prefix(&self) -> Option<&str> {
        self.search_prefix.as_deref()
    }

    /// Forgets the captured prefix; the next navigation captures a fresh one.
    pub fn clear_prefix(&mut self) {
        self.search_prefix = None;
    }

    fn capture_prefix(&mut self, buffer: &str) -> String {
        self.search_prefix
            .get_or_insert_with(|| buffer.to_string())
            .clone()
    }

    /// Steps back to the newest matching entry at or before `index - 1`.
    ///
    /// Returns `None`, and leaves the position unchanged, when nothing matches.
    pub fn up(&mut self, log: &dyn HistoryLog, buffer: &str) -> Option<String> {
        let prefix = self.capture_prefix(buffer);
        let len = log.len();
        if len == 0 {
            return None;
        }
        let start = self.index.saturating_sub(1).clamp(1, len);
        let found = (1..=start)
            .rev()
            .find_map(|i| log.fetch(i).filter(|e| e.starts_with(&prefix)).map(|e| (i, e)))?;
        self.index = found.0;
        log::trace!("History up: index {} for prefix '{}'", self.index, prefix);
        Some(found.1)
    }

    /// Steps forward to the nearest matching entry at or after `index + 1`.
    pub fn down(&mut self, log: &dyn HistoryLog, buffer: &str) -> Option<String> {
        let prefix = self.capture_prefix(buffer);
        let len = log.len();
        if len == 0 {
            return None;
        }
        let start = (self.index + 1).clamp(1, len);
        let found = (start..=len)
            .find_map(|i| log.fetch(i).filter(|e| e.starts_with(&prefix)).map(|e| (i, e)))?;
        self.index = found.0;
        log::trace!("History down: index {} for prefix '{}'", self.index, prefix);
        Some(found.1)
    }
}
