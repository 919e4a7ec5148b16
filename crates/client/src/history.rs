//! Navigation history.
//!
//! A bounded, append-and-trim ring of the last visits, backing the "back to
//! previous module" and "back to previous search" affordances. Entries are
//! never mutated after creation; the buffer only appends and drops from the
//! front.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of retained entries.
pub const HISTORY_CAPACITY: usize = 10;

/// Which surface a visit belonged to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViewContext {
    /// Authoring console.
    Admin,
    /// Learner-facing viewer.
    Learner,
}

/// One recorded visit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    /// Path that was visited.
    pub path: String,
    /// Module open at the time, when the view had one.
    pub module: Option<String>,
    /// When the visit happened.
    pub timestamp: DateTime<Utc>,
    /// Surface the visit belonged to, when known.
    pub context: Option<ViewContext>,
    /// Serialized search state, when the view was a search.
    pub search: Option<String>,
}

impl HistoryEntry {
    /// Create an entry for `path`, stamped now, with no module, context, or
    /// search state.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            module: None,
            timestamp: Utc::now(),
            context: None,
            search: None,
        }
    }
}

/// Bounded ring of recent visits, newest at the back.
#[derive(Debug, Default)]
pub struct NavigationHistory {
    entries: VecDeque<HistoryEntry>,
}

impl NavigationHistory {
    /// Create an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a visit, dropping the oldest entry beyond capacity.
    pub fn push(&mut self, entry: HistoryEntry) {
        if self.entries.len() == HISTORY_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// The most recent visit.
    #[must_use]
    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    /// The most recent visit before the current one that had a module open.
    #[must_use]
    pub fn previous_module(&self) -> Option<&HistoryEntry> {
        self.entries
            .iter()
            .rev()
            .skip(1)
            .find(|entry| entry.module.is_some())
    }

    /// The most recent visit before the current one that carried search
    /// state.
    #[must_use]
    pub fn previous_search(&self) -> Option<&HistoryEntry> {
        self.entries
            .iter()
            .rev()
            .skip(1)
            .find(|entry| entry.search.is_some())
    }

    /// Iterate entries oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Number of retained entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the history is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn entry(path: &str) -> HistoryEntry {
        HistoryEntry::new(path)
    }

    fn module_entry(path: &str, module: &str) -> HistoryEntry {
        HistoryEntry {
            module: Some(module.to_string()),
            ..HistoryEntry::new(path)
        }
    }

    #[test]
    fn test_push_and_last() {
        let mut history = NavigationHistory::new();
        assert!(history.is_empty());
        assert!(history.last().is_none());

        history.push(entry("/modules"));
        history.push(entry("/learner-dashboard"));

        assert_eq!(history.len(), 2);
        assert_eq!(history.last().unwrap().path, "/learner-dashboard");
    }

    #[test]
    fn test_capacity_trims_oldest() {
        let mut history = NavigationHistory::new();
        for i in 0..15 {
            history.push(entry(&format!("/page-{i}")));
        }

        assert_eq!(history.len(), HISTORY_CAPACITY);
        // The oldest surviving entry is the fifth push.
        assert_eq!(history.iter().next().unwrap().path, "/page-5");
        assert_eq!(history.last().unwrap().path, "/page-14");
    }

    #[test]
    fn test_previous_module_skips_current_visit() {
        let mut history = NavigationHistory::new();
        history.push(module_entry("/modules/rust-basics", "rust-basics"));
        history.push(entry("/learner-dashboard"));
        history.push(module_entry("/modules/async-rust", "async-rust"));

        // The newest entry is the current view; "previous" looks behind it.
        let previous = history.previous_module().unwrap();
        assert_eq!(previous.module.as_deref(), Some("rust-basics"));
    }

    #[test]
    fn test_previous_module_none_without_older_module() {
        let mut history = NavigationHistory::new();
        history.push(entry("/"));
        history.push(module_entry("/modules/rust-basics", "rust-basics"));

        assert!(history.previous_module().is_none());
    }

    #[test]
    fn test_previous_search() {
        let mut history = NavigationHistory::new();
        history.push(HistoryEntry {
            search: Some("q=ownership".to_string()),
            ..HistoryEntry::new("/search")
        });
        history.push(entry("/modules/rust-basics"));

        let previous = history.previous_search().unwrap();
        assert_eq!(previous.search.as_deref(), Some("q=ownership"));
    }

    #[test]
    fn test_clear() {
        let mut history = NavigationHistory::new();
        history.push(entry("/"));
        history.clear();
        assert!(history.is_empty());
    }
}
