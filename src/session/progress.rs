//! Ordered, partially-keyed progress ledger
//!
//! The backend streams status lines in arbitrary interleavings; lines that
//! carry a stable `key` describe one evolving activity (latest write wins,
//! position preserved from first insertion), anonymous lines are always
//! appended as new entries.

use serde::{Deserialize, Serialize};

/// A single status line describing research activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressItem {
    pub message: String,
    pub done: bool,
    pub key: Option<String>,
}

impl ProgressItem {
    pub fn keyed(key: impl Into<String>, message: impl Into<String>, done: bool) -> Self {
        Self {
            message: message.into(),
            done,
            key: Some(key.into()),
        }
    }

    pub fn unkeyed(message: impl Into<String>, done: bool) -> Self {
        Self {
            message: message.into(),
            done,
            key: None,
        }
    }
}

/// The session's progress view. Pure data structure, no error conditions.
///
/// Invariant: at most one entry per non-null key at any time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressLedger {
    items: Vec<ProgressItem>,
}

impl ProgressLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// A ledger holding a single synthetic entry, used when a session starts.
    pub fn starting_with(message: impl Into<String>) -> Self {
        Self {
            items: vec![ProgressItem::unkeyed(message, false)],
        }
    }

    /// Keyed items replace the existing entry for their key in place;
    /// everything else is appended.
    pub fn upsert_or_append(&mut self, item: ProgressItem) {
        if let Some(key) = item.key.as_deref() {
            if let Some(existing) = self
                .items
                .iter_mut()
                .find(|entry| entry.key.as_deref() == Some(key))
            {
                existing.message = item.message;
                existing.done = item.done;
                return;
            }
        }
        self.items.push(item);
    }

    /// Ordered view of the ledger for display.
    pub fn iter(&self) -> impl Iterator<Item = &ProgressItem> {
        self.items.iter()
    }

    pub fn items(&self) -> &[ProgressItem] {
        &self.items
    }

    pub fn get(&self, key: &str) -> Option<&ProgressItem> {
        self.items
            .iter()
            .find(|entry| entry.key.as_deref() == Some(key))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unkeyed_items_append_in_arrival_order() {
        let mut ledger = ProgressLedger::new();
        ledger.upsert_or_append(ProgressItem::unkeyed("first", false));
        ledger.upsert_or_append(ProgressItem::unkeyed("second", true));
        ledger.upsert_or_append(ProgressItem::unkeyed("first", false));

        let messages: Vec<&str> = ledger.iter().map(|i| i.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second", "first"]);
    }

    #[test]
    fn test_keyed_upsert_replaces_in_place() {
        let mut ledger = ProgressLedger::new();
        ledger.upsert_or_append(ProgressItem::unkeyed("before", false));
        ledger.upsert_or_append(ProgressItem::keyed("search", "Found 5 sources", false));
        ledger.upsert_or_append(ProgressItem::unkeyed("after", false));
        ledger.upsert_or_append(ProgressItem::keyed("search", "Found 8 sources", true));

        assert_eq!(ledger.len(), 3);
        let entry = ledger.get("search").unwrap();
        assert_eq!(entry.message, "Found 8 sources");
        assert!(entry.done);
        // Position preserved from first insertion.
        assert_eq!(ledger.items()[1].key.as_deref(), Some("search"));
    }

    #[test]
    fn test_keyed_entry_reflects_only_last_write() {
        let mut ledger = ProgressLedger::new();
        for (message, done) in [("one", false), ("two", true), ("three", false)] {
            ledger.upsert_or_append(ProgressItem::keyed("writing", message, done));
        }

        assert_eq!(ledger.len(), 1);
        let entry = ledger.get("writing").unwrap();
        assert_eq!(entry.message, "three");
        assert!(!entry.done);
    }

    #[test]
    fn test_keyed_and_unkeyed_never_merge() {
        let mut ledger = ProgressLedger::new();
        ledger.upsert_or_append(ProgressItem::unkeyed("search", false));
        ledger.upsert_or_append(ProgressItem::keyed("search", "keyed line", false));

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.items()[0].key, None);
        assert_eq!(ledger.items()[1].key.as_deref(), Some("search"));
    }

    #[test]
    fn test_starting_with() {
        let ledger = ProgressLedger::starting_with("Starting research...");
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.items()[0].message, "Starting research...");
        assert!(!ledger.items()[0].done);
        assert_eq!(ledger.items()[0].key, None);
    }
}
