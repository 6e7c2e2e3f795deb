//! Persistence contract for completed reports
//!
//! History entries outlive the sessions that produced them. The store is
//! keyed by entry id: `save` upserts (replacing an existing entry and moving
//! it to the most-recent position), `delete` is absent-ok, `list` returns
//! most-recent first. Upsert-by-id makes concurrent saves from different
//! sessions commutative without locking, since each session only writes
//! entries it owns.

mod file_store;

pub use file_store::FileHistoryStore;

use std::sync::Mutex;

use crate::models::HistoryEntry;
use crate::utils::lock_mutex_recover;

/// Result alias for store operations.
pub type HistoryResult<T> = Result<T, String>;

pub trait HistoryStore: Send + Sync {
    /// All entries, most-recent first.
    fn list(&self) -> HistoryResult<Vec<HistoryEntry>>;

    /// Upsert by id; the entry moves to the front.
    fn save(&self, entry: HistoryEntry) -> HistoryResult<()>;

    /// Remove by id. Not an error if absent.
    fn delete(&self, id: &str) -> HistoryResult<()>;
}

/// In-process store, used in tests and by embedders that manage their own
/// persistence.
#[derive(Default)]
pub struct MemoryHistoryStore {
    entries: Mutex<Vec<HistoryEntry>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn list(&self) -> HistoryResult<Vec<HistoryEntry>> {
        Ok(lock_mutex_recover(&self.entries).clone())
    }

    fn save(&self, entry: HistoryEntry) -> HistoryResult<()> {
        let mut entries = lock_mutex_recover(&self.entries);
        entries.retain(|existing| existing.id != entry.id);
        entries.insert(0, entry);
        Ok(())
    }

    fn delete(&self, id: &str) -> HistoryResult<()> {
        lock_mutex_recover(&self.entries).retain(|existing| existing.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(id: &str, title: &str) -> HistoryEntry {
        HistoryEntry {
            id: id.to_string(),
            title: title.to_string(),
            query: "query".to_string(),
            report: "report".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_save_moves_entry_to_front() {
        let store = MemoryHistoryStore::new();
        store.save(entry("a", "A")).unwrap();
        store.save(entry("b", "B")).unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed[0].id, "b");
        assert_eq!(listed[1].id, "a");
    }

    #[test]
    fn test_save_upserts_by_id() {
        let store = MemoryHistoryStore::new();
        store.save(entry("a", "A")).unwrap();
        store.save(entry("b", "B")).unwrap();
        store.save(entry("a", "A v2")).unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, "a");
        assert_eq!(listed[0].title, "A v2");
    }

    #[test]
    fn test_delete_absent_is_ok() {
        let store = MemoryHistoryStore::new();
        store.save(entry("a", "A")).unwrap();
        store.delete("missing").unwrap();
        store.delete("a").unwrap();
        assert!(store.list().unwrap().is_empty());
    }
}
