//! File-backed history store
//!
//! The whole collection lives in a single JSON file and is written wholesale
//! on each mutation, which is acceptable at the expected cardinality of a
//! personal research history. Writes go through a temp file and rename so a
//! crash mid-write never corrupts existing history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::{HistoryResult, HistoryStore};
use crate::models::HistoryEntry;

/// Version of the history file format.
const HISTORY_FILE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct HistoryFile {
    version: u32,
    updated_at: DateTime<Utc>,
    entries: Vec<HistoryEntry>,
}

impl Default for HistoryFile {
    fn default() -> Self {
        Self {
            version: HISTORY_FILE_VERSION,
            updated_at: Utc::now(),
            entries: Vec::new(),
        }
    }
}

pub struct FileHistoryStore {
    path: PathBuf,
}

impl FileHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Platform data directory, e.g. `~/.local/share/research-console/history.json`.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("research-console")
            .join("history.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(&self) -> HistoryResult<HistoryFile> {
        if !self.path.exists() {
            return Ok(HistoryFile::default());
        }
        let content = fs::read_to_string(&self.path)
            .map_err(|e| format!("Failed to read history file {:?}: {}", self.path, e))?;
        serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse history file {:?}: {}", self.path, e))
    }

    fn write_file(&self, entries: Vec<HistoryEntry>) -> HistoryResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create directory {:?}: {}", parent, e))?;
        }

        let file = HistoryFile {
            version: HISTORY_FILE_VERSION,
            updated_at: Utc::now(),
            entries,
        };
        let content = serde_json::to_string_pretty(&file)
            .map_err(|e| format!("Failed to serialize history: {}", e))?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content)
            .map_err(|e| format!("Failed to write {:?}: {}", tmp_path, e))?;
        fs::rename(&tmp_path, &self.path)
            .map_err(|e| format!("Failed to move history file into place: {}", e))
    }
}

impl HistoryStore for FileHistoryStore {
    fn list(&self) -> HistoryResult<Vec<HistoryEntry>> {
        Ok(self.read_file()?.entries)
    }

    fn save(&self, entry: HistoryEntry) -> HistoryResult<()> {
        let mut entries = self.read_file()?.entries;
        entries.retain(|existing| existing.id != entry.id);
        entries.insert(0, entry);
        self.write_file(entries)
    }

    fn delete(&self, id: &str) -> HistoryResult<()> {
        let mut entries = self.read_file()?.entries;
        let initial_len = entries.len();
        entries.retain(|existing| existing.id != id);

        // Only write if something changed.
        if entries.len() != initial_len {
            self.write_file(entries)?;
        }
        Ok(())
    }
}
