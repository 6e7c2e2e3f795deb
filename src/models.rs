//! Core data model for research sessions and persisted reports

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Session Status
// ============================================================================

/// Top-level status of a research session.
///
/// An open clarification exchange moves the session to
/// `AwaitingClarification`; answering it returns the session to `Processing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Processing,
    AwaitingClarification,
    Complete,
    Error,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Processing => "processing",
            SessionStatus::AwaitingClarification => "awaiting_clarification",
            SessionStatus::Complete => "complete",
            SessionStatus::Error => "error",
        }
    }

    /// A busy session rejects (no-ops) new `start` calls.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            SessionStatus::Processing | SessionStatus::AwaitingClarification
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Complete | SessionStatus::Error)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "idle" => Ok(SessionStatus::Idle),
            "processing" => Ok(SessionStatus::Processing),
            "awaiting_clarification" => Ok(SessionStatus::AwaitingClarification),
            "complete" => Ok(SessionStatus::Complete),
            "error" => Ok(SessionStatus::Error),
            _ => Err(format!("invalid session status: '{}'", s)),
        }
    }
}

// ============================================================================
// History Entries
// ============================================================================

/// A persisted, completed report. Owned by the history store and independent
/// of the session that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub title: String,
    pub query: String,
    pub report: String,
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Report Titles
// ============================================================================

/// Derive a title from the first top-level markdown heading of a report.
pub fn derive_title(report: &str) -> Option<String> {
    report
        .lines()
        .find_map(|line| line.strip_prefix("# "))
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
}

/// Fallback title for reports without a heading.
pub fn synthesize_title() -> String {
    format!("Research {}", Local::now().format("%Y-%m-%d %H:%M:%S"))
}
