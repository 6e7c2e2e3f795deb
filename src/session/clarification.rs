//! Clarification exchange arbitration
//!
//! A session has at most one unresolved question/answer exchange at any
//! instant. A new request while one is open is a protocol violation and is
//! rejected rather than silently overwriting the pending question.

use serde::{Deserialize, Serialize};

/// State of the current exchange. `Resolved` is terminal per exchange; a
/// later `open` starts a new one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeState {
    #[default]
    Closed,
    Open,
    Resolved,
}

impl ExchangeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeState::Closed => "closed",
            ExchangeState::Open => "open",
            ExchangeState::Resolved => "resolved",
        }
    }
}

impl std::fmt::Display for ExchangeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Arbitrates the single outstanding question/answer round-trip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClarificationCoordinator {
    state: ExchangeState,
    question: Option<String>,
    response: Option<String>,
}

impl ClarificationCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ExchangeState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ExchangeState::Open
    }

    /// The pending (or last) question.
    pub fn question(&self) -> Option<&str> {
        self.question.as_deref()
    }

    /// The answer of the resolved exchange, if any.
    pub fn response(&self) -> Option<&str> {
        self.response.as_deref()
    }

    /// Open a new exchange. Returns false (and leaves the pending question
    /// untouched) when one is already open.
    pub fn open(&mut self, question: impl Into<String>) -> bool {
        if self.state == ExchangeState::Open {
            log::warn!("clarification request while one is unresolved, ignoring");
            return false;
        }
        self.question = Some(question.into());
        self.response = None;
        self.state = ExchangeState::Open;
        true
    }

    /// Record the user's answer. Returns the trimmed response when accepted;
    /// `None` when the response trims empty or no exchange is open.
    pub fn submit(&mut self, response: &str) -> Option<String> {
        let text = response.trim();
        if text.is_empty() || self.state != ExchangeState::Open {
            return None;
        }
        let text = text.to_string();
        self.response = Some(text.clone());
        self.state = ExchangeState::Resolved;
        Some(text)
    }

    /// Discard any exchange state, e.g. when a new query supersedes the
    /// session's current run.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
