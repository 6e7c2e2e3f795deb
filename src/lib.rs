//! research-console: client library for streaming research-agent sessions
//!
//! A session submits a free-text query to a research backend, follows its
//! progress over a WebSocket, answers mid-flight clarification questions,
//! and persists the final report to a history store. The protocol state
//! machine lives in [`session`]; everything else is a thin collaborator.

// Module declarations
pub mod error;
pub mod history;
pub mod models;
pub mod protocol;
pub mod session;
pub mod submit;
pub mod transport;
mod utils;

// Re-exports for the common embedding surface
pub use error::SessionError;
pub use history::{FileHistoryStore, HistoryStore, HistoryResult, MemoryHistoryStore};
pub use models::{HistoryEntry, SessionStatus};
pub use session::{
    ClarificationCoordinator, ExchangeState, ProgressItem, ProgressLedger, Session,
    SessionController, SessionEndpoints,
};
pub use submit::{HttpSubmitter, ResearchSubmitter};
pub use transport::TransportChannel;
