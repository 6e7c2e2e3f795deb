//! Error taxonomy for the research session protocol
//!
//! Only `InvalidInput`, `Transport` and `Submission` ever surface to callers.
//! Protocol violations and parse failures are logged and swallowed inside
//! frame dispatch so that a misbehaving peer can never crash a session.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// Locally rejected input (empty query, empty clarification response).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Peer sent something the protocol forbids (duplicate clarification
    /// request, frame for a foreign session, unknown message type).
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// Malformed inbound frame.
    #[error("failed to parse inbound frame: {0}")]
    Parse(#[from] serde_json::Error),

    /// Channel-level failure. Terminal for the session until a new start.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The out-of-band submission request failed.
    #[error("submission failed: {0}")]
    Submission(String),
}
