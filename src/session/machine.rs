//! Pure state transitions for the session protocol
//!
//! Every inbound frame and user action is reduced over the [`Session`]
//! value, returning the side effects to execute (send a frame, persist a
//! history entry). The controller owns execution; nothing here touches a
//! socket or the filesystem, which keeps the whole protocol unit-testable.

use chrono::Utc;
use uuid::Uuid;

use crate::error::SessionError;
use crate::models::{derive_title, synthesize_title, HistoryEntry, SessionStatus};
use crate::protocol::{self, InboundMessage, OutboundFrame};
use crate::session::progress::{ProgressItem, ProgressLedger};
use crate::session::Session;

/// Synthetic first ledger entry for a fresh run.
pub const STARTING_MESSAGE: &str = "Starting research...";

/// Ledger key for meta-progress about the clarification exchange. Frames
/// tagged with this `item` describe the exchange itself and collapse onto a
/// single line instead of flowing into the general ledger.
pub const CLARIFICATION_PROGRESS_KEY: &str = "clarification";

/// Side effects produced by a transition, executed by the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Send a frame on the session's channel.
    Send(OutboundFrame),
    /// Persist a completed report.
    Persist(HistoryEntry),
}

// ============================================================================
// User Actions
// ============================================================================

/// Begin a new run. `Ok(false)` means the session is busy and the call is a
/// no-op; `Ok(true)` means the session value is reset and the caller must
/// open a fresh channel and issue the submission.
pub fn begin(session: &mut Session, query: &str) -> Result<bool, SessionError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(SessionError::InvalidInput(
            "query must not be empty".to_string(),
        ));
    }
    if session.status.is_busy() {
        log::debug!(
            "start ignored for session {}: already {}",
            session.id,
            session.status
        );
        return Ok(false);
    }

    session.query = query.to_string();
    session.status = SessionStatus::Processing;
    session.progress = ProgressLedger::starting_with(STARTING_MESSAGE);
    session.report = None;
    session.title = None;
    session.clarification.reset();
    // A new run produces a new history entry on completion.
    session.history_entry_id = None;
    Ok(true)
}

/// Answer the pending clarification. A no-op (empty effect list) when the
/// response trims empty or no exchange is open.
pub fn submit_clarification(session: &mut Session, response: &str) -> Vec<Effect> {
    let text = match session.clarification.submit(response) {
        Some(text) => text,
        None => {
            log::debug!(
                "clarification response ignored for session {}: no open exchange or empty text",
                session.id
            );
            return Vec::new();
        }
    };

    session
        .progress
        .upsert_or_append(ProgressItem::unkeyed(format!("Your response: {}", text), true));
    if session.status == SessionStatus::AwaitingClarification {
        session.status = SessionStatus::Processing;
    }

    vec![Effect::Send(OutboundFrame::clarification_response(
        &session.id,
        text,
    ))]
}

// ============================================================================
// Inbound Dispatch
// ============================================================================

/// Parse and dispatch one raw text frame. Malformed frames, frames for
/// foreign sessions and protocol violations are logged and dropped; they
/// never mutate state and never fail the session.
pub fn handle_frame(session: &mut Session, raw: &str) -> Vec<Effect> {
    let frame = match protocol::parse_frame(raw) {
        Ok(frame) => frame,
        Err(e) => {
            log::warn!("dropping malformed frame: {}", e);
            return Vec::new();
        }
    };

    let (session_id, message) = match frame.classify() {
        Ok(classified) => classified,
        Err(violation) => {
            log::warn!("dropping frame: {}", violation);
            return Vec::new();
        }
    };

    if session_id != session.id {
        log::warn!(
            "dropping frame for foreign session {} (this session is {})",
            session_id,
            session.id
        );
        return Vec::new();
    }

    handle_inbound(session, message)
}

/// Dispatch a classified message.
pub fn handle_inbound(session: &mut Session, message: InboundMessage) -> Vec<Effect> {
    match message {
        InboundMessage::Progress {
            item,
            message,
            is_done,
        } => {
            handle_progress(session, item, message, is_done);
            Vec::new()
        }
        InboundMessage::ClarificationRequest { message } => {
            handle_clarification_request(session, message);
            Vec::new()
        }
        InboundMessage::Complete { report } => handle_complete(session, report),
    }
}

fn handle_progress(
    session: &mut Session,
    item: Option<String>,
    message: Option<String>,
    is_done: bool,
) {
    let message = match message {
        Some(message) => message,
        None => {
            log::debug!("progress frame without message ignored");
            return;
        }
    };

    if item.as_deref() == Some(CLARIFICATION_PROGRESS_KEY) {
        // Meta-progress about the exchange: one keyed line, never a second
        // exchange. A done frame here marks the round-trip as acknowledged
        // by the backend.
        session.progress.upsert_or_append(ProgressItem::keyed(
            CLARIFICATION_PROGRESS_KEY,
            message,
            is_done,
        ));
        return;
    }

    let entry = match item {
        Some(key) => ProgressItem::keyed(key, message, is_done),
        None => ProgressItem::unkeyed(message, is_done),
    };
    session.progress.upsert_or_append(entry);
}

fn handle_clarification_request(session: &mut Session, message: Option<String>) {
    if !session.status.is_busy() {
        log::warn!(
            "clarification request for {} session {} ignored",
            session.status,
            session.id
        );
        return;
    }

    let question =
        message.unwrap_or_else(|| "Can you provide more information?".to_string());
    if !session.clarification.open(question) {
        // Duplicate request while one is unresolved; the pending question
        // stays as-is.
        return;
    }

    session.progress.upsert_or_append(ProgressItem::unkeyed(
        "Agent is asking for clarification...",
        false,
    ));
    session.status = SessionStatus::AwaitingClarification;
}

fn handle_complete(session: &mut Session, report: String) -> Vec<Effect> {
    session.status = SessionStatus::Complete;
    session.report = Some(report.clone());

    let title = derive_title(&report).unwrap_or_else(synthesize_title);
    session.title = Some(title.clone());

    // Reuse the entry id across duplicate complete frames so the store
    // overwrites instead of growing a second entry.
    let entry_id = session
        .history_entry_id
        .get_or_insert_with(|| Uuid::new_v4().to_string())
        .clone();

    vec![Effect::Persist(HistoryEntry {
        id: entry_id,
        title,
        query: session.query.clone(),
        report,
        timestamp: Utc::now(),
    })]
}
