//! Research session lifecycle
//!
//! [`Session`] is the explicit per-run value; [`machine`] holds the pure
//! transitions over it; [`SessionController`] wires those transitions to a
//! live transport, the out-of-band submission and the history store. All
//! mutation happens inside the controller's lock, one frame at a time, so
//! transitions never interleave.

pub mod clarification;
pub mod machine;
pub mod progress;

pub use clarification::{ClarificationCoordinator, ExchangeState};
pub use machine::{Effect, CLARIFICATION_PROGRESS_KEY, STARTING_MESSAGE};
pub use progress::{ProgressItem, ProgressLedger};

use std::sync::{Arc, Mutex};

use crate::error::SessionError;
use crate::history::HistoryStore;
use crate::models::SessionStatus;
use crate::submit::{HttpSubmitter, ResearchSubmitter};
use crate::transport::TransportChannel;
use crate::utils::lock_mutex_recover;

// ============================================================================
// Session Value
// ============================================================================

/// One research request's lifecycle from submission to completion or error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Opaque stable identifier correlating all inbound frames.
    pub id: String,
    pub query: String,
    pub status: SessionStatus,
    pub progress: ProgressLedger,
    pub clarification: ClarificationCoordinator,
    /// Present only when `status` is `Complete`.
    pub report: Option<String>,
    pub title: Option<String>,
    /// History entry id of the current run, remembered so duplicate
    /// `complete` frames overwrite one entry instead of creating a second.
    pub(crate) history_entry_id: Option<String>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            query: String::new(),
            status: SessionStatus::Idle,
            progress: ProgressLedger::new(),
            clarification: ClarificationCoordinator::new(),
            report: None,
            title: None,
            history_entry_id: None,
        }
    }
}

// ============================================================================
// Endpoints
// ============================================================================

/// Where a session talks to: the streaming channel and the submission URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEndpoints {
    pub ws_url: String,
    pub submit_url: String,
}

impl SessionEndpoints {
    /// Derive both endpoints from a backend base URL, e.g.
    /// `http://localhost:8000` becomes `ws://localhost:8000/ws/{session_id}`
    /// and `http://localhost:8000/api/research`.
    pub fn for_backend(base_url: &str, session_id: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            base.to_string()
        };

        Self {
            ws_url: format!("{}/ws/{}", ws_base, session_id),
            submit_url: format!("{}/api/research", base),
        }
    }
}

// ============================================================================
// Controller
// ============================================================================

struct ControllerInner {
    session: Session,
    channel: Option<TransportChannel>,
    /// Bumped on every start; frames tagged with an older generation came in
    /// on a superseded channel and never mutate state.
    generation: u64,
}

/// Owns one session's lifecycle: opens and replaces the transport channel,
/// reduces inbound frames over the session value, executes the resulting
/// effects, and persists completed reports.
///
/// Cloning yields another handle onto the same session.
#[derive(Clone)]
pub struct SessionController {
    id: String,
    ws_url: String,
    inner: Arc<Mutex<ControllerInner>>,
    history: Arc<dyn HistoryStore>,
    submitter: Arc<dyn ResearchSubmitter>,
}

impl SessionController {
    pub fn new(
        session_id: impl Into<String>,
        ws_url: impl Into<String>,
        history: Arc<dyn HistoryStore>,
        submitter: Arc<dyn ResearchSubmitter>,
    ) -> Self {
        let id = session_id.into();
        Self {
            id: id.clone(),
            ws_url: ws_url.into(),
            inner: Arc::new(Mutex::new(ControllerInner {
                session: Session::new(id),
                channel: None,
                generation: 0,
            })),
            history,
            submitter,
        }
    }

    /// Controller wired for an HTTP backend: WebSocket streaming plus an
    /// HTTP submission endpoint, both derived from `base_url`.
    pub fn for_backend(
        session_id: impl Into<String>,
        base_url: &str,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        let id = session_id.into();
        let endpoints = SessionEndpoints::for_backend(base_url, &id);
        Self::new(
            id,
            endpoints.ws_url,
            history,
            Arc::new(HttpSubmitter::new(endpoints.submit_url)),
        )
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> SessionStatus {
        lock_mutex_recover(&self.inner).session.status
    }

    /// Current session value, for display.
    pub fn snapshot(&self) -> Session {
        lock_mutex_recover(&self.inner).session.clone()
    }

    /// Begin a new run. Returns `Ok(false)` (no-op) while the session is
    /// busy. On `Ok(true)` the channel is opened and the submission issued
    /// asynchronously; failures surface as `status = error`.
    ///
    /// A previous channel for this session is closed and discarded first;
    /// at most one channel is open per session at any time.
    pub fn start(&self, query: &str) -> Result<bool, SessionError> {
        let generation;
        let old_channel;
        {
            let mut inner = lock_mutex_recover(&self.inner);
            if !machine::begin(&mut inner.session, query)? {
                return Ok(false);
            }
            inner.generation += 1;
            generation = inner.generation;
            old_channel = inner.channel.take();
        }
        if let Some(channel) = old_channel {
            channel.close();
        }

        let controller = self.clone();
        let query = query.trim().to_string();
        tokio::spawn(async move {
            controller.connect_and_submit(query, generation).await;
        });
        Ok(true)
    }

    /// Answer the pending clarification. Returns false when nothing was
    /// sent (empty response or no open exchange).
    pub fn submit_clarification(&self, response: &str) -> bool {
        let effects = {
            let mut inner = lock_mutex_recover(&self.inner);
            let effects = machine::submit_clarification(&mut inner.session, response);
            if effects.is_empty() {
                return false;
            }
            self.execute_sends(&mut inner, effects)
        };
        self.execute_persists(effects);
        true
    }

    /// Tear down the active channel, e.g. when the owning surface closes.
    /// Leaves `status` untouched.
    pub fn cancel(&self) {
        let channel = lock_mutex_recover(&self.inner).channel.take();
        if let Some(channel) = channel {
            log::debug!("closing channel for session {}", self.id);
            channel.close();
        }
    }

    async fn connect_and_submit(&self, query: String, generation: u64) {
        let on_frame = {
            let controller = self.clone();
            move |raw: String| controller.on_frame(generation, &raw)
        };
        let on_error = {
            let controller = self.clone();
            move |detail: String| controller.on_transport_error(generation, detail)
        };

        // Frame handling is wired before the submission goes out so early
        // messages are not lost.
        let channel = match TransportChannel::open(&self.ws_url, on_frame, on_error).await {
            Ok(channel) => channel,
            Err(e) => {
                self.fail(generation, &format!("channel open failed: {}", e));
                return;
            }
        };

        {
            let mut inner = lock_mutex_recover(&self.inner);
            if inner.generation != generation {
                // A newer start superseded us while connecting.
                drop(inner);
                channel.close();
                return;
            }
            inner.channel = Some(channel);
        }

        if let Err(e) = self.submitter.submit(&query, &self.id).await {
            self.fail(generation, &e.to_string());
        }
    }

    fn on_frame(&self, generation: u64, raw: &str) {
        let persist = {
            let mut inner = lock_mutex_recover(&self.inner);
            if inner.generation != generation {
                log::debug!("frame from superseded channel ignored");
                return;
            }
            let effects = machine::handle_frame(&mut inner.session, raw);
            self.execute_sends(&mut inner, effects)
        };
        self.execute_persists(persist);
    }

    fn on_transport_error(&self, generation: u64, detail: String) {
        self.fail(generation, &detail);
    }

    /// Mark the session failed unless a newer start already superseded the
    /// failing channel/submission. No retry; recovery is a new `start`.
    fn fail(&self, generation: u64, detail: &str) {
        let channel = {
            let mut inner = lock_mutex_recover(&self.inner);
            if inner.generation != generation {
                log::debug!("stale failure ignored: {}", detail);
                return;
            }
            log::error!("session {} failed: {}", self.id, detail);
            inner.session.status = SessionStatus::Error;
            inner.channel.take()
        };
        if let Some(channel) = channel {
            channel.close();
        }
    }

    /// Run send effects while holding the lock (sends only queue on the
    /// channel); returns the entries to persist once the lock is released.
    fn execute_sends(
        &self,
        inner: &mut ControllerInner,
        effects: Vec<Effect>,
    ) -> Vec<crate::models::HistoryEntry> {
        let mut persist = Vec::new();
        for effect in effects {
            match effect {
                Effect::Send(frame) => match serde_json::to_string(&frame) {
                    Ok(json) => match &inner.channel {
                        Some(channel) => {
                            if let Err(e) = channel.send(json) {
                                log::warn!("failed to send frame: {}", e);
                            }
                        }
                        None => log::warn!("no open channel for session {}", self.id),
                    },
                    Err(e) => log::warn!("failed to serialize outbound frame: {}", e),
                },
                Effect::Persist(entry) => persist.push(entry),
            }
        }
        persist
    }

    fn execute_persists(&self, entries: Vec<crate::models::HistoryEntry>) {
        for entry in entries {
            if let Err(e) = self.history.save(entry) {
                log::error!(
                    "failed to persist history entry for session {}: {}",
                    self.id,
                    e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_for_http_backend() {
        let endpoints = SessionEndpoints::for_backend("http://localhost:8000/", "tab-1");
        assert_eq!(endpoints.ws_url, "ws://localhost:8000/ws/tab-1");
        assert_eq!(endpoints.submit_url, "http://localhost:8000/api/research");
    }

    #[test]
    fn test_endpoints_for_https_backend() {
        let endpoints = SessionEndpoints::for_backend("https://research.example.com", "tab-1");
        assert_eq!(endpoints.ws_url, "wss://research.example.com/ws/tab-1");
        assert_eq!(
            endpoints.submit_url,
            "https://research.example.com/api/research"
        );
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = Session::new("s-1");
        assert_eq!(session.status, SessionStatus::Idle);
        assert!(session.progress.is_empty());
        assert_eq!(session.report, None);
    }
}
