//! Out-of-band research submission
//!
//! A run is kicked off with one request/response call distinct from the
//! streaming channel. The trait is the seam for tests and embedders; the
//! default implementation POSTs to the backend's submission endpoint.

use async_trait::async_trait;

use crate::error::SessionError;
use crate::protocol::SubmissionRequest;

#[async_trait]
pub trait ResearchSubmitter: Send + Sync {
    /// Issue the submission carrying `{query, session_id}`. Called once per
    /// start, after the session's channel is open and wired.
    async fn submit(&self, query: &str, session_id: &str) -> Result<(), SessionError>;
}

/// Submits research requests over HTTP.
pub struct HttpSubmitter {
    client: reqwest::Client,
    url: String,
}

impl HttpSubmitter {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl ResearchSubmitter for HttpSubmitter {
    async fn submit(&self, query: &str, session_id: &str) -> Result<(), SessionError> {
        let body = SubmissionRequest {
            query: query.to_string(),
            session_id: session_id.to_string(),
        };

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SessionError::Submission(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SessionError::Submission(format!(
                "backend returned {}",
                response.status()
            )));
        }

        log::debug!("submission accepted for session {}", session_id);
        Ok(())
    }
}
