//! Wire schema for the research session protocol
//!
//! Frames are session-scoped JSON. Inbound parsing happens in two steps: a
//! frame first deserializes into [`RawFrame`] (every field optional), then
//! [`RawFrame::classify`] decides whether it is actionable. This keeps a
//! missing `session_id` or an unrecognized `type` an ignorable protocol
//! violation instead of a hard parse error.

use serde::{Deserialize, Serialize};

/// An inbound frame exactly as it appears on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFrame {
    pub session_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub item: Option<String>,
    pub message: Option<String>,
    pub is_done: Option<bool>,
    pub report: Option<String>,
}

/// A classified inbound message, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    Progress {
        item: Option<String>,
        message: Option<String>,
        is_done: bool,
    },
    ClarificationRequest {
        message: Option<String>,
    },
    Complete {
        report: String,
    },
}

/// Parse a raw text frame. Malformed JSON is a [`serde_json::Error`]; the
/// caller logs it and drops the frame.
pub fn parse_frame(raw: &str) -> Result<RawFrame, serde_json::Error> {
    serde_json::from_str(raw)
}

impl RawFrame {
    /// Classify the frame into `(session_id, message)`. An `Err` describes
    /// why the frame must be ignored; it is never fatal.
    pub fn classify(self) -> Result<(String, InboundMessage), String> {
        let session_id = match self.session_id {
            Some(id) => id,
            None => return Err("frame is missing session_id".to_string()),
        };

        let message = match self.kind.as_deref() {
            Some("progress") => InboundMessage::Progress {
                item: self.item,
                message: self.message,
                is_done: self.is_done.unwrap_or(false),
            },
            Some("clarification_request") => InboundMessage::ClarificationRequest {
                message: self.message,
            },
            Some("complete") => match self.report {
                Some(report) => InboundMessage::Complete { report },
                None => return Err("complete frame is missing report".to_string()),
            },
            Some(other) => return Err(format!("unrecognized message type '{}'", other)),
            None => return Err("frame is missing type".to_string()),
        };

        Ok((session_id, message))
    }
}

/// An outbound frame sent on the session's channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutboundFrame {
    #[serde(rename = "type")]
    pub kind: String,
    pub session_id: String,
    pub text: String,
}

impl OutboundFrame {
    pub fn clarification_response(session_id: &str, text: impl Into<String>) -> Self {
        Self {
            kind: "clarification_response".to_string(),
            session_id: session_id.to_string(),
            text: text.into(),
        }
    }
}

/// Body of the out-of-band submission request issued once per start.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmissionRequest {
    pub query: String,
    pub session_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_frame_classification() {
        let raw = parse_frame(
            r#"{"session_id":"s-1","type":"progress","item":"search","message":"Found 5 sources","is_done":true}"#,
        )
        .unwrap();

        let (session_id, message) = raw.classify().unwrap();
        assert_eq!(session_id, "s-1");
        assert_eq!(
            message,
            InboundMessage::Progress {
                item: Some("search".to_string()),
                message: Some("Found 5 sources".to_string()),
                is_done: true,
            }
        );
    }

    #[test]
    fn test_progress_defaults_is_done_to_false() {
        let raw =
            parse_frame(r#"{"session_id":"s-1","type":"progress","message":"Searching..."}"#)
                .unwrap();

        let (_, message) = raw.classify().unwrap();
        match message {
            InboundMessage::Progress { is_done, .. } => assert!(!is_done),
            other => panic!("expected progress, got {:?}", other),
        }
    }

    #[test]
    fn test_clarification_request_classification() {
        let raw = parse_frame(
            r#"{"session_id":"s-1","type":"clarification_request","message":"Which region?"}"#,
        )
        .unwrap();

        let (_, message) = raw.classify().unwrap();
        assert_eq!(
            message,
            InboundMessage::ClarificationRequest {
                message: Some("Which region?".to_string()),
            }
        );
    }

    #[test]
    fn test_complete_classification() {
        let raw =
            parse_frame(r##"{"session_id":"s-1","type":"complete","report":"# Title\nBody"}"##)
                .unwrap();

        let (_, message) = raw.classify().unwrap();
        assert_eq!(
            message,
            InboundMessage::Complete {
                report: "# Title\nBody".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_session_id_is_rejected() {
        let raw = parse_frame(r#"{"type":"progress","message":"hi"}"#).unwrap();
        assert!(raw.classify().is_err());
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let raw = parse_frame(r#"{"session_id":"s-1","type":"heartbeat"}"#).unwrap();
        let err = raw.classify().unwrap_err();
        assert!(err.contains("heartbeat"));
    }

    #[test]
    fn test_complete_without_report_is_rejected() {
        let raw = parse_frame(r#"{"session_id":"s-1","type":"complete"}"#).unwrap();
        assert!(raw.classify().is_err());
    }

    #[test]
    fn test_malformed_json_is_a_parse_error() {
        assert!(parse_frame("{not json").is_err());
    }

    #[test]
    fn test_clarification_response_serialization() {
        let frame = OutboundFrame::clarification_response("s-1", "Europe");
        let json = serde_json::to_string(&frame).unwrap();
        assert!(json.contains("\"type\":\"clarification_response\""));
        assert!(json.contains("\"session_id\":\"s-1\""));
        assert!(json.contains("\"text\":\"Europe\""));
    }

    #[test]
    fn test_submission_request_serialization() {
        let request = SubmissionRequest {
            query: "effects of caffeine".to_string(),
            session_id: "s-1".to_string(),
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"query\":\"effects of caffeine\""));
        assert!(json.contains("\"session_id\":\"s-1\""));
    }
}
