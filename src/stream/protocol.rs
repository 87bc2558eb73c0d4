//! Stream wire messages

use serde::{Deserialize, Serialize};

use crate::models::FrameResponse;
use crate::session::SessionSnapshot;

/// Client -> server
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Frame { frame: String },
    Ping,
    EndSession,
}

impl ClientMessage {
    /// Parse a text message. Unknown or malformed messages are rejected.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }
}

/// Server -> client control messages
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    Pong,
    SessionEnded {
        session_stats: SessionSnapshot,
        saved_to_database: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorMessage {
    pub status: &'static str,
    pub error: String,
}

impl ErrorMessage {
    pub fn new(error: impl ToString) -> Self {
        Self {
            status: "error",
            error: error.to_string(),
        }
    }
}

/// Server -> client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ServerMessage {
    Frame(FrameResponse),
    Control(ControlMessage),
    Error(ErrorMessage),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("binary messages are not supported")]
    Binary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_client_messages() {
        assert_eq!(ClientMessage::parse(r#"{"type":"ping"}"#).unwrap(), ClientMessage::Ping);
        assert_eq!(
            ClientMessage::parse(r#"{"type":"end_session"}"#).unwrap(),
            ClientMessage::EndSession
        );
        assert_eq!(
            ClientMessage::parse(r#"{"type":"frame","frame":"abc"}"#).unwrap(),
            ClientMessage::Frame { frame: "abc".to_string() }
        );
    }

    #[test]
    fn test_unknown_messages_fail_closed() {
        for text in [
            r#"{"type":"reset"}"#,
            r#"{"frame":"abc"}"#,
            r#"{"type":"frame"}"#,
            "ping",
        ] {
            assert!(matches!(ClientMessage::parse(text), Err(ProtocolError::Malformed(_))), "{}", text);
        }
    }

    #[test]
    fn test_server_message_shapes() {
        let pong = serde_json::to_value(ServerMessage::Control(ControlMessage::Pong)).unwrap();
        assert_eq!(pong, serde_json::json!({"type": "pong"}));

        let err = serde_json::to_value(ServerMessage::Error(ErrorMessage::new("nope"))).unwrap();
        assert_eq!(err, serde_json::json!({"status": "error", "error": "nope"}));
    }
}
