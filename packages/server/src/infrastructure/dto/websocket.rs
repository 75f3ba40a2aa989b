//! WebSocket message DTOs for the relay protocol.
//!
//! Every frame is one JSON object. Requests are tagged by `type`; server
//! messages are one of four shapes told apart by their keys (`type`, `status`,
//! `from`, `error`).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reply payload for `hello`
pub const HELLO_PAYLOAD: &str = "Hello, client!";

/// Reply payload for a request with an unrecognized `type`
pub const UNKNOWN_PAYLOAD: &str = "Unknown message type";

/// Error text for a `join` without a usable `user_id`
pub const MISSING_USER_ID: &str = "Missing user_id in join request";

/// Errors while decoding or encoding protocol messages
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The frame is not JSON at all
    #[error("Invalid message format. Must be JSON.")]
    InvalidJson(#[source] serde_json::Error),

    /// The frame is JSON but not an object
    #[error("Invalid message format. Must be a JSON object.")]
    NotAnObject,

    /// The frame has a known `type` but its fields do not fit
    #[error("Invalid message fields: {0}")]
    InvalidFields(#[source] serde_json::Error),

    /// A message could not be serialized
    #[error("Failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Peer → server requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Register an identity on this connection
    Join {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_id: Option<String>,
    },
    /// Liveness check
    Hello,
    /// Content to relay to every other member
    Broadcast {
        payload: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_id: Option<String>,
    },
    /// Graceful leave request
    Disconnect {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_id: Option<String>,
    },
    /// Any `type` the server does not recognize
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    pub fn join(user_id: impl Into<String>) -> Self {
        Self::Join {
            user_id: Some(user_id.into()),
        }
    }

    pub fn broadcast(payload: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self::Broadcast {
            payload: payload.into(),
            user_id: Some(user_id.into()),
        }
    }

    pub fn disconnect(user_id: impl Into<String>) -> Self {
        Self::Disconnect {
            user_id: Some(user_id.into()),
        }
    }

    /// Decode one text frame.
    ///
    /// An object without a string `type` decodes to [`ClientMessage::Unknown`].
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(ProtocolError::InvalidJson)?;
        if !value.is_object() {
            return Err(ProtocolError::NotAnObject);
        }
        if !value.get("type").is_some_and(serde_json::Value::is_string) {
            return Ok(Self::Unknown);
        }
        serde_json::from_value(value).map_err(ProtocolError::InvalidFields)
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }
}

/// Room events tagged by `type`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomEvent {
    UserJoined { user_id: String, message: String },
    UserLeft { user_id: String, message: String },
    Notification { payload: String },
}

/// Direct replies tagged by `status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StatusReply {
    Hello { payload: String },
    Unknown { payload: String },
}

/// Server → peer messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerMessage {
    Event(RoomEvent),
    Status(StatusReply),
    /// Relayed broadcast content
    Relay { from: String, message: String },
    Error { error: String },
}

impl ServerMessage {
    pub fn user_joined(user_id: &str) -> Self {
        Self::Event(RoomEvent::UserJoined {
            user_id: user_id.to_string(),
            message: format!("{user_id} has connected."),
        })
    }

    pub fn user_left(user_id: &str) -> Self {
        Self::Event(RoomEvent::UserLeft {
            user_id: user_id.to_string(),
            message: format!("{user_id} has disconnected."),
        })
    }

    /// Departure notice sent when a member leaves with `disconnect`
    pub fn left_chat(user_id: &str) -> Self {
        Self::Event(RoomEvent::Notification {
            payload: format!("{user_id} has left the chat"),
        })
    }

    pub fn relay(from: &str, message: &str) -> Self {
        Self::Relay {
            from: from.to_string(),
            message: message.to_string(),
        }
    }

    pub fn hello() -> Self {
        Self::Status(StatusReply::Hello {
            payload: HELLO_PAYLOAD.to_string(),
        })
    }

    pub fn unknown() -> Self {
        Self::Status(StatusReply::Unknown {
            payload: UNKNOWN_PAYLOAD.to_string(),
        })
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self::Error {
            error: error.into(),
        }
    }

    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(ProtocolError::InvalidJson)?;
        serde_json::from_value(value).map_err(ProtocolError::InvalidFields)
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }
}
