//! Terminal rendering of server messages.

use hiroba_server::infrastructure::dto::websocket::{RoomEvent, ServerMessage, StatusReply};

/// One display line for a server message.
pub fn render(message: &ServerMessage) -> String {
    match message {
        ServerMessage::Event(RoomEvent::UserJoined { message, .. })
        | ServerMessage::Event(RoomEvent::UserLeft { message, .. }) => {
            format!("[SYSTEM] {message}")
        }
        ServerMessage::Event(RoomEvent::Notification { payload }) => {
            format!("[NOTIFICATION] {payload}")
        }
        ServerMessage::Status(StatusReply::Hello { payload }) => format!("[SERVER] {payload}"),
        ServerMessage::Status(StatusReply::Unknown { payload }) => format!("[SERVER] {payload}"),
        ServerMessage::Relay { from, message } => format!("[{from}] {message}"),
        ServerMessage::Error { error } => format!("[ERROR] {error}"),
    }
}
