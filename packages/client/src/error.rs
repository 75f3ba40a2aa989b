//! Client error definitions.

use hiroba_server::{domain::ValueObjectError, infrastructure::dto::websocket::ProtocolError};
use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Errors that end or prevent a client session
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connecting / handshaking with the server failed
    #[error("Error connecting to WebSocket server: {0}")]
    Connect(#[source] tungstenite::Error),

    /// Writing a frame to the server failed
    #[error("Error sending message: {0}")]
    Send(#[source] tungstenite::Error),

    /// A request could not be encoded
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The user id given on the command line is not usable
    #[error("Invalid user id: {0}")]
    InvalidUserId(#[from] ValueObjectError),
}
