//! Core domain models for the relay.

use serde::Serialize;

use super::value_object::{ConnectionId, Timestamp, UserId};

/// A registered member of the room, as seen from outside the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Participant {
    /// Identity the connection joined with
    pub user_id: UserId,
    /// Connection currently bound to the identity
    pub connection_id: ConnectionId,
    /// Timestamp when the identity was registered on this connection
    pub connected_at: Timestamp,
}

impl Participant {
    pub fn new(user_id: UserId, connection_id: ConnectionId, connected_at: Timestamp) -> Self {
        Self {
            user_id,
            connection_id,
            connected_at,
        }
    }
}
