//! Registry abstraction owned by the domain layer.
//!
//! The use case layer depends on this trait, not on the in-memory implementation.

use async_trait::async_trait;

use super::{ConnectionHandle, ConnectionId, Mailbox, Participant, Timestamp, UserId};

/// One fan-out target taken from a registry snapshot.
#[derive(Debug, Clone)]
pub struct Recipient {
    pub user_id: UserId,
    pub mailbox: Mailbox,
}

/// Live mapping from identity to connection handle.
///
/// Every method is atomic with respect to the others; none of them writes to a
/// socket.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// Bind `handle` to `user_id`.
    ///
    /// Returns the handle previously bound to `user_id`, if any. From the moment
    /// this returns, snapshots only ever contain the new handle.
    async fn insert(
        &self,
        user_id: UserId,
        handle: ConnectionHandle,
        connected_at: Timestamp,
    ) -> Option<ConnectionHandle>;

    /// Remove `user_id` if, and only if, it is bound to `connection_id`.
    async fn remove(&self, user_id: &UserId, connection_id: ConnectionId) -> Option<Participant>;

    /// Connection currently bound to `user_id`.
    async fn lookup(&self, user_id: &UserId) -> Option<ConnectionId>;

    /// All members, ordered by join time and then identity.
    async fn snapshot(&self) -> Vec<Participant>;

    /// Mailboxes of every member except `exclude`, in snapshot order.
    async fn recipients(&self, exclude: &UserId) -> Vec<Recipient>;

    /// Number of registered members.
    async fn count(&self) -> usize;
}
