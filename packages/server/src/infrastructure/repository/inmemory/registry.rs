//! In-memory connection registry.
//!
//! A `HashMap` behind a `tokio::sync::Mutex`. Every trait method takes the lock
//! once, so insert/remove/snapshot never interleave. Nothing here writes to a
//! socket; fan-out happens on the mailboxes returned by `recipients`.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ConnectionHandle, ConnectionId, ConnectionRegistry, Participant, Recipient, Timestamp, UserId,
};

struct Entry {
    handle: ConnectionHandle,
    connected_at: Timestamp,
}

/// In-memory registry, created empty at server start and kept for the process lifetime.
#[derive(Default)]
pub struct InMemoryConnectionRegistry {
    entries: Mutex<HashMap<UserId, Entry>>,
}

impl InMemoryConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

fn join_order(entries: &HashMap<UserId, Entry>) -> Vec<(&UserId, &Entry)> {
    let mut ordered: Vec<_> = entries.iter().collect();
    ordered.sort_by(|(a_id, a), (b_id, b)| {
        a.connected_at
            .cmp(&b.connected_at)
            .then_with(|| a_id.cmp(b_id))
    });
    ordered
}

#[async_trait]
impl ConnectionRegistry for InMemoryConnectionRegistry {
    async fn insert(
        &self,
        user_id: UserId,
        handle: ConnectionHandle,
        connected_at: Timestamp,
    ) -> Option<ConnectionHandle> {
        let mut entries = self.entries.lock().await;
        entries
            .insert(
                user_id,
                Entry {
                    handle,
                    connected_at,
                },
            )
            .map(|previous| previous.handle)
    }

    async fn remove(&self, user_id: &UserId, connection_id: ConnectionId) -> Option<Participant> {
        let mut entries = self.entries.lock().await;
        if entries.get(user_id)?.handle.id() != connection_id {
            return None;
        }
        entries.remove(user_id).map(|entry| {
            Participant::new(user_id.clone(), entry.handle.id(), entry.connected_at)
        })
    }

    async fn lookup(&self, user_id: &UserId) -> Option<ConnectionId> {
        let entries = self.entries.lock().await;
        entries.get(user_id).map(|entry| entry.handle.id())
    }

    async fn snapshot(&self) -> Vec<Participant> {
        let entries = self.entries.lock().await;
        join_order(&entries)
            .into_iter()
            .map(|(user_id, entry)| {
                Participant::new(user_id.clone(), entry.handle.id(), entry.connected_at)
            })
            .collect()
    }

    async fn recipients(&self, exclude: &UserId) -> Vec<Recipient> {
        let entries = self.entries.lock().await;
        join_order(&entries)
            .into_iter()
            .filter(|(user_id, _)| *user_id != exclude)
            .map(|(user_id, entry)| Recipient {
                user_id: user_id.clone(),
                mailbox: entry.handle.mailbox().clone(),
            })
            .collect()
    }

    async fn count(&self) -> usize {
        let entries = self.entries.lock().await;
        entries.len()
    }
}
