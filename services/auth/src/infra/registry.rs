//! Per-user WebSocket connection registry.
//!
//! One live socket per user: registering a new connection replaces the old
//! entry. Socket tasks hold the receiving half of the channel and forward
//! queued events to the client.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Events pushed to a user's open socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    SessionStarted {
        user_id: Uuid,
        #[serde(serialize_with = "skypipe_core::serde::to_rfc3339_ms")]
        at: DateTime<Utc>,
    },
}

/// Sending half of one open socket.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub id: Uuid,
    sender: mpsc::UnboundedSender<String>,
}

impl ConnectionHandle {
    /// New handle plus the receiver the socket task drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                id: Uuid::new_v4(),
                sender,
            },
            receiver,
        )
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    connections: Arc<DashMap<Uuid, ConnectionHandle>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handle this one replaced, if any.
    pub fn register(&self, user_id: Uuid, handle: ConnectionHandle) -> Option<ConnectionHandle> {
        self.connections.insert(user_id, handle)
    }

    pub fn lookup(&self, user_id: Uuid) -> Option<ConnectionHandle> {
        self.connections.get(&user_id).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, user_id: Uuid) -> Option<ConnectionHandle> {
        self.connections.remove(&user_id).map(|(_, handle)| handle)
    }

    /// Remove the entry only if it still belongs to `connection_id`.
    pub fn remove_connection(&self, user_id: Uuid, connection_id: Uuid) -> bool {
        self.connections
            .remove_if(&user_id, |_, handle| handle.id == connection_id)
            .is_some()
    }

    /// Queue `event` for the user's socket. `false` when there is no live socket.
    pub fn send(&self, user_id: Uuid, event: &ServerEvent) -> bool {
        let Some(handle) = self.lookup(user_id) else {
            return false;
        };
        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, %user_id, "failed to encode server event");
                return false;
            }
        };
        handle.sender.send(payload).is_ok()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
