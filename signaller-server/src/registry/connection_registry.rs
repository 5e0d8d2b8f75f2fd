use crate::registry::RegistryError;
use crate::signaling::SignalingOutput;
use axum::extract::ws::{CloseFrame, Message};
use dashmap::DashMap;
use signaller_core::{ConnectionId, Role};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Per-connection state as seen by the dispatcher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionState {
    pub role: Option<Role>,
    /// Room this connection is a member of.
    pub room: Option<String>,
    /// Rooms this connection created, in creation order.
    pub created_rooms: Vec<String>,
}

struct ConnectionEntry {
    outbound: mpsc::UnboundedSender<Message>,
    state: ConnectionState,
}

struct RegistryInner {
    connections: DashMap<ConnectionId, ConnectionEntry>,
    next_id: AtomicU64,
}

/// Every live transport session, keyed by its [`ConnectionId`].
#[derive(Clone)]
pub struct ConnectionRegistry {
    inner: Arc<RegistryInner>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                connections: DashMap::new(),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    pub fn register(&self, outbound: mpsc::UnboundedSender<Message>) -> ConnectionId {
        let id = ConnectionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner.connections.insert(
            id,
            ConnectionEntry {
                outbound,
                state: ConnectionState::default(),
            },
        );
        id
    }

    /// Role is write-once.
    pub fn set_role(&self, id: ConnectionId, role: Role) -> Result<(), RegistryError> {
        let mut entry = self
            .inner
            .connections
            .get_mut(&id)
            .ok_or(RegistryError::UnknownConnection(id))?;

        if let Some(existing) = entry.state.role {
            return Err(RegistryError::RoleAlreadySet { id, role: existing });
        }
        entry.state.role = Some(role);
        Ok(())
    }

    pub fn record_created_room(&self, id: ConnectionId, room: &str) {
        if let Some(mut entry) = self.inner.connections.get_mut(&id) {
            entry.state.created_rooms.push(room.to_owned());
        }
    }

    pub fn state(&self, id: ConnectionId) -> Option<ConnectionState> {
        self.inner
            .connections
            .get(&id)
            .map(|entry| entry.state.clone())
    }

    /// Idempotent. Returns the final state the first time.
    pub fn remove(&self, id: ConnectionId) -> Option<ConnectionState> {
        self.inner
            .connections
            .remove(&id)
            .map(|(_, entry)| entry.state)
    }

    /// Ask the writer of `id` to close the socket with `code` and `reason`.
    pub fn close(&self, id: ConnectionId, code: u16, reason: &str) {
        let Some(entry) = self.inner.connections.get(&id) else {
            return;
        };
        let frame = CloseFrame {
            code,
            reason: reason.into(),
        };
        if entry.outbound.send(Message::Close(Some(frame))).is_err() {
            debug!("Close for {} dropped, writer already gone", id);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.connections.is_empty()
    }

    pub fn count_role(&self, role: Role) -> usize {
        self.inner
            .connections
            .iter()
            .filter(|entry| entry.state.role == Some(role))
            .count()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalingOutput for ConnectionRegistry {
    fn send(&self, peer: ConnectionId, text: String) -> bool {
        let Some(entry) = self.inner.connections.get(&peer) else {
            debug!("Attempted to send to disconnected connection {}", peer);
            return false;
        };
        match entry.outbound.send(Message::Text(text.into())) {
            Ok(()) => true,
            Err(_) => {
                warn!("Failed to queue frame for {}: writer closed", peer);
                false
            }
        }
    }

    fn bind_room(&self, peer: ConnectionId, room: &str) -> bool {
        let Some(mut entry) = self.inner.connections.get_mut(&peer) else {
            debug!("Cannot bind removed connection {} to room {}", peer, room);
            return false;
        };
        entry.state.room = Some(room.to_owned());
        true
    }

    fn unbind_room(&self, peer: ConnectionId, room: &str) {
        if let Some(mut entry) = self.inner.connections.get_mut(&peer) {
            if entry.state.room.as_deref() == Some(room) {
                entry.state.room = None;
            }
        }
    }
}
