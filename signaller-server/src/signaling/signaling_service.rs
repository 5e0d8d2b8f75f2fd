use crate::config::ServerConfig;
use crate::registry::ConnectionRegistry;
use crate::room::{RoomCommand, RoomError, RoomManager};
use crate::signaling::SignalingOutput;
use axum::extract::ws::Message;
use signaller_core::{ConnectionId, Envelope, EnvelopeCodec, MessageType, Role};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Close code sent when registration is refused.
pub const CLOSE_PROTOCOL_VIOLATION: u16 = 4000;
pub const CLOSE_PROTOCOL_VIOLATION_REASON: &str = "ServerFullError";

/// Reply to frames that fail to decode or carry an unknown type.
pub const INVALID_MESSAGE: &str = "Invalid message type.";

struct SignalingInner {
    registry: ConnectionRegistry,
    rooms: RoomManager,
    codec: Arc<EnvelopeCodec>,
}

/// Owns the connection registry and room directory; cloned into every socket task.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new(config: &ServerConfig) -> Self {
        let registry = ConnectionRegistry::new();
        let codec = Arc::new(EnvelopeCodec::new(config.envelope.clone()));
        let rooms = RoomManager::new(
            Arc::new(registry.clone()),
            codec.clone(),
            config.room_queue_capacity,
        );

        Self {
            inner: Arc::new(SignalingInner {
                registry,
                rooms,
                codec,
            }),
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.inner.registry
    }

    pub fn rooms(&self) -> &RoomManager {
        &self.inner.rooms
    }

    pub fn codec(&self) -> &EnvelopeCodec {
        &self.inner.codec
    }

    /// Accept a new transport whose writer drains `outbound`.
    pub fn connect(&self, outbound: mpsc::UnboundedSender<Message>) -> ConnectionId {
        let id = self.inner.registry.register(outbound);
        info!("Opened connection {}", id);
        id
    }

    /// Interpret one inbound text frame from `id`.
    pub async fn dispatch(&self, id: ConnectionId, text: &str) {
        let envelope = match self.inner.codec.decode(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("Rejected frame from {}: {}", id, e);
                self.reply(id, MessageType::Plain, INVALID_MESSAGE);
                return;
            }
        };

        debug!("{} from {}", envelope.kind, id);
        let Envelope { kind, contents } = envelope;

        match kind {
            MessageType::Register => self.register(id, &contents),
            MessageType::RoomCreate => self.create_room(id, &contents),
            MessageType::RoomPoll => self.poll_rooms(id),
            MessageType::RoomJoin => self.join_room(id, &contents).await,
            MessageType::Plain => {
                self.relay(id, |sender, frame| RoomCommand::Plain { sender, frame }, text)
                    .await
            }
            MessageType::Offer => {
                self.relay(id, |sender, frame| RoomCommand::Offer { sender, frame }, text)
                    .await
            }
            MessageType::Answer => {
                self.relay(id, |sender, frame| RoomCommand::Answer { sender, frame }, text)
                    .await
            }
            MessageType::IceCandidate => {
                self.relay(
                    id,
                    |sender, frame| RoomCommand::IceCandidate { sender, frame },
                    text,
                )
                .await
            }
            MessageType::CursorUpdate => {
                if let Some(room) = self.joined_room(id) {
                    let cmd = RoomCommand::CursorUpdate {
                        sender: id,
                        frame: text.to_owned(),
                    };
                    self.inner.rooms.try_send(&room, cmd);
                }
            }
            MessageType::Shutdown => {
                debug!("Ignoring peer-originated Shutdown from {}", id);
            }
        }
    }

    /// Reply for a frame that is not valid UTF-8.
    pub fn reject_binary(&self, id: ConnectionId) {
        warn!("Rejected non UTF-8 frame from {}", id);
        self.reply(id, MessageType::Plain, INVALID_MESSAGE);
    }

    fn register(&self, id: ConnectionId, contents: &str) {
        let result = contents
            .parse::<Role>()
            .map_err(|e| e.to_string())
            .and_then(|role| {
                self.inner
                    .registry
                    .set_role(id, role)
                    .map(|()| role)
                    .map_err(|e| e.to_string())
            });

        match result {
            Ok(role) => info!("Registered connection {} as {}", id, role),
            Err(reason) => {
                info!("Rejected connection {}: {}", id, reason);
                self.inner.registry.close(
                    id,
                    CLOSE_PROTOCOL_VIOLATION,
                    CLOSE_PROTOCOL_VIOLATION_REASON,
                );
            }
        }
    }

    fn create_room(&self, id: ConnectionId, name: &str) {
        let result = self.try_create_room(id, name);
        match &result {
            Ok(()) => self.inner.registry.record_created_room(id, name),
            Err(e) => info!("RoomCreate from {} failed: {}", id, e),
        }
        let contents = if result.is_ok() { name } else { "" };
        self.reply(id, MessageType::RoomCreate, contents);
    }

    fn try_create_room(&self, id: ConnectionId, name: &str) -> Result<(), RoomError> {
        let state = self.inner.registry.state(id).unwrap_or_default();
        if state.role != Some(Role::Source) {
            return Err(RoomError::NotSource);
        }
        self.inner.rooms.create(name)
    }

    fn poll_rooms(&self, id: ConnectionId) {
        let names = self.inner.rooms.poll().join(",");
        self.reply(id, MessageType::RoomPoll, &names);
    }

    async fn join_room(&self, id: ConnectionId, name: &str) {
        let result = self.try_join_room(id, name).await;
        if let Err(e) = &result {
            info!("RoomJoin from {} failed: {}", id, e);
        }
        let contents = if result.is_ok() { name } else { "" };
        self.reply(id, MessageType::RoomJoin, contents);
    }

    async fn try_join_room(&self, id: ConnectionId, name: &str) -> Result<(), RoomError> {
        let state = self.inner.registry.state(id).unwrap_or_default();
        let role = state.role.ok_or(RoomError::NotRegistered)?;
        if let Some(current) = state.room {
            return Err(RoomError::AlreadyInRoom(current));
        }
        self.inner.rooms.join(name, id, role).await
    }

    async fn relay<F>(&self, id: ConnectionId, command: F, text: &str)
    where
        F: FnOnce(ConnectionId, String) -> RoomCommand,
    {
        let Some(room) = self.joined_room(id) else {
            debug!("Ignoring relay from {} outside any room", id);
            return;
        };
        self.inner
            .rooms
            .send(&room, command(id, text.to_owned()))
            .await;
    }

    fn joined_room(&self, id: ConnectionId) -> Option<String> {
        self.inner.registry.state(id).and_then(|state| state.room)
    }

    fn reply(&self, id: ConnectionId, kind: MessageType, contents: &str) {
        let text = self.inner.codec.encode(kind, contents);
        self.inner.registry.send(id, text);
    }
}
