use crate::room::{LeaveOutcome, Room, RoomCommand, RoomError};
use crate::signaling::SignalingOutput;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use signaller_core::{ConnectionId, EnvelopeCodec, Role};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Room directory: room name to the command queue of that room's task.
#[derive(Clone)]
pub struct RoomManager {
    rooms: Arc<DashMap<String, mpsc::Sender<RoomCommand>>>,
    output: Arc<dyn SignalingOutput>,
    codec: Arc<EnvelopeCodec>,
    queue_capacity: usize,
}

impl RoomManager {
    pub fn new(
        output: Arc<dyn SignalingOutput>,
        codec: Arc<EnvelopeCodec>,
        queue_capacity: usize,
    ) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            output,
            codec,
            queue_capacity: queue_capacity.max(1),
        }
    }

    /// Spawn an empty room named `name`. The creator is not made its source.
    pub fn create(&self, name: &str) -> Result<(), RoomError> {
        if !is_valid_room_name(name) {
            return Err(RoomError::InvalidRoomName(name.to_owned()));
        }

        match self.rooms.entry(name.to_owned()) {
            Entry::Occupied(_) => Err(RoomError::RoomAlreadyExists(name.to_owned())),
            Entry::Vacant(slot) => {
                info!("Creating new room: {}", name);
                let (tx, rx) = mpsc::channel(self.queue_capacity);
                let room = Room::new(
                    name.to_owned(),
                    rx,
                    self.output.clone(),
                    self.codec.clone(),
                );
                tokio::spawn(room.run());
                slot.insert(tx);
                Ok(())
            }
        }
    }

    pub async fn join(&self, name: &str, peer: ConnectionId, role: Role) -> Result<(), RoomError> {
        let not_found = || RoomError::RoomNotFound(name.to_owned());
        let sender = self.room_sender(name).ok_or_else(not_found)?;

        let (reply, rx) = oneshot::channel();
        sender
            .send(RoomCommand::Join { peer, role, reply })
            .await
            .map_err(|_| not_found())?;
        // A dropped reply means the room shut down before handling the join.
        rx.await.map_err(|_| not_found())?
    }

    /// Current room names, sorted.
    pub fn poll(&self) -> Vec<String> {
        let mut names: Vec<String> = self.rooms.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    /// Queue a relay command, waiting for queue space.
    pub async fn send(&self, name: &str, cmd: RoomCommand) {
        let Some(sender) = self.room_sender(name) else {
            debug!("Dropping command for missing room {}", name);
            return;
        };
        if sender.send(cmd).await.is_err() {
            debug!("Dropping command for closed room {}", name);
        }
    }

    /// Queue a relay command only if the room has space right now.
    pub fn try_send(&self, name: &str, cmd: RoomCommand) {
        let Some(sender) = self.room_sender(name) else {
            return;
        };
        match sender.try_send(cmd) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Room {} queue full, dropping best-effort command", name);
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("Dropping command for closed room {}", name);
            }
        }
    }

    /// Remove `peer` from room `name`. Tears the room down when its source leaves.
    pub async fn leave(&self, name: &str, peer: ConnectionId) -> LeaveOutcome {
        let Some(sender) = self.room_sender(name) else {
            return LeaveOutcome::NotMember;
        };

        let (reply, rx) = oneshot::channel();
        if sender.send(RoomCommand::Leave { peer, reply }).await.is_err() {
            self.forget(name, &sender);
            return LeaveOutcome::NotMember;
        }
        let outcome = rx.await.unwrap_or(LeaveOutcome::NotMember);
        if outcome == LeaveOutcome::Closed {
            info!("Room {} closed after its source left", name);
            self.forget(name, &sender);
        }
        outcome
    }

    /// Close room `name` if nobody has claimed its source slot. Returns whether it closed.
    pub async fn abandon(&self, name: &str) -> bool {
        let Some(sender) = self.room_sender(name) else {
            return false;
        };

        let (reply, rx) = oneshot::channel();
        if sender.send(RoomCommand::Abandon { reply }).await.is_err() {
            self.forget(name, &sender);
            return true;
        }
        let closed = rx.await.unwrap_or(true);
        if closed {
            info!("Removed orphaned room {}", name);
            self.forget(name, &sender);
        }
        closed
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rooms.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    fn room_sender(&self, name: &str) -> Option<mpsc::Sender<RoomCommand>> {
        self.rooms.get(name).map(|entry| entry.value().clone())
    }

    /// Drop the directory entry only if it still points at the same room task.
    fn forget(&self, name: &str, sender: &mpsc::Sender<RoomCommand>) {
        self.rooms
            .remove_if(name, |_, current| current.same_channel(sender));
    }
}

/// Non-empty, and free of the separator used by poll replies.
pub fn is_valid_room_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(',')
}
