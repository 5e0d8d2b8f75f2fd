use crate::room::RoomError;
use signaller_core::{ConnectionId, Role};
use tokio::sync::oneshot;

/// Commands a room actor receives from connection tasks.
///
/// Relay variants carry the sender's frame verbatim so it can be forwarded unmodified.
#[derive(Debug)]
pub enum RoomCommand {
    Join {
        peer: ConnectionId,
        role: Role,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Chat text: source to every client, client to the source.
    Plain { sender: ConnectionId, frame: String },

    /// Presentation-only; delivered to the other clients, never the source.
    CursorUpdate { sender: ConnectionId, frame: String },

    /// SDP offer from a client, subject to the negotiation lock.
    Offer { sender: ConnectionId, frame: String },

    /// SDP answer from the source to the client holding the lock.
    Answer { sender: ConnectionId, frame: String },

    IceCandidate { sender: ConnectionId, frame: String },

    /// The peer's transport closed.
    Leave {
        peer: ConnectionId,
        reply: oneshot::Sender<LeaveOutcome>,
    },

    /// The creator went away without joining; close unless a source has claimed the room.
    Abandon { reply: oneshot::Sender<bool> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The room lives on.
    Remained,
    /// The source left and the room shut down.
    Closed,
    NotMember,
}
