use thiserror::Error;

/// Room operation failures. All of them are answered with an empty-contents reply.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoomError {
    #[error("room {0:?} already exists")]
    RoomAlreadyExists(String),

    #[error("invalid room name {0:?}")]
    InvalidRoomName(String),

    #[error("room {0:?} not found")]
    RoomNotFound(String),

    #[error("room {0:?} already has a source")]
    RoomHasSource(String),

    #[error("room {0:?} has no source to join")]
    RoomHasNoSource(String),

    #[error("connection has not registered a role")]
    NotRegistered,

    #[error("only a source may create rooms")]
    NotSource,

    #[error("connection is already in room {0:?}")]
    AlreadyInRoom(String),

    #[error("connection closed before joining room {0:?}")]
    ConnectionClosed(String),
}
