use crate::codec::CodecError;
use std::fmt;
use std::str::FromStr;

/// Closed vocabulary of envelope types.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum MessageType {
    Register,
    RoomCreate,
    RoomPoll,
    RoomJoin,
    Plain,
    Offer,
    Answer,
    IceCandidate,
    CursorUpdate,
    Shutdown,
}

impl MessageType {
    pub const ALL: [MessageType; 10] = [
        MessageType::Register,
        MessageType::RoomCreate,
        MessageType::RoomPoll,
        MessageType::RoomJoin,
        MessageType::Plain,
        MessageType::Offer,
        MessageType::Answer,
        MessageType::IceCandidate,
        MessageType::CursorUpdate,
        MessageType::Shutdown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Register => "Register",
            MessageType::RoomCreate => "RoomCreate",
            MessageType::RoomPoll => "RoomPoll",
            MessageType::RoomJoin => "RoomJoin",
            MessageType::Plain => "Plain",
            MessageType::Offer => "Offer",
            MessageType::Answer => "Answer",
            MessageType::IceCandidate => "IceCandidate",
            MessageType::CursorUpdate => "CursorUpdate",
            MessageType::Shutdown => "Shutdown",
        }
    }
}

impl FromStr for MessageType {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MessageType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CodecError::UnknownType(s.to_owned()))
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `{type, contents}` unit carried by every frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub kind: MessageType,
    pub contents: String,
}

impl Envelope {
    pub fn new(kind: MessageType, contents: impl Into<String>) -> Self {
        Self {
            kind,
            contents: contents.into(),
        }
    }

    /// Empty contents: the failure sentinel for the room message family.
    pub fn empty(kind: MessageType) -> Self {
        Self::new(kind, String::new())
    }
}
