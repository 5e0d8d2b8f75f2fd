use signaller_core::{ConnectionId, Role};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("connection {0} is not registered")]
    UnknownConnection(ConnectionId),

    #[error("connection {id} already registered as {role}")]
    RoleAlreadySet { id: ConnectionId, role: Role },
}
