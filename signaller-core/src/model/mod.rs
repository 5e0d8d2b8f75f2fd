mod connection;
mod envelope;
mod role;

pub use connection::ConnectionId;
pub use envelope::{Envelope, MessageType};
pub use role::{Role, RoleError};
