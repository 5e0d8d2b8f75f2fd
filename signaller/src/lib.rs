pub use signaller_core::{ConnectionId, Envelope, MessageType, Role};

pub mod model {
    pub use signaller_core::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use signaller_server::*;
}
