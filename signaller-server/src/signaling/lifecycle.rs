use crate::room::LeaveOutcome;
use crate::signaling::SignalingService;
use signaller_core::ConnectionId;
use tracing::{debug, info};

impl SignalingService {
    /// Transport for `id` closed: leave its room and reclaim rooms it created but never joined.
    pub async fn disconnect(&self, id: ConnectionId) {
        let Some(state) = self.registry().remove(id) else {
            debug!("Connection {} already removed", id);
            return;
        };

        let role = state.role.map_or("unregistered", |role| role.as_str());
        info!("Closed connection {} {}", role, id);

        if let Some(room) = &state.room {
            match self.rooms().leave(room, id).await {
                LeaveOutcome::Closed => info!("{} was a source connection, room {} closed", id, room),
                LeaveOutcome::Remained => debug!("{} left room {}", id, room),
                LeaveOutcome::NotMember => debug!("Room {} no longer held {}", room, id),
            }
        }

        for created in &state.created_rooms {
            if state.room.as_deref() == Some(created.as_str()) {
                continue;
            }
            self.rooms().abandon(created).await;
        }
    }
}
