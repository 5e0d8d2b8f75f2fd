use signaller_core::ConnectionId;

/// Everything a room needs from the outside world to reach its members.
///
/// Implemented by the connection registry; tests substitute a recording mock.
pub trait SignalingOutput: Send + Sync {
    /// Queue a text frame for `peer`. Returns `false` if the peer is gone or closing.
    fn send(&self, peer: ConnectionId, text: String) -> bool;

    /// Record that `peer` is now a member of `room`. Returns `false` if the peer is already gone.
    fn bind_room(&self, peer: ConnectionId, room: &str) -> bool;

    /// Forget `peer`'s membership of `room`, if it is still recorded.
    fn unbind_room(&self, peer: ConnectionId, room: &str);
}
