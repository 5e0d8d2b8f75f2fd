
use tracing::Level;

use crate::utils::{TestPeer, TestServer};
use signaller_core::MessageType;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Source that created and joined `room`.
pub async fn source_in_room(server: &TestServer, room: &str) -> anyhow::Result<TestPeer> {
    let mut source = TestPeer::registered(&server.url(), "source").await?;
    source.send(MessageType::RoomCreate, room).await?;
    source.expect(MessageType::RoomCreate, room).await?;
    source.send(MessageType::RoomJoin, room).await?;
    source.expect(MessageType::RoomJoin, room).await?;
    Ok(source)
}

/// Client joined to `room`; consumes the join notice the source receives.
pub async fn client_in_room(
    server: &TestServer,
    source: &mut TestPeer,
    room: &str,
) -> anyhow::Result<TestPeer> {
    let mut client = TestPeer::registered(&server.url(), "client").await?;
    client.send(MessageType::RoomJoin, room).await?;
    client.expect(MessageType::RoomJoin, room).await?;
    let notice = source.recv().await?;
    anyhow::ensure!(notice.kind == MessageType::Plain, "expected join notice, got {:?}", notice);
    Ok(client)
}
