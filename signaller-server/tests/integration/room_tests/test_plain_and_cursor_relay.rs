use signaller_core::MessageType;

use crate::integration::{client_in_room, init_tracing, source_in_room};
use crate::utils::TestServer;

#[tokio::test]
async fn test_plain_routing_between_source_and_clients() {
    init_tracing();
    let server = TestServer::start().await.expect("Failed to start server");
    let mut source = source_in_room(&server, "room1").await.expect("Source setup failed");
    let mut alice = client_in_room(&server, &mut source, "room1")
        .await
        .expect("Client setup failed");
    let mut bob = client_in_room(&server, &mut source, "room1")
        .await
        .expect("Client setup failed");
    alice.drain().await;

    source.send(MessageType::Plain, "welcome").await.expect("Send failed");
    alice.expect(MessageType::Plain, "welcome").await.expect("Alice missed chat");
    bob.expect(MessageType::Plain, "welcome").await.expect("Bob missed chat");

    alice.send(MessageType::Plain, "thanks").await.expect("Send failed");
    source.expect(MessageType::Plain, "thanks").await.expect("Source missed chat");
    assert!(bob.is_silent().await, "Client chat goes to the source only");
}

#[tokio::test]
async fn test_cursor_updates_skip_source() {
    init_tracing();
    let server = TestServer::start().await.expect("Failed to start server");
    let mut source = source_in_room(&server, "room1").await.expect("Source setup failed");
    let mut alice = client_in_room(&server, &mut source, "room1")
        .await
        .expect("Client setup failed");
    let mut bob = client_in_room(&server, &mut source, "room1")
        .await
        .expect("Client setup failed");
    alice.drain().await;

    let cursor = r#"{"x":0.125,"y":0.75}"#;
    alice.send(MessageType::CursorUpdate, cursor).await.expect("Send failed");
    bob.expect(MessageType::CursorUpdate, cursor).await.expect("Bob missed cursor");
    assert!(source.is_silent().await);
    assert!(alice.is_silent().await);
}
