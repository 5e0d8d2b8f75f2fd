use signaller_core::MessageType;

use crate::integration::{client_in_room, init_tracing, source_in_room};
use crate::utils::TestServer;

#[tokio::test]
async fn test_lock_holder_disconnect_lets_next_offer_through() {
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
    alice.send(MessageType::Offer, "sdp-alice").await.expect("Send failed");
    let priming = source.recv().await.expect("No priming");
    assert_eq!(priming.kind, MessageType::Register);
    let alice_id = priming.contents;
    source.expect(MessageType::Offer, "sdp-alice").await.expect("Offer lost");

    alice.close().await.expect("Close failed");
    source
        .expect(MessageType::Shutdown, &alice_id)
        .await
        .expect("Source not told about departure");
    let notice = source.recv().await.expect("No departure notice");
    assert_eq!(notice.kind, MessageType::Plain);

    bob.send(MessageType::Offer, "sdp-bob").await.expect("Send failed");
    let priming = source.recv().await.expect("No priming");
    assert_eq!(priming.kind, MessageType::Register);
    assert_ne!(priming.contents, alice_id);
    source.expect(MessageType::Offer, "sdp-bob").await.expect("Offer lost");
}
