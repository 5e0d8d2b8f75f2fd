use signaller_core::MessageType;

use crate::integration::{client_in_room, init_tracing, source_in_room};
use crate::utils::TestServer;

fn candidate(port: u16) -> String {
    format!(
        r#"{{"candidate":"candidate:1 1 udp 2122260223 10.0.0.2 {} typ host","sdpMid":"0","sdpMLineIndex":0}}"#,
        port
    )
}

#[tokio::test]
async fn test_candidates_trickle_after_lock_release() {
    init_tracing();
    let server = TestServer::start().await.expect("Failed to start server");
    let mut source = source_in_room(&server, "room1").await.expect("Source setup failed");
    let mut client = client_in_room(&server, &mut source, "room1")
        .await
        .expect("Client setup failed");

    client.send(MessageType::Offer, "sdp-offer").await.expect("Send failed");
    source.recv().await.expect("No priming message");
    source.expect(MessageType::Offer, "sdp-offer").await.expect("Offer not relayed");
    source.send(MessageType::Answer, "sdp-answer").await.expect("Send failed");
    client.expect(MessageType::Answer, "sdp-answer").await.expect("Answer not relayed");

    // The first source candidate releases the lock; the rest must still arrive.
    for port in 50000..50003 {
        source
            .send(MessageType::IceCandidate, &candidate(port))
            .await
            .expect("Send failed");
    }
    for port in 50000..50003 {
        client
            .expect(MessageType::IceCandidate, &candidate(port))
            .await
            .expect("Source candidate not relayed");
    }

    for port in 60000..60002 {
        client
            .send(MessageType::IceCandidate, &candidate(port))
            .await
            .expect("Send failed");
    }
    for port in 60000..60002 {
        source
            .expect(MessageType::IceCandidate, &candidate(port))
            .await
            .expect("Client candidate not relayed");
    }
}
