use anyhow::{Context, Result, bail};
use futures::{SinkExt, StreamExt};
use signaller_core::{Envelope, EnvelopeCodec, EnvelopeKeys, MessageType};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

/// Timeout for an expected frame (ms).
pub const RECV_TIMEOUT_MS: u64 = 2000;

/// How long a peer must stay quiet to count as "received nothing" (ms).
pub const SILENCE_MS: u64 = 200;

/// A WebSocket peer speaking the envelope protocol, standing in for a source or client app.
pub struct TestPeer {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    codec: EnvelopeCodec,
}

impl TestPeer {
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_keys(url, EnvelopeKeys::default()).await
    }

    pub async fn connect_with_keys(url: &str, keys: EnvelopeKeys) -> Result<Self> {
        let (ws, _response) = connect_async(url)
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;
        Ok(Self {
            ws,
            codec: EnvelopeCodec::new(keys),
        })
    }

    /// Connect and register with `role`.
    pub async fn registered(url: &str, role: &str) -> Result<Self> {
        let mut peer = Self::connect(url).await?;
        peer.send(MessageType::Register, role).await?;
        Ok(peer)
    }

    pub async fn send(&mut self, kind: MessageType, contents: &str) -> Result<()> {
        let text = self.codec.encode(kind, contents);
        self.send_raw(&text).await
    }

    pub async fn send_raw(&mut self, text: &str) -> Result<()> {
        self.ws
            .send(Message::text(text.to_owned()))
            .await
            .context("Failed to send frame")
    }

    /// Next envelope, skipping control frames.
    pub async fn recv(&mut self) -> Result<Envelope> {
        let text = self.recv_text().await?;
        self.codec
            .decode(&text)
            .with_context(|| format!("Undecodable frame {:?}", text))
    }

    pub async fn recv_text(&mut self) -> Result<String> {
        let deadline = Duration::from_millis(RECV_TIMEOUT_MS);
        loop {
            let next = tokio::time::timeout(deadline, self.ws.next())
                .await
                .context("Timeout waiting for a frame")?;
            match next {
                Some(Ok(Message::Text(text))) => return Ok(text.as_str().to_owned()),
                Some(Ok(Message::Close(frame))) => bail!("Connection closed: {:?}", frame),
                Some(Ok(_)) => continue,
                Some(Err(e)) => bail!("WebSocket error: {}", e),
                None => bail!("Connection ended"),
            }
        }
    }

    pub async fn expect(&mut self, kind: MessageType, contents: &str) -> Result<()> {
        let envelope = self.recv().await?;
        let expected = Envelope::new(kind, contents);
        if envelope != expected {
            bail!("Expected {:?}, got {:?}", expected, envelope);
        }
        Ok(())
    }

    /// True if no text frame arrives within [`SILENCE_MS`].
    pub async fn is_silent(&mut self) -> bool {
        let window = Duration::from_millis(SILENCE_MS);
        loop {
            match tokio::time::timeout(window, self.ws.next()).await {
                Err(_) => return true,
                Ok(Some(Ok(Message::Ping(_) | Message::Pong(_)))) => continue,
                Ok(Some(Ok(_))) => return false,
                // A dead socket delivers nothing more.
                Ok(Some(Err(_)) | None) => return true,
            }
        }
    }

    /// Wait for the server to close the socket; returns the close code and reason.
    pub async fn expect_close(&mut self) -> Result<(u16, String)> {
        let deadline = Duration::from_millis(RECV_TIMEOUT_MS);
        loop {
            let next = tokio::time::timeout(deadline, self.ws.next())
                .await
                .context("Timeout waiting for close")?;
            match next {
                Some(Ok(Message::Close(Some(frame)))) => {
                    return Ok((u16::from(frame.code), frame.reason.as_str().to_owned()));
                }
                Some(Ok(Message::Close(None))) => bail!("Closed without a close frame"),
                Some(Ok(_)) => continue,
                Some(Err(e)) => bail!("WebSocket error before close: {}", e),
                None => bail!("Connection ended without a close frame"),
            }
        }
    }

    /// Drain frames until the peer has been quiet for [`SILENCE_MS`].
    pub async fn drain(&mut self) {
        while !self.is_silent().await {}
    }

    pub async fn close(mut self) -> Result<()> {
        self.ws.close(None).await.context("Failed to close")?;
        Ok(())
    }
}
