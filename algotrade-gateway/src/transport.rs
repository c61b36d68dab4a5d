//! WebSocket transport.
//!
//! Owns the duplex connection. Outbound frames go through a writer task fed
//! by an mpsc channel; inbound text frames are forwarded one at a time into
//! a receiver consumed solely by the dispatcher. Connection loss is not
//! retried here: it surfaces as end-of-stream on the inbound channel.

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

use algotrade_core::ServerMessage;

use crate::config::GatewayConfig;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection error: {0}")]
    Connection(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Connection closed during handshake")]
    HandshakeClosed,
    #[error("Channel closed")]
    ChannelClosed,
}

enum OutboundFrame {
    Text(String),
    Close,
}

/// WebSocket transport for one exchange session.
pub struct WsTransport {
    url: Url,
}

impl WsTransport {
    /// Build the transport from config, attaching the authentication secret
    /// as the `team_secret` query parameter.
    pub fn new(config: &GatewayConfig) -> Result<Self, TransportError> {
        let mut url = Url::parse(&config.endpoint)?;
        url.query_pairs_mut()
            .append_pair("team_secret", &config.team_secret);
        Ok(WsTransport { url })
    }

    /// Connect, consume the greeting frame, and split the socket into a
    /// sink handle and an inbound frame stream.
    ///
    /// The greeting is decoded only to log its message; the returned
    /// receiver yields every later frame as raw text and ends when the
    /// connection does.
    pub async fn connect(
        &self,
    ) -> Result<(FrameSink, mpsc::Receiver<String>, String), TransportError> {
        let (ws_stream, _) = connect_async(self.url.as_str()).await?;
        let (mut write, mut read) = ws_stream.split();

        // Handshake: first inbound frame is the greeting.
        let greeting = loop {
            match read.next().await {
                Some(Ok(Message::Text(text))) => break text.to_string(),
                Some(Ok(Message::Close(_))) | None => {
                    return Err(TransportError::HandshakeClosed);
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
            }
        };

        let welcome = match serde_json::from_str::<ServerMessage>(&greeting) {
            Ok(ServerMessage::Welcome { message }) => {
                tracing::info!("Connected to exchange: {}", message);
                message
            }
            _ => {
                tracing::warn!("Greeting frame was not a welcome message: {}", greeting);
                greeting
            }
        };

        // Writer task: drains outbound frames onto the socket.
        let (out_tx, mut out_rx) = mpsc::channel::<OutboundFrame>(32);
        tokio::spawn(async move {
            while let Some(frame) = out_rx.recv().await {
                match frame {
                    OutboundFrame::Text(json) => {
                        if let Err(e) = write.send(Message::Text(json.into())).await {
                            tracing::warn!("Failed to send frame: {}", e);
                            break;
                        }
                    }
                    OutboundFrame::Close => {
                        let _ = write.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
        });

        // Reader task: forwards inbound text frames until the stream ends.
        let (in_tx, in_rx) = mpsc::channel::<String>(1024);
        tokio::spawn(async move {
            while let Some(msg) = read.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        if in_tx.send(text.to_string()).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(Message::Ping(data)) => {
                        tracing::trace!("Received ping: {:?}", data);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!("WebSocket read error: {}", e);
                        break;
                    }
                }
            }
            // Dropping in_tx ends the inbound stream for the dispatcher.
        });

        Ok((FrameSink { tx: out_tx }, in_rx, welcome))
    }
}

/// Handle for sending serialized frames to the exchange.
#[derive(Clone)]
pub struct FrameSink {
    tx: mpsc::Sender<OutboundFrame>,
}

impl FrameSink {
    /// Queue one serialized frame for transmission.
    pub async fn send(&self, json: String) -> Result<(), TransportError> {
        self.tx
            .send(OutboundFrame::Text(json))
            .await
            .map_err(|_| TransportError::ChannelClosed)
    }

    /// Send a close frame and stop the writer. The reader sees the close
    /// handshake and ends the inbound stream.
    pub async fn close(&self) {
        let _ = self.tx.send(OutboundFrame::Close).await;
    }
}
