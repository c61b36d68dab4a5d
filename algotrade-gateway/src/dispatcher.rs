//! Inbound frame dispatcher.
//!
//! The single consumer of the transport's inbound stream. Each frame is
//! classified as either a correlated command reply (handed to the
//! correlator) or an unsolicited market update (handed to the cache).
//! Malformed or unrecognized frames are logged and dropped; nothing a
//! server sends can terminate the loop early. When the stream ends, every
//! outstanding request is failed rather than left to time out silently.

use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;

use algotrade_core::{CommandReply, ServerMessage};

use crate::cache::MarketDataCache;
use crate::correlator::Correlator;

/// Cooperative read loop over the inbound frame stream.
pub struct Dispatcher {
    frames: mpsc::Receiver<String>,
    correlator: Arc<Correlator>,
    cache: Arc<MarketDataCache>,
}

impl Dispatcher {
    pub fn new(
        frames: mpsc::Receiver<String>,
        correlator: Arc<Correlator>,
        cache: Arc<MarketDataCache>,
    ) -> Self {
        Dispatcher {
            frames,
            correlator,
            cache,
        }
    }

    /// Run until the inbound stream ends (connection loss or explicit
    /// close), then fail all outstanding requests.
    pub async fn run(mut self) {
        while let Some(frame) = self.frames.recv().await {
            self.handle_frame(&frame);
        }
        tracing::info!("Inbound stream ended, dispatcher stopping");
        self.correlator.fail_all();
    }

    fn handle_frame(&self, raw: &str) {
        match serde_json::from_str::<ServerMessage>(raw) {
            Ok(message) => match message.into_reply() {
                Ok((rid, reply)) => {
                    if !self.correlator.resolve(&rid, reply) {
                        tracing::debug!("Reply for unknown or expired request {}", rid);
                    }
                }
                Err(ServerMessage::MarketDataUpdate(update)) => {
                    // A stray user_request_id on market data never resolves
                    // a pending command.
                    self.cache.apply(update);
                }
                Err(ServerMessage::Welcome { message }) => {
                    tracing::debug!("Unexpected welcome frame mid-session: {}", message);
                }
                Err(other) => {
                    tracing::warn!("Dropping uncorrelatable frame: {:?}", other);
                }
            },
            Err(decode_err) => self.handle_unrecognized(raw, decode_err),
        }
    }

    /// Frames that fail strict decoding: a frame kind this client does not
    /// know. If it echoes a pending identifier it still resolves that
    /// command as an opaque reply, otherwise it is dropped.
    fn handle_unrecognized(&self, raw: &str, decode_err: serde_json::Error) {
        let Ok(value) = serde_json::from_str::<Value>(raw) else {
            tracing::warn!("Dropping malformed frame: {}", decode_err);
            return;
        };

        if let Some(rid) = value.get("user_request_id").and_then(Value::as_str)
            && self.correlator.resolve(rid, CommandReply::Raw(value.clone()))
        {
            tracing::debug!("Resolved request {} with unrecognized frame kind", rid);
            return;
        }

        tracing::warn!(
            "Dropping unrecognized frame kind: {}",
            value.get("type").and_then(serde_json::Value::as_str).unwrap_or("?")
        );
    }
}
