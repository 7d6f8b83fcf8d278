//! Background stream exchanges
//!
//! Each send becomes one trigger call on a tokio task. The response body is
//! forwarded chunk by chunk over the app's update channel.

use std::sync::Arc;

use futures::StreamExt;
use serde_json::json;
use ssepack_core::trigger::byte_stream;
use ssepack_core::{HttpTransport, Method, QueryParams, StreamTrigger, TriggerIntent};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Response headers arrived
    Opened { status: u16 },
    Chunk(String),
    Finished,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamUpdate {
    pub method: Method,
    pub event: StreamEvent,
}

/// The request a send turns into: `{clientId, text}` as query params for GET
/// or as the JSON body for POST
pub fn build_intent(method: Method, path: &str, client_id: &str, text: &str) -> TriggerIntent {
    match method {
        Method::Get => TriggerIntent::get(path).with_params(
            QueryParams::new()
                .with("clientId", client_id)
                .with("text", text),
        ),
        Method::Post => TriggerIntent::post(
            path,
            json!({
                "clientId": client_id,
                "text": text,
            }),
        ),
    }
}

/// Decodes a byte stream to text across chunk boundaries
///
/// A multi-byte character split between two chunks is held back until its
/// remaining bytes arrive. Invalid sequences become U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Carry {
    pending: Vec<u8>,
}

impl Utf8Carry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text decodable so far; an incomplete trailing sequence is kept
    pub fn push(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut out = String::new();
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    return out;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + len);
                        }
                        None => {
                            self.pending.drain(..valid);
                            return out;
                        }
                    }
                }
            }
        }
    }

    /// Whatever is left at end of stream, decoded lossily
    pub fn finish(&mut self) -> String {
        let rest = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        rest
    }
}

pub fn spawn_stream(
    trigger: Arc<StreamTrigger<HttpTransport>>,
    intent: TriggerIntent,
    tx: UnboundedSender<StreamUpdate>,
) -> JoinHandle<()> {
    let method = intent.method;
    let send = move |event: StreamEvent| {
        // Receiver gone means the app is shutting down
        let _ = tx.send(StreamUpdate { method, event });
    };

    tokio::spawn(async move {
        let response = match trigger.trigger(&intent).await {
            Ok(response) => response,
            Err(e) => {
                warn!(%method, error = %e, "Stream request failed");
                send(StreamEvent::Failed(e.to_string()));
                return;
            }
        };

        let status = response.status().as_u16();
        info!(%method, status, "Stream opened");
        send(StreamEvent::Opened { status });

        let mut chunks = std::pin::pin!(byte_stream(response));
        let mut carry = Utf8Carry::new();
        while let Some(chunk) = chunks.next().await {
            match chunk {
                Ok(bytes) => {
                    debug!(%method, bytes = bytes.len(), "Stream chunk");
                    let text = carry.push(&bytes);
                    if !text.is_empty() {
                        send(StreamEvent::Chunk(text));
                    }
                }
                Err(e) => {
                    warn!(%method, error = %e, "Stream interrupted");
                    send(StreamEvent::Failed(e.to_string()));
                    return;
                }
            }
        }

        let rest = carry.finish();
        if !rest.is_empty() {
            send(StreamEvent::Chunk(rest));
        }
        info!(%method, "Stream finished");
        send(StreamEvent::Finished);
    })
}
