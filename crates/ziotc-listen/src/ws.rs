//! WebSocket transport listener
//!
//! Connects to the reader's streaming endpoint and forwards each frame
//! to the decoder with the fixed origin label `WebSocket`. One
//! connection per listener; when the reader closes it or it breaks, the
//! listener logs and ends. Reconnecting is the operator's call.

use crate::counters::ListenerCounters;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{info, warn};
use ziotc_core::{DecodingOptions, Listener, ListenerError, ListenerResult, ListenerStats};
use ziotc_decode::ZiotcDecoder;

const DEFAULT_ADDRESS: &str = "ws://127.0.0.1/ws";

/// Fixed origin label for payloads arriving on this transport
const WS_ORIGIN: &str = "WebSocket";

/// WebSocket listener configuration
#[derive(Debug, Clone)]
pub struct WsListenerConfig {
    /// Reader WebSocket address
    pub address: String,

    /// Options passed through to every `ingest` call
    pub decoding_options: DecodingOptions,
}

impl Default for WsListenerConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            decoding_options: DecodingOptions::default(),
        }
    }
}

/// WebSocket transport listener
pub struct WsListener {
    config: WsListenerConfig,
    decoder: Arc<ZiotcDecoder>,
    running: Arc<AtomicBool>,
    counters: Arc<ListenerCounters>,
    shutdown: Arc<Notify>,
}

impl WsListener {
    pub fn new(config: WsListenerConfig, decoder: Arc<ZiotcDecoder>) -> Self {
        Self {
            config,
            decoder,
            running: Arc::new(AtomicBool::new(false)),
            counters: Arc::new(ListenerCounters::default()),
            shutdown: Arc::new(Notify::new()),
        }
    }
}

#[async_trait]
impl Listener for WsListener {
    fn name(&self) -> &str {
        "websocket"
    }

    async fn start(&mut self) -> ListenerResult<()> {
        if self.running.load(Ordering::SeqCst) {
            return Err(ListenerError::AlreadyRunning);
        }

        let (ws_stream, _) = connect_async(&self.config.address)
            .await
            .map_err(|e| ListenerError::ConnectionFailed(e.to_string()))?;

        info!(address = %self.config.address, "WebSocket connection established");
        self.running.store(true, Ordering::SeqCst);

        let running = self.running.clone();
        let counters = self.counters.clone();
        let decoder = self.decoder.clone();
        let options = self.config.decoding_options.clone();
        let shutdown = self.shutdown.clone();
        let address = self.config.address.clone();

        tokio::spawn(async move {
            let (mut write, mut read) = ws_stream.split();

            loop {
                tokio::select! {
                    _ = shutdown.notified() => {
                        let _ = write.send(Message::Close(None)).await;
                        break;
                    }
                    message = read.next() => {
                        match message {
                            Some(Ok(Message::Text(text))) => {
                                let time = chrono::Utc::now().timestamp_millis();
                                counters.record_payload(text.len());
                                decoder.ingest(text.as_bytes(), WS_ORIGIN, time, &options);
                            }
                            Some(Ok(Message::Binary(data))) => {
                                let time = chrono::Utc::now().timestamp_millis();
                                counters.record_payload(data.len());
                                decoder.ingest(&data, WS_ORIGIN, time, &options);
                            }
                            Some(Ok(Message::Ping(data))) => {
                                let _ = write.send(Message::Pong(data)).await;
                            }
                            Some(Ok(Message::Close(_))) => {
                                info!(address = %address, "WebSocket connection closed by reader");
                                break;
                            }
                            Some(Ok(_)) => {
                                // Pong and raw frames carry nothing to decode
                            }
                            Some(Err(e)) => {
                                warn!(address = %address, error = %e, "WebSocket error");
                                counters.record_transport_error();
                                break;
                            }
                            None => {
                                info!(address = %address, "WebSocket stream ended");
                                break;
                            }
                        }
                    }
                }
            }

            running.store(false, Ordering::SeqCst);
            info!(address = %address, "WebSocket listener loop ended");
        });

        Ok(())
    }

    async fn stop(&mut self) -> ListenerResult<()> {
        self.shutdown.notify_one();
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn stats(&self) -> ListenerStats {
        self.counters.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ziotc_core::{Raddec, RaddecSink};

    struct NullSink;

    impl RaddecSink for NullSink {
        fn accept(&self, _raddec: Raddec) {}
    }

    #[tokio::test]
    async fn start_fails_cleanly_when_reader_unreachable() {
        let decoder = Arc::new(ZiotcDecoder::new(Arc::new(NullSink)));
        let config = WsListenerConfig {
            address: "ws://127.0.0.1:1/ws".to_string(),
            ..Default::default()
        };
        let mut listener = WsListener::new(config, decoder);

        let result = listener.start().await;
        assert!(matches!(result, Err(ListenerError::ConnectionFailed(_))));
        assert!(!listener.is_running());
    }
}
