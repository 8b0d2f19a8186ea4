//! MQTT transport listener
//!
//! Subscribes to the reader's IoT Connector topics and forwards every
//! publish payload to the decoder. The subscription is re-issued on each
//! connect acknowledgment, so broker reconnects (which rumqttc performs
//! by continued polling) pick the topic back up without help.

use crate::counters::ListenerCounters;
use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS, SubscribeReasonCode};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use ziotc_core::{DecodingOptions, Listener, ListenerError, ListenerResult, ListenerStats};
use ziotc_decode::ZiotcDecoder;

const DEFAULT_URL: &str = "mqtt://localhost";
const DEFAULT_TOPIC: &str = "ziotc/#";
const DEFAULT_CLIENT_ID: &str = "ziotc-bridge";
const DEFAULT_MQTT_PORT: u16 = 1883;

/// Delay before polling again after a connection error
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// MQTT listener configuration
#[derive(Debug, Clone)]
pub struct MqttListenerConfig {
    /// Broker URL, `mqtt://host[:port]`, `tcp://host[:port]`, or bare
    /// `host[:port]`
    pub url: String,

    /// Topic filter to subscribe to
    pub topic: String,

    /// MQTT client identifier
    pub client_id: String,

    /// Options passed through to every `ingest` call
    pub decoding_options: DecodingOptions,
}

impl Default for MqttListenerConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            topic: DEFAULT_TOPIC.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            decoding_options: DecodingOptions::default(),
        }
    }
}

/// MQTT transport listener
pub struct MqttListener {
    config: MqttListenerConfig,
    decoder: Arc<ZiotcDecoder>,
    running: Arc<AtomicBool>,
    counters: Arc<ListenerCounters>,
    client: Option<AsyncClient>,
}

impl MqttListener {
    pub fn new(config: MqttListenerConfig, decoder: Arc<ZiotcDecoder>) -> Self {
        Self {
            config,
            decoder,
            running: Arc::new(AtomicBool::new(false)),
            counters: Arc::new(ListenerCounters::default()),
            client: None,
        }
    }
}

#[async_trait]
impl Listener for MqttListener {
    fn name(&self) -> &str {
        "mqtt"
    }

    async fn start(&mut self) -> ListenerResult<()> {
        if self.running.load(Ordering::SeqCst) {
            return Err(ListenerError::AlreadyRunning);
        }

        let (host, port) = parse_broker_url(&self.config.url)?;

        let mut mqtt_options = MqttOptions::new(&self.config.client_id, host, port);
        mqtt_options.set_keep_alive(Duration::from_secs(30));
        mqtt_options.set_clean_session(true);

        let (client, mut eventloop) = AsyncClient::new(mqtt_options, 100);
        self.client = Some(client.clone());
        self.running.store(true, Ordering::SeqCst);

        info!(url = %self.config.url, topic = %self.config.topic, "starting MQTT listener");

        let running = self.running.clone();
        let counters = self.counters.clone();
        let decoder = self.decoder.clone();
        let origin = self.config.url.clone();
        let topic = self.config.topic.clone();
        let options = self.config.decoding_options.clone();

        tokio::spawn(async move {
            while running.load(Ordering::SeqCst) {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!(url = %origin, "connected to MQTT broker");
                        if let Err(e) = client.subscribe(&topic, QoS::AtMostOnce).await {
                            warn!(topic = %topic, error = %e, "MQTT subscribe failed");
                            counters.record_transport_error();
                        }
                    }
                    Ok(Event::Incoming(Packet::SubAck(ack))) => {
                        let rejected = ack
                            .return_codes
                            .iter()
                            .any(|code| matches!(code, SubscribeReasonCode::Failure));
                        if rejected {
                            warn!(topic = %topic, "MQTT subscription rejected by broker");
                            counters.record_transport_error();
                        } else {
                            debug!(topic = %topic, "MQTT subscription acknowledged");
                        }
                    }
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        let time = chrono::Utc::now().timestamp_millis();
                        counters.record_payload(publish.payload.len());
                        decoder.ingest(&publish.payload, &origin, time, &options);
                    }
                    Ok(_) => {
                        // Outgoing packets, pings and the rest
                    }
                    Err(e) => {
                        if !running.load(Ordering::SeqCst) {
                            break;
                        }
                        warn!(url = %origin, error = %e, "MQTT connection error, will retry");
                        counters.record_transport_error();
                        sleep(RECONNECT_DELAY).await;
                    }
                }
            }
            info!(url = %origin, "MQTT listener loop ended");
        });

        Ok(())
    }

    async fn stop(&mut self) -> ListenerResult<()> {
        self.running.store(false, Ordering::SeqCst);
        if let Some(client) = self.client.take() {
            let _ = client.disconnect().await;
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn stats(&self) -> ListenerStats {
        self.counters.snapshot()
    }
}

/// Parse a broker URL in the form `mqtt://host:port`, `tcp://host:port`,
/// or `host:port`, defaulting the port when absent
fn parse_broker_url(url: &str) -> ListenerResult<(&str, u16)> {
    let url = url.trim_start_matches("mqtt://");
    let url = url.trim_start_matches("tcp://");

    let parts: Vec<&str> = url.split(':').collect();
    match parts.len() {
        1 => Ok((parts[0], DEFAULT_MQTT_PORT)),
        2 => {
            let port = parts[1].parse::<u16>().map_err(|_| {
                ListenerError::InvalidConfiguration(format!(
                    "invalid port in broker URL: {}",
                    parts[1]
                ))
            })?;
            Ok((parts[0], port))
        }
        _ => Err(ListenerError::InvalidConfiguration(format!(
            "invalid broker URL: {}",
            url
        ))),
    }
}
