//! ziotc-listen - Transport listeners
//!
//! Three transport variants feed the decoder: an MQTT subscriber for the
//! reader's IoT Connector topics, a WebSocket client for the reader's
//! streaming endpoint, and a synthetic generator for development without
//! hardware. Each listener owns one connection or timer task and hands
//! every raw payload to the decoder unmodified, tagged with its origin
//! and arrival time.

mod counters;

pub mod mqtt;
pub mod test_listener;
pub mod ws;

pub use mqtt::{MqttListener, MqttListenerConfig};
pub use test_listener::{TestListener, TestListenerConfig};
pub use ws::{WsListener, WsListenerConfig};
