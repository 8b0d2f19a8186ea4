//! ziotc-core - Record types, traits, and listener orchestration
//!
//! This crate provides the foundational types and abstractions for the
//! ziotc bridge:
//!
//! - **Raddec**: the normalized radio-decoding record handed downstream
//! - **Sink**: the contract every downstream consumer implements
//! - **Listener**: trait definition for transport listeners
//! - **Bridge**: listener lifecycle orchestration

pub mod bridge;
pub mod listener;
pub mod options;
pub mod raddec;
pub mod sink;

// Re-export commonly used types
pub use bridge::Bridge;
pub use listener::{Listener, ListenerError, ListenerResult, ListenerStats};
pub use options::DecodingOptions;
pub use raddec::{IdentifierType, Raddec, RssiSignatureEntry};
pub use sink::RaddecSink;
