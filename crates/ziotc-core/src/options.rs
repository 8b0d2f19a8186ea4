//! Pass-through decoding options

use std::collections::HashMap;

/// Opaque per-listener decoding options.
///
/// Carried from listener configuration through every `ingest` call,
/// uninterpreted by the decoder itself. Downstream integrations read
/// them with the typed accessors.
#[derive(Debug, Clone, Default)]
pub struct DecodingOptions {
    /// Raw option values
    pub values: HashMap<String, serde_json::Value>,
}

impl DecodingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn set<T: serde::Serialize>(&mut self, key: &str, value: T) {
        if let Ok(v) = serde_json::to_value(value) {
            self.values.insert(key.to_string(), v);
        }
    }
}
