//! The envelope carried over the event bus.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// A published message: topics are dot-separated strings, e.g.
/// `strategy.momentum.signal`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub topic: String,
    /// Canonically-encoded payload bytes (see `span_hasher::canonical_encode`).
    pub payload: Vec<u8>,
    pub timestamp: SystemTime,
    pub schema_version: u32,
}

impl Event {
    #[must_use]
    pub fn new(topic: impl Into<String>, payload: Vec<u8>, schema_version: u32) -> Self {
        Self {
            topic: topic.into(),
            payload,
            timestamp: SystemTime::now(),
            schema_version,
        }
    }
}
