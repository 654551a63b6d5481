use serde::{Deserialize, Serialize};

use crate::publisher::FlushPolicy;

/// Broker connection and topic settings shared by the publisher and the
/// observer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KafkaConfig {
    /// Comma-separated bootstrap servers.
    pub hosts: String,
    pub input_topic: String,
    pub output_topic: String,
    pub consumer_group: String,
    pub message_timeout_ms: u64,
    pub flush_policy: FlushPolicy,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            hosts: "localhost:29092".to_string(),
            input_topic: "input_events".to_string(),
            output_topic: "processed_events".to_string(),
            consumer_group: "demo-consumer".to_string(),
            message_timeout_ms: 5000,
            flush_policy: FlushPolicy::default(),
        }
    }
}
