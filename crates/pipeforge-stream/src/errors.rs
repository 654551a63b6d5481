use rdkafka::error::KafkaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),
    #[error("failed to encode envelope: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("broker transport error: {0}")]
    Transport(#[from] KafkaError),
    /// The producer dropped the delivery before the broker answered.
    #[error("delivery of '{key}' was cancelled")]
    Cancelled { key: String },
}

#[derive(Debug, Error)]
pub enum ObserveError {
    #[error("broker error: {0}")]
    Kafka(#[from] KafkaError),
    #[error("failed to decode envelope: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("received a message without payload")]
    Empty,
}

impl ObserveError {
    /// Per-message problems the observer skips over.
    pub fn is_skippable(&self) -> bool {
        matches!(self, ObserveError::Decode(_) | ObserveError::Empty)
    }
}
