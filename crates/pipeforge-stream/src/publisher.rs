use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use pipeforge_core::{Envelope, Metadata};

use crate::errors::PublishError;
use crate::sink::EventSink;

/// When the publisher waits for the broker to acknowledge sends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushPolicy {
    /// Wait for each message before sending the next.
    #[default]
    PerMessage,
    /// Wait after every `n` messages and on close.
    Batch(usize),
}

impl FlushPolicy {
    fn is_due(self, unflushed: usize) -> bool {
        match self {
            FlushPolicy::PerMessage => true,
            FlushPolicy::Batch(size) => unflushed >= size.max(1),
        }
    }
}

/// Fill in `timestamp` and `metadata` when absent. Present values are kept.
pub fn stamp(mut envelope: Envelope, now: DateTime<Utc>) -> Envelope {
    if envelope.timestamp.is_none() {
        envelope.timestamp = Some(now);
    }
    if envelope.metadata.is_none() {
        envelope.metadata = Some(Metadata::default());
    }
    envelope
}

/// Stamps envelopes and hands them to a sink keyed by envelope id, in the
/// order they are published. No retries.
pub struct EventPublisher<S> {
    sink: S,
    policy: FlushPolicy,
    unflushed: usize,
    published: u64,
}

impl<S: EventSink> EventPublisher<S> {
    pub fn new(sink: S, policy: FlushPolicy) -> Self {
        Self {
            sink,
            policy,
            unflushed: 0,
            published: 0,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn published(&self) -> u64 {
        self.published
    }

    /// Stamp and send one envelope. Returns the envelope as sent.
    pub async fn publish(&mut self, envelope: Envelope) -> Result<Envelope, PublishError> {
        if envelope.id.is_empty() {
            return Err(PublishError::InvalidEnvelope(
                "envelope id must not be empty".to_string(),
            ));
        }

        let envelope = stamp(envelope, Utc::now());
        let payload = serde_json::to_string(&envelope)?;
        self.sink.send(&envelope.id, &payload).await?;
        self.unflushed += 1;
        self.published += 1;

        if self.policy.is_due(self.unflushed) {
            self.sink.flush().await?;
            self.unflushed = 0;
        }

        debug!(event = "publish.sent", id = %envelope.id, "envelope sent");
        Ok(envelope)
    }

    /// Flush outstanding sends and hand back the sink.
    pub async fn close(mut self) -> Result<S, PublishError> {
        if self.unflushed > 0 {
            self.sink.flush().await?;
        }
        info!(event = "publish.closed", published = self.published, "publisher closed");
        Ok(self.sink)
    }
}
