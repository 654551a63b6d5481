use async_trait::async_trait;
use rdkafka::ClientConfig;
use rdkafka::error::KafkaError;
use rdkafka::producer::{DeliveryFuture, FutureProducer, FutureRecord};
use rdkafka::types::RDKafkaErrorCode;
use tracing::debug;

use crate::config::KafkaConfig;
use crate::errors::PublishError;

/// Destination for serialized envelopes.
///
/// `send` may only enqueue; a record counts as delivered once a later
/// `flush` returns successfully.
#[async_trait]
pub trait EventSink: Send {
    async fn send(&mut self, key: &str, payload: &str) -> Result<(), PublishError>;

    /// Wait until every enqueued record is acknowledged.
    async fn flush(&mut self) -> Result<(), PublishError>;
}

pub struct KafkaSink {
    producer: FutureProducer,
    topic: String,
    pending: Vec<(String, DeliveryFuture)>,
}

impl KafkaSink {
    pub fn new(config: &KafkaConfig) -> Result<Self, PublishError> {
        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", &config.hosts)
            .set("message.timeout.ms", config.message_timeout_ms.to_string());

        let producer: FutureProducer = client_config.create()?;
        Ok(Self {
            producer,
            topic: config.input_topic.clone(),
            pending: Vec::new(),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[async_trait]
impl EventSink for KafkaSink {
    async fn send(&mut self, key: &str, payload: &str) -> Result<(), PublishError> {
        let record = FutureRecord::to(&self.topic).key(key).payload(payload);
        match self.producer.send_result(record) {
            Ok(delivery) => {
                self.pending.push((key.to_string(), delivery));
                Ok(())
            }
            Err((err, _)) => Err(PublishError::Transport(err)),
        }
    }

    async fn flush(&mut self) -> Result<(), PublishError> {
        let pending = std::mem::take(&mut self.pending);
        let count = pending.len();
        for (key, delivery) in pending {
            match delivery.await {
                Ok(Ok(_)) => {}
                Ok(Err((err, _))) => return Err(PublishError::Transport(err)),
                Err(_) => return Err(PublishError::Cancelled { key }),
            }
        }
        debug!(event = "sink.flushed", topic = %self.topic, count, "deliveries acknowledged");
        Ok(())
    }
}

/// A record accepted by [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentRecord {
    pub key: String,
    pub payload: String,
}

/// In-memory sink recording what was sent and when it was flushed.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub delivered: Vec<SentRecord>,
    pub buffered: Vec<SentRecord>,
    pub flushes: usize,
    fail_after: Option<usize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `sends` records, then fail every further send with a broker
    /// transport error.
    pub fn failing_after(sends: usize) -> Self {
        Self {
            fail_after: Some(sends),
            ..Self::default()
        }
    }

    fn sent(&self) -> usize {
        self.delivered.len() + self.buffered.len()
    }
}

#[async_trait]
impl EventSink for MemorySink {
    async fn send(&mut self, key: &str, payload: &str) -> Result<(), PublishError> {
        if self.fail_after.is_some_and(|limit| self.sent() >= limit) {
            return Err(PublishError::Transport(KafkaError::MessageProduction(
                RDKafkaErrorCode::BrokerTransportFailure,
            )));
        }
        self.buffered.push(SentRecord {
            key: key.to_string(),
            payload: payload.to_string(),
        });
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), PublishError> {
        self.delivered.append(&mut self.buffered);
        self.flushes += 1;
        Ok(())
    }
}
