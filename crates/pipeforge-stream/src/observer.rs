use std::fmt::Write as _;
use std::future::Future;

use chrono::{DateTime, Utc};
use rdkafka::ClientConfig;
use rdkafka::Message;
use rdkafka::consumer::{Consumer, StreamConsumer};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use pipeforge_core::Metadata;

use crate::config::KafkaConfig;
use crate::errors::ObserveError;

const SEPARATOR_WIDTH: usize = 50;

/// Envelope read back from the output topic. The payload is kept as raw
/// JSON so keys added by the pipeline survive and non-payment payloads
/// still decode.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ObservedEnvelope {
    pub id: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

/// Consumes processed envelopes from the output topic.
pub struct EnvelopeObserver {
    consumer: StreamConsumer,
    topic: String,
}

impl EnvelopeObserver {
    /// Subscribe from the latest offset with auto-commit on.
    pub fn new(config: &KafkaConfig) -> Result<Self, ObserveError> {
        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", &config.hosts)
            .set("group.id", &config.consumer_group)
            .set("auto.offset.reset", "latest")
            .set("enable.auto.commit", "true");

        let consumer: StreamConsumer = client_config.create()?;
        consumer.subscribe(&[config.output_topic.as_str()])?;

        Ok(Self {
            consumer,
            topic: config.output_topic.clone(),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub async fn next_envelope(&self) -> Result<ObservedEnvelope, ObserveError> {
        let message = self.consumer.recv().await?;
        let Some(payload) = message.payload() else {
            return Err(ObserveError::Empty);
        };
        Ok(serde_json::from_slice(payload)?)
    }

    /// Hand every decoded envelope to `on_envelope` until `shutdown`
    /// resolves. Undecodable messages are logged and skipped. Returns the
    /// number of envelopes observed.
    pub async fn run<F>(
        &self,
        shutdown: impl Future<Output = ()>,
        mut on_envelope: F,
    ) -> Result<u64, ObserveError>
    where
        F: FnMut(&ObservedEnvelope),
    {
        tokio::pin!(shutdown);
        let mut observed = 0u64;

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(
                        event = "observe.stopped",
                        topic = %self.topic,
                        observed,
                        "observer stopped"
                    );
                    return Ok(observed);
                }
                received = self.next_envelope() => match received {
                    Ok(envelope) => {
                        observed += 1;
                        on_envelope(&envelope);
                    }
                    Err(err) if err.is_skippable() => {
                        warn!(
                            event = "observe.skipped",
                            topic = %self.topic,
                            error = %err,
                            "skipping message"
                        );
                    }
                    Err(err) => return Err(err),
                },
            }
        }
    }
}

/// Human-readable block for one processed envelope.
pub fn render_envelope(envelope: &ObservedEnvelope) -> String {
    let mut out = String::new();
    let payload = envelope.payload.to_string();

    let _ = writeln!(out, "Message ID: {}", envelope.id);
    let _ = writeln!(out, "Source: {}", envelope.source);
    let _ = writeln!(out, "Payload: {payload}");

    if let Some(metadata) = &envelope.metadata {
        if let Some(filters) = &metadata.filters_applied {
            let _ = writeln!(out, "Applied rules: [{}]", filters.rule_ids.join(", "));
        }
        if let Some(dedup) = &metadata.deduplication {
            let verdict = if dedup.is_unique { "unique" } else { "duplicate" };
            let _ = writeln!(out, "Deduplication: {verdict}");
        }
        if let Some(enrichment) = metadata.enrichment.as_ref().filter(|map| !map.is_empty()) {
            let rendered = serde_json::to_string(enrichment).unwrap_or_default();
            let _ = writeln!(out, "Enrichment: {rendered}");
        }
    }

    out.push_str(&"-".repeat(SEPARATOR_WIDTH));
    out
}
