//! Message-bus plumbing: stamping and publishing envelopes to the input
//! topic, and observing processed envelopes on the output topic.

pub mod config;
pub mod errors;
pub mod observer;
pub mod publisher;
pub mod sink;

pub use config::KafkaConfig;
pub use errors::{ObserveError, PublishError};
pub use observer::{EnvelopeObserver, ObservedEnvelope, render_envelope};
pub use publisher::{EventPublisher, FlushPolicy, stamp};
pub use sink::{EventSink, KafkaSink, MemorySink, SentRecord};
