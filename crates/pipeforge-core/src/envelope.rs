use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Provenance tag stamped on every generated envelope.
pub const PAYMENT_SOURCE: &str = "payment-service";

/// Message wrapper carrying an event's identity, provenance, payload and
/// pipeline-added metadata.
///
/// `timestamp` and `metadata` stay `None` until the publisher stamps the
/// envelope; absent fields are omitted from the serialized form so generated
/// artifacts only carry `id`, `source` and `payload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub id: String,
    pub source: String,
    pub payload: PaymentPayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl Envelope {
    /// Build an unstamped envelope from the payment source.
    pub fn new(id: impl Into<String>, payload: PaymentPayload) -> Self {
        Self {
            id: id.into(),
            source: PAYMENT_SOURCE.to_string(),
            payload,
            timestamp: None,
            metadata: None,
        }
    }

    pub fn is_stamped(&self) -> bool {
        self.timestamp.is_some() && self.metadata.is_some()
    }
}

/// Business data of a payment event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentPayload {
    pub order_id: String,
    pub user_id: String,
    pub amount: f64,
    pub currency: String,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Completed,
    Active,
    Pending,
    Inactive,
    Processing,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 5] = [
        PaymentStatus::Completed,
        PaymentStatus::Active,
        PaymentStatus::Pending,
        PaymentStatus::Inactive,
        PaymentStatus::Processing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Completed => "completed",
            PaymentStatus::Active => "active",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Inactive => "inactive",
            PaymentStatus::Processing => "processing",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline metadata. Empty (`{}`) when published; filled in by the
/// external filtering, deduplication and enrichment stages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters_applied: Option<FiltersApplied>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deduplication: Option<DeduplicationInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<Map<String, Value>>,
    /// Keys added by pipeline stages this crate does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Metadata {
    pub fn is_empty(&self) -> bool {
        self.trace_id.is_none()
            && self.filters_applied.is_none()
            && self.deduplication.is_none()
            && self.enrichment.is_none()
            && self.extra.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiltersApplied {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rule_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeduplicationInfo {
    #[serde(default)]
    pub is_unique: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked_at: Option<DateTime<Utc>>,
}
