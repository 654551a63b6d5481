//! Core contracts shared across pipeforge.
//!
//! Defines the event envelope, the reference records joined against it, the
//! rule resources pushed to the rule-management API, and small helpers
//! (fixture validation, connection redaction) used by the other crates.

pub mod envelope;
pub mod error;
pub mod redaction;
pub mod reference;
pub mod rules;
pub mod validation;

pub use envelope::{
    DeduplicationInfo, Envelope, FiltersApplied, Metadata, PAYMENT_SOURCE, PaymentPayload,
    PaymentStatus,
};
pub use error::{Error, Result};
pub use redaction::{RedactedConnection, redact_connection_string};
pub use reference::{
    DocumentBundle, EntityKind, KeyValueBundle, OrderExtension, Product, UserProfile,
};
pub use rules::{
    CreatedResource, DEFAULT_RULE_PRIORITY, DeduplicationConfig, EnrichmentRule, ErrorHandling,
    FilteringRule, FilteringRuleUpdate, NewEnrichmentRule, NewFilteringRule, RuleSummary,
    SourceConfig, SourceType, Transformation,
};
pub use validation::{RuleSet, validate_rule_set};
