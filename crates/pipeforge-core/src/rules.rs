use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_RULE_PRIORITY: i32 = 10;

/// Filtering rule as listed by the rule API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteringRule {
    pub id: String,
    pub name: String,
    pub expression: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub enabled: bool,
}

/// Body of `POST /api/v1/rules/filtering`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFilteringRule {
    pub name: String,
    pub expression: String,
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl NewFilteringRule {
    pub fn new(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expression: expression.into(),
            priority: DEFAULT_RULE_PRIORITY,
            enabled: true,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// Body of `PUT /api/v1/rules/filtering/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteringRuleUpdate {
    pub expression: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Api,
    Database,
    Cache,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorHandling {
    SkipField,
    #[default]
    SkipRule,
    Fail,
}

/// Where an enrichment rule reads from. Only the fields relevant to the
/// rule's `source_type` are set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<BTreeMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transformation {
    pub source_path: String,
    pub target_field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// The part of a listed rule needed to resolve it by name. Other fields are
/// ignored, so server-side variations (`null` lists, unknown enum values)
/// never break a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSummary {
    pub id: String,
    pub name: String,
}

/// Enrichment rule as listed by the rule API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentRule {
    pub id: String,
    pub name: String,
    pub field_to_enrich: String,
    pub source_type: SourceType,
    #[serde(default)]
    pub source_config: SourceConfig,
    #[serde(default)]
    pub transformations: Vec<Transformation>,
    #[serde(default)]
    pub cache_ttl_seconds: u32,
    #[serde(default)]
    pub error_handling: ErrorHandling,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub enabled: bool,
}

/// Body of `POST /api/v1/rules/enrichment`. Fixture files may omit the
/// optional fields; they take the API's documented defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEnrichmentRule {
    pub name: String,
    pub field_to_enrich: String,
    pub source_type: SourceType,
    pub source_config: SourceConfig,
    #[serde(default)]
    pub transformations: Vec<Transformation>,
    #[serde(default)]
    pub cache_ttl_seconds: u32,
    #[serde(default)]
    pub error_handling: ErrorHandling,
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// Singleton deduplication configuration, replaced wholesale on update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeduplicationConfig {
    pub hash_algorithm: String,
    pub ttl_seconds: u64,
    pub on_redis_error: String,
    #[serde(default)]
    pub fields_to_hash: Vec<String>,
}

/// Identifier returned by create endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedResource {
    pub id: String,
}

fn default_priority() -> i32 {
    DEFAULT_RULE_PRIORITY
}

fn default_enabled() -> bool {
    true
}
