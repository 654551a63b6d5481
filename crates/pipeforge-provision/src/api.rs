use async_trait::async_trait;

use pipeforge_core::{
    CreatedResource, DeduplicationConfig, FilteringRuleUpdate, NewEnrichmentRule,
    NewFilteringRule, RuleSummary,
};

use crate::errors::{ProvisionError, RuleKind};

/// Remote rule-management API.
///
/// Implementations are thin transports: they do not resolve rules by name
/// and do not enforce name uniqueness. That is the provisioner's job.
#[async_trait]
pub trait RuleApi: Send + Sync {
    /// Short identifier for logs (e.g. `http`, `memory`).
    fn transport(&self) -> &'static str;

    /// Ids and names of the existing filtering rules.
    async fn list_filtering_rules(&self) -> Result<Vec<RuleSummary>, ProvisionError>;

    async fn create_filtering_rule(
        &self,
        rule: &NewFilteringRule,
    ) -> Result<CreatedResource, ProvisionError>;

    async fn update_filtering_rule(
        &self,
        id: &str,
        update: &FilteringRuleUpdate,
    ) -> Result<(), ProvisionError>;

    /// Ids and names of the existing enrichment rules.
    async fn list_enrichment_rules(&self) -> Result<Vec<RuleSummary>, ProvisionError>;

    async fn create_enrichment_rule(
        &self,
        rule: &NewEnrichmentRule,
    ) -> Result<CreatedResource, ProvisionError>;

    async fn delete_rule(&self, kind: RuleKind, id: &str) -> Result<(), ProvisionError>;

    /// Replace the deduplication configuration wholesale.
    async fn put_dedup_config(&self, config: &DeduplicationConfig) -> Result<(), ProvisionError>;

    /// Current deduplication configuration, `None` when never configured.
    async fn get_dedup_config(&self) -> Result<Option<DeduplicationConfig>, ProvisionError>;
}
