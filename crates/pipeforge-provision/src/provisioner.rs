use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use pipeforge_core::{
    DeduplicationConfig, FilteringRuleUpdate, NewEnrichmentRule, NewFilteringRule, RuleSet,
    RuleSummary, validate_rule_set,
};

use crate::api::RuleApi;
use crate::errors::{ProvisionError, RuleKind};

/// What to do when listing existing rules fails during a create.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupPolicy {
    /// Surface the failure as [`ProvisionError::Lookup`].
    #[default]
    Strict,
    /// Treat the rule as absent and create anyway. A rule with the same name
    /// may then exist twice.
    FailOpen,
}

/// Outcome of a create: the rule that was removed first (if any) and the id
/// of the new one.
///
/// Delete and create are two separate calls. Between them no rule with the
/// name exists, and a failed create leaves it absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Replacement {
    pub deleted: Option<String>,
    pub created: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionedRule {
    pub name: String,
    pub id: String,
    pub replaced: Option<String>,
}

/// Rule names mapped to the ids assigned in this run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvisionReport {
    pub filtering: Vec<ProvisionedRule>,
    pub enrichment: Vec<ProvisionedRule>,
    pub deduplication: DeduplicationConfig,
}

/// Name-keyed upsert on top of a [`RuleApi`].
#[derive(Debug)]
pub struct RuleProvisioner<A> {
    api: A,
    policy: LookupPolicy,
}

impl<A: RuleApi> RuleProvisioner<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            policy: LookupPolicy::default(),
        }
    }

    pub fn with_lookup_policy(mut self, policy: LookupPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn lookup_policy(&self) -> LookupPolicy {
        self.policy
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub async fn find_filtering_rule(
        &self,
        name: &str,
    ) -> Result<Option<RuleSummary>, ProvisionError> {
        let rules = self
            .resolve_lookup(RuleKind::Filtering, self.api.list_filtering_rules().await)?;
        Ok(rules.into_iter().find(|rule| rule.name == name))
    }

    pub async fn find_enrichment_rule(
        &self,
        name: &str,
    ) -> Result<Option<RuleSummary>, ProvisionError> {
        let rules = self
            .resolve_lookup(RuleKind::Enrichment, self.api.list_enrichment_rules().await)?;
        Ok(rules.into_iter().find(|rule| rule.name == name))
    }

    /// Create a filtering rule, deleting any existing rule with the same name
    /// first.
    pub async fn create_filtering_rule(
        &self,
        rule: &NewFilteringRule,
    ) -> Result<Replacement, ProvisionError> {
        let existing = self.find_filtering_rule(&rule.name).await?.map(|r| r.id);
        let deleted = self
            .delete_existing(RuleKind::Filtering, &rule.name, existing)
            .await?;
        let created = self.api.create_filtering_rule(rule).await?.id;

        info!(
            event = "rules.created",
            kind = "filtering",
            name = %rule.name,
            id = %created,
            replaced = deleted.is_some(),
            "filtering rule created"
        );
        Ok(Replacement { deleted, created })
    }

    /// Create an enrichment rule, deleting any existing rule with the same
    /// name first.
    pub async fn create_enrichment_rule(
        &self,
        rule: &NewEnrichmentRule,
    ) -> Result<Replacement, ProvisionError> {
        let existing = self.find_enrichment_rule(&rule.name).await?.map(|r| r.id);
        let deleted = self
            .delete_existing(RuleKind::Enrichment, &rule.name, existing)
            .await?;
        let created = self.api.create_enrichment_rule(rule).await?.id;

        info!(
            event = "rules.created",
            kind = "enrichment",
            name = %rule.name,
            id = %created,
            replaced = deleted.is_some(),
            "enrichment rule created"
        );
        Ok(Replacement { deleted, created })
    }

    /// Change the expression of an existing filtering rule in place.
    pub async fn update_filtering_rule(
        &self,
        id: &str,
        expression: impl Into<String>,
    ) -> Result<(), ProvisionError> {
        let update = FilteringRuleUpdate {
            expression: expression.into(),
        };
        self.api.update_filtering_rule(id, &update).await?;
        info!(event = "rules.updated", kind = "filtering", id, "filtering rule updated");
        Ok(())
    }

    /// Replace the deduplication configuration.
    pub async fn configure_dedup(
        &self,
        config: &DeduplicationConfig,
    ) -> Result<(), ProvisionError> {
        self.api.put_dedup_config(config).await?;
        info!(
            event = "dedup.configured",
            hash_algorithm = %config.hash_algorithm,
            ttl_seconds = config.ttl_seconds,
            "deduplication configured"
        );
        Ok(())
    }

    pub async fn dedup_config(&self) -> Result<Option<DeduplicationConfig>, ProvisionError> {
        self.api.get_dedup_config().await
    }

    /// Provision a whole fixture set: filtering rules, then enrichment rules,
    /// then the deduplication config. Stops at the first failure; rerunning
    /// converges because every create replaces by name.
    pub async fn provision(&self, rules: &RuleSet) -> Result<ProvisionReport, ProvisionError> {
        validate_rule_set(rules)?;
        info!(
            event = "provision.started",
            transport = self.api.transport(),
            filtering = rules.filtering.len(),
            enrichment = rules.enrichment.len(),
            "provisioning rules"
        );

        let mut filtering = Vec::with_capacity(rules.filtering.len());
        for rule in &rules.filtering {
            let replacement = self.create_filtering_rule(rule).await?;
            filtering.push(ProvisionedRule {
                name: rule.name.clone(),
                id: replacement.created,
                replaced: replacement.deleted,
            });
        }

        let mut enrichment = Vec::with_capacity(rules.enrichment.len());
        for rule in &rules.enrichment {
            let replacement = self.create_enrichment_rule(rule).await?;
            enrichment.push(ProvisionedRule {
                name: rule.name.clone(),
                id: replacement.created,
                replaced: replacement.deleted,
            });
        }

        self.configure_dedup(&rules.deduplication).await?;

        Ok(ProvisionReport {
            filtering,
            enrichment,
            deduplication: rules.deduplication.clone(),
        })
    }

    async fn delete_existing(
        &self,
        kind: RuleKind,
        name: &str,
        existing: Option<String>,
    ) -> Result<Option<String>, ProvisionError> {
        let Some(id) = existing else {
            return Ok(None);
        };
        self.api.delete_rule(kind, &id).await?;
        info!(event = "rules.deleted", kind = %kind, name, id = %id, "existing rule removed");
        Ok(Some(id))
    }

    fn resolve_lookup<T>(
        &self,
        kind: RuleKind,
        listed: Result<Vec<T>, ProvisionError>,
    ) -> Result<Vec<T>, ProvisionError> {
        match (listed, self.policy) {
            (Ok(rules), _) => Ok(rules),
            (Err(err), LookupPolicy::Strict) => Err(ProvisionError::Lookup {
                kind,
                source: Box::new(err),
            }),
            (Err(err), LookupPolicy::FailOpen) => {
                warn!(
                    event = "rules.lookup_failed",
                    kind = %kind,
                    error = %err,
                    "rule lookup failed; treating rule as absent"
                );
                Ok(Vec::new())
            }
        }
    }
}
