use std::collections::BTreeSet;

use async_trait::async_trait;
use tokio::sync::Mutex;

use pipeforge_core::{
    CreatedResource, DeduplicationConfig, EnrichmentRule, FilteringRule, FilteringRuleUpdate,
    NewEnrichmentRule, NewFilteringRule, RuleSummary,
};

use crate::api::RuleApi;
use crate::errors::{ProvisionError, RuleKind};

#[derive(Debug, Default)]
struct State {
    filtering: Vec<FilteringRule>,
    enrichment: Vec<EnrichmentRule>,
    dedup: Option<DeduplicationConfig>,
    failing_lookups: bool,
    rejected_names: BTreeSet<String>,
    calls: Vec<String>,
}

/// In-process stand-in for the rule API.
///
/// Behaves like the remote service: fresh ids on create, no uniqueness
/// check on names, 404 for unknown ids. Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryRuleApi {
    state: Mutex<State>,
}

impl MemoryRuleApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make list calls fail with a 503 until switched back off.
    pub async fn fail_lookups(&self, failing: bool) {
        self.state.lock().await.failing_lookups = failing;
    }

    /// Reject creation of rules with this name with a 400.
    pub async fn reject_name(&self, name: impl Into<String>) {
        self.state.lock().await.rejected_names.insert(name.into());
    }

    pub async fn filtering_rules(&self) -> Vec<FilteringRule> {
        self.state.lock().await.filtering.clone()
    }

    pub async fn enrichment_rules(&self) -> Vec<EnrichmentRule> {
        self.state.lock().await.enrichment.clone()
    }

    /// Mutating calls received so far, e.g. `DELETE filtering <id>`.
    pub async fn calls(&self) -> Vec<String> {
        self.state.lock().await.calls.clone()
    }
}

fn unavailable(operation: String) -> ProvisionError {
    ProvisionError::Status {
        operation,
        status: 503,
        body: "rule store unavailable".to_string(),
    }
}

fn not_found(operation: String, id: &str) -> ProvisionError {
    ProvisionError::Status {
        operation,
        status: 404,
        body: format!("rule {id} not found"),
    }
}

fn rejected(operation: String, name: &str) -> ProvisionError {
    ProvisionError::Status {
        operation,
        status: 400,
        body: format!(r#"{{"error":"validation failed","message":"rule '{name}' rejected"}}"#),
    }
}

fn summary(id: &str, name: &str) -> RuleSummary {
    RuleSummary {
        id: id.to_string(),
        name: name.to_string(),
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[async_trait]
impl RuleApi for MemoryRuleApi {
    fn transport(&self) -> &'static str {
        "memory"
    }

    async fn list_filtering_rules(&self) -> Result<Vec<RuleSummary>, ProvisionError> {
        let state = self.state.lock().await;
        if state.failing_lookups {
            return Err(unavailable("list filtering rules".to_string()));
        }
        Ok(state
            .filtering
            .iter()
            .map(|rule| summary(&rule.id, &rule.name))
            .collect())
    }

    async fn create_filtering_rule(
        &self,
        rule: &NewFilteringRule,
    ) -> Result<CreatedResource, ProvisionError> {
        let mut state = self.state.lock().await;
        if state.rejected_names.contains(&rule.name) {
            return Err(rejected(format!("create filtering rule '{}'", rule.name), &rule.name));
        }
        let id = new_id();
        state.calls.push(format!("POST filtering {}", rule.name));
        state.filtering.push(FilteringRule {
            id: id.clone(),
            name: rule.name.clone(),
            expression: rule.expression.clone(),
            priority: rule.priority,
            enabled: rule.enabled,
        });
        Ok(CreatedResource { id })
    }

    async fn update_filtering_rule(
        &self,
        id: &str,
        update: &FilteringRuleUpdate,
    ) -> Result<(), ProvisionError> {
        let mut state = self.state.lock().await;
        state.calls.push(format!("PUT filtering {id}"));
        match state.filtering.iter_mut().find(|rule| rule.id == id) {
            Some(rule) => {
                rule.expression = update.expression.clone();
                Ok(())
            }
            None => Err(not_found(format!("update filtering rule {id}"), id)),
        }
    }

    async fn list_enrichment_rules(&self) -> Result<Vec<RuleSummary>, ProvisionError> {
        let state = self.state.lock().await;
        if state.failing_lookups {
            return Err(unavailable("list enrichment rules".to_string()));
        }
        Ok(state
            .enrichment
            .iter()
            .map(|rule| summary(&rule.id, &rule.name))
            .collect())
    }

    async fn create_enrichment_rule(
        &self,
        rule: &NewEnrichmentRule,
    ) -> Result<CreatedResource, ProvisionError> {
        let mut state = self.state.lock().await;
        if state.rejected_names.contains(&rule.name) {
            return Err(rejected(format!("create enrichment rule '{}'", rule.name), &rule.name));
        }
        let id = new_id();
        state.calls.push(format!("POST enrichment {}", rule.name));
        state.enrichment.push(EnrichmentRule {
            id: id.clone(),
            name: rule.name.clone(),
            field_to_enrich: rule.field_to_enrich.clone(),
            source_type: rule.source_type,
            source_config: rule.source_config.clone(),
            transformations: rule.transformations.clone(),
            cache_ttl_seconds: rule.cache_ttl_seconds,
            error_handling: rule.error_handling,
            priority: rule.priority,
            enabled: rule.enabled,
        });
        Ok(CreatedResource { id })
    }

    async fn delete_rule(&self, kind: RuleKind, id: &str) -> Result<(), ProvisionError> {
        let mut state = self.state.lock().await;
        state.calls.push(format!("DELETE {kind} {id}"));
        let removed = match kind {
            RuleKind::Filtering => {
                let before = state.filtering.len();
                state.filtering.retain(|rule| rule.id != id);
                before != state.filtering.len()
            }
            RuleKind::Enrichment => {
                let before = state.enrichment.len();
                state.enrichment.retain(|rule| rule.id != id);
                before != state.enrichment.len()
            }
        };
        if !removed {
            return Err(not_found(format!("delete {kind} rule {id}"), id));
        }
        Ok(())
    }

    async fn put_dedup_config(&self, config: &DeduplicationConfig) -> Result<(), ProvisionError> {
        let mut state = self.state.lock().await;
        state.calls.push("PUT deduplication".to_string());
        state.dedup = Some(config.clone());
        Ok(())
    }

    async fn get_dedup_config(&self) -> Result<Option<DeduplicationConfig>, ProvisionError> {
        Ok(self.state.lock().await.dedup.clone())
    }
}
