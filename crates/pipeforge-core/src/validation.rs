use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::rules::{DeduplicationConfig, NewEnrichmentRule, NewFilteringRule};

/// Everything a provisioning run pushes to the rule API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub filtering: Vec<NewFilteringRule>,
    pub enrichment: Vec<NewEnrichmentRule>,
    pub deduplication: DeduplicationConfig,
}

/// Validate a rule set before any remote call is made.
///
/// This checks:
/// - rule names are non-empty and unique per rule kind
/// - filtering expressions are non-blank
/// - enrichment rules name the field they enrich
/// - the dedup config hashes at least one field with a non-zero TTL
pub fn validate_rule_set(rules: &RuleSet) -> Result<()> {
    let mut names = BTreeSet::new();
    for rule in &rules.filtering {
        check_name("filtering", &rule.name, &mut names)?;
        if rule.expression.trim().is_empty() {
            return Err(Error::InvalidFixture(format!(
                "filtering rule '{}' has an empty expression",
                rule.name
            )));
        }
    }

    let mut names = BTreeSet::new();
    for rule in &rules.enrichment {
        check_name("enrichment", &rule.name, &mut names)?;
        if rule.field_to_enrich.trim().is_empty() {
            return Err(Error::InvalidFixture(format!(
                "enrichment rule '{}' has no field_to_enrich",
                rule.name
            )));
        }
    }

    let dedup = &rules.deduplication;
    if dedup.ttl_seconds == 0 {
        return Err(Error::InvalidFixture(
            "deduplication ttl_seconds must be > 0".to_string(),
        ));
    }
    if dedup.fields_to_hash.is_empty() {
        return Err(Error::InvalidFixture(
            "deduplication fields_to_hash must not be empty".to_string(),
        ));
    }

    Ok(())
}

fn check_name<'a>(kind: &str, name: &'a str, seen: &mut BTreeSet<&'a str>) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidFixture(format!("{kind} rule with empty name")));
    }
    if !seen.insert(name) {
        return Err(Error::InvalidFixture(format!(
            "duplicate {kind} rule name: {name}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dedup() -> DeduplicationConfig {
        DeduplicationConfig {
            hash_algorithm: "sha256".to_string(),
            ttl_seconds: 3600,
            on_redis_error: "allow".to_string(),
            fields_to_hash: vec!["payload.order_id".to_string()],
        }
    }

    #[test]
    fn accepts_distinct_rules() {
        let rules = RuleSet {
            filtering: vec![
                NewFilteringRule::new("high-value", "payload.amount > 1000"),
                NewFilteringRule::new("completed", "payload.status == 'completed'"),
            ],
            enrichment: Vec::new(),
            deduplication: dedup(),
        };
        assert!(validate_rule_set(&rules).is_ok());
    }

    #[test]
    fn rejects_duplicate_names() {
        let rules = RuleSet {
            filtering: vec![
                NewFilteringRule::new("high-value", "payload.amount > 1000"),
                NewFilteringRule::new("high-value", "payload.amount > 5000"),
            ],
            enrichment: Vec::new(),
            deduplication: dedup(),
        };
        let err = validate_rule_set(&rules).expect_err("duplicate must fail");
        assert!(err.to_string().contains("duplicate filtering rule name"));
    }

    #[test]
    fn rejects_dedup_without_fields() {
        let mut config = dedup();
        config.fields_to_hash.clear();
        let rules = RuleSet {
            filtering: Vec::new(),
            enrichment: Vec::new(),
            deduplication: config,
        };
        assert!(matches!(
            validate_rule_set(&rules),
            Err(Error::InvalidFixture(_))
        ));
    }
}
