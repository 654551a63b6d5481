use pipeforge_core::{
    DeduplicationConfig, NewEnrichmentRule, NewFilteringRule, RuleSet, SourceConfig, SourceType,
};
use pipeforge_generate::{DatasetEngine, GenerateOptions};
use pipeforge_provision::{
    FixtureDir, LookupPolicy, MemoryRuleApi, ProvisionError, RuleKind, RuleProvisioner,
};
use serde_json::Value;

fn dedup() -> DeduplicationConfig {
    DeduplicationConfig {
        hash_algorithm: "sha256".to_string(),
        ttl_seconds: 3600,
        on_redis_error: "allow".to_string(),
        fields_to_hash: vec!["id".to_string(), "payload.order_id".to_string()],
    }
}

fn bundled_fixtures() -> FixtureDir {
    FixtureDir::new(std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../fixtures"))
}

fn user_enrichment() -> NewEnrichmentRule {
    serde_json::from_value(serde_json::json!({
        "name": "user-profile",
        "field_to_enrich": "user_id",
        "source_type": "database",
        "source_config": {
            "database": "test_db",
            "collection": "user_profiles",
            "field": "_id"
        }
    }))
    .expect("decode enrichment rule")
}

#[tokio::test]
async fn provisioning_same_name_twice_keeps_one_rule() {
    let provisioner = RuleProvisioner::new(MemoryRuleApi::new());

    let first = provisioner
        .create_filtering_rule(&NewFilteringRule::new("high-value", "payload.amount > 1000"))
        .await
        .expect("first create");
    let second = provisioner
        .create_filtering_rule(&NewFilteringRule::new("high-value", "payload.amount > 5000"))
        .await
        .expect("second create");

    assert_eq!(first.deleted, None);
    assert_eq!(second.deleted.as_deref(), Some(first.created.as_str()));
    assert_ne!(first.created, second.created);

    let rules = provisioner.api().filtering_rules().await;
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].name, "high-value");
    assert_eq!(rules[0].expression, "payload.amount > 5000");
    assert_eq!(rules[0].id, second.created);

    let calls = provisioner.api().calls().await;
    assert_eq!(
        calls,
        vec![
            "POST filtering high-value".to_string(),
            format!("DELETE filtering {}", first.created),
            "POST filtering high-value".to_string(),
        ]
    );
}

#[tokio::test]
async fn update_keeps_the_rule_id() {
    let provisioner = RuleProvisioner::new(MemoryRuleApi::new());
    let created = provisioner
        .create_filtering_rule(&NewFilteringRule::new(
            "completed-only",
            "payload.status == 'completed'",
        ))
        .await
        .expect("create")
        .created;

    provisioner
        .update_filtering_rule(&created, "payload.status != 'inactive'")
        .await
        .expect("update");

    let found = provisioner
        .find_filtering_rule("completed-only")
        .await
        .expect("lookup")
        .expect("rule present");
    assert_eq!(found.id, created);

    let rules = provisioner.api().filtering_rules().await;
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].expression, "payload.status != 'inactive'");
}

#[tokio::test]
async fn strict_lookup_surfaces_list_failures() {
    let provisioner = RuleProvisioner::new(MemoryRuleApi::new());
    provisioner
        .create_filtering_rule(&NewFilteringRule::new("high-value", "payload.amount > 1000"))
        .await
        .expect("seed rule");
    provisioner.api().fail_lookups(true).await;

    let err = provisioner
        .create_filtering_rule(&NewFilteringRule::new("high-value", "payload.amount > 10"))
        .await
        .expect_err("lookup fails");

    assert!(matches!(
        err,
        ProvisionError::Lookup {
            kind: RuleKind::Filtering,
            ..
        }
    ));
    assert_eq!(err.status(), Some(503));
    assert_eq!(provisioner.api().filtering_rules().await.len(), 1);
}

#[tokio::test]
async fn fail_open_lookup_creates_anyway() {
    let provisioner =
        RuleProvisioner::new(MemoryRuleApi::new()).with_lookup_policy(LookupPolicy::FailOpen);
    provisioner
        .create_filtering_rule(&NewFilteringRule::new("high-value", "payload.amount > 1000"))
        .await
        .expect("seed rule");
    provisioner.api().fail_lookups(true).await;

    let replacement = provisioner
        .create_filtering_rule(&NewFilteringRule::new("high-value", "payload.amount > 10"))
        .await
        .expect("created despite lookup failure");

    assert_eq!(replacement.deleted, None);
    // The existing rule could not be seen, so the name now exists twice.
    let rules = provisioner.api().filtering_rules().await;
    assert_eq!(rules.iter().filter(|r| r.name == "high-value").count(), 2);
}

#[tokio::test]
async fn rejected_create_surfaces_status_and_body() {
    let provisioner = RuleProvisioner::new(MemoryRuleApi::new());
    provisioner.api().reject_name("user-profile").await;

    let err = provisioner
        .create_enrichment_rule(&user_enrichment())
        .await
        .expect_err("rejected");

    match err {
        ProvisionError::Status { status, body, .. } => {
            assert_eq!(status, 400);
            assert!(body.contains("validation failed"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn provision_runs_the_whole_fixture_set() {
    let provisioner = RuleProvisioner::new(MemoryRuleApi::new());
    let rules = RuleSet {
        filtering: vec![
            NewFilteringRule::new("high-value", "payload.amount > 1000").with_priority(1),
            NewFilteringRule::new("usd-only", "payload.currency == 'USD'"),
        ],
        enrichment: vec![user_enrichment()],
        deduplication: dedup(),
    };

    let first = provisioner.provision(&rules).await.expect("first run");
    let second = provisioner.provision(&rules).await.expect("second run");

    assert_eq!(first.filtering.len(), 2);
    assert_eq!(first.enrichment.len(), 1);
    assert!(first.filtering.iter().all(|rule| rule.replaced.is_none()));
    assert!(second.filtering.iter().all(|rule| rule.replaced.is_some()));

    let api = provisioner.api();
    assert_eq!(api.filtering_rules().await.len(), 2);
    let enrichment = api.enrichment_rules().await;
    assert_eq!(enrichment.len(), 1);
    assert_eq!(enrichment[0].source_type, SourceType::Database);
    assert_eq!(
        enrichment[0].source_config,
        SourceConfig {
            database: Some("test_db".to_string()),
            collection: Some("user_profiles".to_string()),
            field: Some("_id".to_string()),
            ..SourceConfig::default()
        }
    );
    assert_eq!(provisioner.dedup_config().await.expect("dedup"), Some(dedup()));
}

#[tokio::test]
async fn invalid_fixtures_are_rejected_before_any_call() {
    let provisioner = RuleProvisioner::new(MemoryRuleApi::new());
    let rules = RuleSet {
        filtering: vec![
            NewFilteringRule::new("high-value", "payload.amount > 1000"),
            NewFilteringRule::new("high-value", "payload.amount > 10"),
        ],
        enrichment: Vec::new(),
        deduplication: dedup(),
    };

    let err = provisioner.provision(&rules).await.expect_err("duplicate names");
    assert!(matches!(err, ProvisionError::Invalid(_)));
    assert!(provisioner.api().calls().await.is_empty());
}

#[tokio::test]
async fn bundled_fixtures_provision_cleanly() {
    let fixtures = bundled_fixtures();
    let rules = fixtures.load_rule_set().expect("load bundled fixtures");
    let messages = fixtures.load_messages().expect("load fallback messages");
    assert!(!messages.is_empty());

    let provisioner = RuleProvisioner::new(MemoryRuleApi::new());
    let report = provisioner.provision(&rules).await.expect("provision");
    assert_eq!(report.filtering.len(), rules.filtering.len());
    assert_eq!(report.enrichment.len(), rules.enrichment.len());
}

#[test]
fn bundled_enrichment_rules_join_generated_data() {
    let rules = bundled_fixtures().load_rule_set().expect("load bundled fixtures");
    let dataset = DatasetEngine::new(GenerateOptions {
        seed: Some(11),
        ..GenerateOptions::default()
    })
    .generate(50)
    .expect("generate dataset");
    let key_values = dataset.key_values().expect("key-value bundle");
    assert!(!rules.enrichment.is_empty());

    for rule in &rules.enrichment {
        let mut joined = 0;
        for event in &dataset.events {
            let payload = serde_json::to_value(&event.payload).expect("encode payload");
            let Some(value) = payload.get(&rule.field_to_enrich).and_then(Value::as_str) else {
                continue;
            };
            let found = match rule.source_type {
                SourceType::Database => {
                    assert_eq!(rule.source_config.field.as_deref(), Some("_id"));
                    match rule.source_config.collection.as_deref() {
                        Some("user_profiles") => {
                            dataset.documents.users.iter().any(|user| user.id == value)
                        }
                        Some("products") => dataset
                            .documents
                            .products
                            .iter()
                            .any(|product| product.id == value),
                        other => panic!("unexpected collection {other:?}"),
                    }
                }
                SourceType::Cache => {
                    let pattern = rule.source_config.key_pattern.as_deref().expect("key pattern");
                    assert!(pattern.contains("{value}"));
                    key_values.get(&pattern.replace("{value}", value)).is_some()
                }
                SourceType::Api => panic!("no api-backed rules are bundled"),
            };
            assert!(found, "rule '{}' found no record for {value}", rule.name);
            joined += 1;
        }
        assert!(joined > 0, "rule '{}' matched no payload key", rule.name);
    }
}
