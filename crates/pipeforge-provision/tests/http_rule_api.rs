use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;

use pipeforge_core::{DeduplicationConfig, NewEnrichmentRule, NewFilteringRule};
use pipeforge_provision::{HttpRuleApi, ProvisionError, RuleApi, RuleKind, RuleProvisioner};

fn api(server: &MockServer) -> HttpRuleApi {
    HttpRuleApi::new(server.base_url(), Duration::from_secs(5)).expect("build client")
}

#[tokio::test]
async fn create_replaces_rule_with_same_name() {
    let server = MockServer::start();
    let list = server.mock(|when, then| {
        when.method(GET).path("/api/v1/rules/filtering");
        then.status(200).json_body(json!([
            {"id": "old-1", "name": "high-value", "expression": "payload.amount > 1000",
             "priority": 10, "enabled": true},
            {"id": "other", "name": "usd-only", "expression": "payload.currency == 'USD'",
             "priority": 10, "enabled": true}
        ]));
    });
    let delete = server.mock(|when, then| {
        when.method(DELETE).path("/api/v1/rules/filtering/old-1");
        then.status(204);
    });
    let create = server.mock(|when, then| {
        when.method(POST)
            .path("/api/v1/rules/filtering")
            .json_body(json!({
                "name": "high-value",
                "expression": "payload.amount > 5000",
                "priority": 10,
                "enabled": true
            }));
        then.status(201).json_body(json!({"id": "new-2"}));
    });

    let provisioner = RuleProvisioner::new(api(&server));
    let replacement = provisioner
        .create_filtering_rule(&NewFilteringRule::new("high-value", "payload.amount > 5000"))
        .await
        .expect("create");

    assert_eq!(replacement.deleted.as_deref(), Some("old-1"));
    assert_eq!(replacement.created, "new-2");
    list.assert();
    delete.assert();
    create.assert();
}

#[tokio::test]
async fn enrichment_lookup_tolerates_loose_listings() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/v1/rules/enrichment");
        then.status(200).json_body(json!([
            {"id": "legacy", "name": "geo-lookup", "field_to_enrich": "ip",
             "source_type": "graphql", "source_config": null, "transformations": null,
             "error_handling": "retry", "priority": 5, "enabled": true},
            {"id": "old-user", "name": "user-profile", "field_to_enrich": "user_id",
             "source_type": "database",
             "source_config": {"database": "test_db", "collection": "user_profiles",
                               "field": "_id"},
             "transformations": null, "cache_ttl_seconds": 300,
             "error_handling": "skip_field", "priority": 1, "enabled": true}
        ]));
    });
    let delete = server.mock(|when, then| {
        when.method(DELETE).path("/api/v1/rules/enrichment/old-user");
        then.status(204);
    });
    let create = server.mock(|when, then| {
        when.method(POST).path("/api/v1/rules/enrichment");
        then.status(201).json_body(json!({"id": "new-user"}));
    });

    let rule: NewEnrichmentRule = serde_json::from_value(json!({
        "name": "user-profile",
        "field_to_enrich": "user_id",
        "source_type": "database",
        "source_config": {"database": "test_db", "collection": "user_profiles", "field": "_id"}
    }))
    .expect("decode enrichment rule");

    let replacement = RuleProvisioner::new(api(&server))
        .create_enrichment_rule(&rule)
        .await
        .expect("create despite loose listing");

    assert_eq!(replacement.deleted.as_deref(), Some("old-user"));
    assert_eq!(replacement.created, "new-user");
    delete.assert();
    create.assert();
}

#[tokio::test]
async fn non_list_body_is_treated_as_empty() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/v1/rules/enrichment");
        then.status(200).json_body(json!({"rules": null}));
    });

    let rules = api(&server)
        .list_enrichment_rules()
        .await
        .expect("list");
    assert!(rules.is_empty());
}

#[tokio::test]
async fn creation_failure_carries_status_and_body() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/v1/rules/filtering");
        then.status(200).json_body(json!([]));
    });
    server.mock(|when, then| {
        when.method(POST).path("/api/v1/rules/filtering");
        then.status(422).json_body(json!({
            "error": "validation failed",
            "error_code": "INVALID_EXPRESSION",
            "details": {"message": "unexpected token '>'"}
        }));
    });

    let err = RuleProvisioner::new(api(&server))
        .create_filtering_rule(&NewFilteringRule::new("broken", "> >"))
        .await
        .expect_err("rejected");

    match err {
        ProvisionError::Status {
            operation,
            status,
            body,
        } => {
            assert_eq!(status, 422);
            assert!(operation.contains("broken"));
            assert!(body.contains("INVALID_EXPRESSION"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn strict_lookup_wraps_list_status() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/v1/rules/filtering");
        then.status(500).body("boom");
    });
    let create = server.mock(|when, then| {
        when.method(POST).path("/api/v1/rules/filtering");
        then.status(201).json_body(json!({"id": "never"}));
    });

    let err = RuleProvisioner::new(api(&server))
        .create_filtering_rule(&NewFilteringRule::new("high-value", "payload.amount > 1"))
        .await
        .expect_err("lookup failed");

    assert!(matches!(
        err,
        ProvisionError::Lookup {
            kind: RuleKind::Filtering,
            ..
        }
    ));
    assert_eq!(err.status(), Some(500));
    assert_eq!(create.hits(), 0);
}

#[tokio::test]
async fn update_and_dedup_endpoints() {
    let server = MockServer::start();
    let update = server.mock(|when, then| {
        when.method(PUT)
            .path("/api/v1/rules/filtering/rule-7")
            .json_body(json!({"expression": "payload.amount > 1"}));
        then.status(200);
    });
    let config = DeduplicationConfig {
        hash_algorithm: "sha256".to_string(),
        ttl_seconds: 600,
        on_redis_error: "allow".to_string(),
        fields_to_hash: vec!["id".to_string()],
    };
    let put_dedup = server.mock(|when, then| {
        when.method(PUT)
            .path("/api/v1/config/deduplication")
            .json_body(serde_json::to_value(&config).expect("encode config"));
        then.status(200);
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/v1/config/deduplication");
        then.status(200)
            .json_body(serde_json::to_value(&config).expect("encode config"));
    });

    let provisioner = RuleProvisioner::new(api(&server));
    provisioner
        .update_filtering_rule("rule-7", "payload.amount > 1")
        .await
        .expect("update");
    provisioner.configure_dedup(&config).await.expect("put dedup");
    let fetched = provisioner.dedup_config().await.expect("get dedup");

    update.assert();
    put_dedup.assert();
    assert_eq!(fetched, Some(config));
}

#[tokio::test]
async fn delete_of_unknown_rule_fails() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(DELETE).path("/api/v1/rules/enrichment/ghost");
        then.status(404).body("not found");
    });

    let err = api(&server)
        .delete_rule(RuleKind::Enrichment, "ghost")
        .await
        .expect_err("404");
    assert_eq!(err.status(), Some(404));
}
