use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use pipeforge_core::{
    CreatedResource, DeduplicationConfig, FilteringRuleUpdate, NewEnrichmentRule,
    NewFilteringRule, RuleSummary,
};

use crate::api::RuleApi;
use crate::errors::{ProvisionError, RuleKind};

pub const DEFAULT_API_URL: &str = "http://localhost:8084";
const DEDUP_CONFIG_PATH: &str = "/api/v1/config/deduplication";

/// [`RuleApi`] over HTTP/JSON.
#[derive(Debug, Clone)]
pub struct HttpRuleApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRuleApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ProvisionError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("pipeforge/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn list(&self, kind: RuleKind) -> Result<Vec<RuleSummary>, ProvisionError> {
        let operation = format!("list {kind} rules");
        let response = self.client.get(self.url(&kind.collection_path())).send().await?;
        let response = ensure_success(&operation, response).await?;

        let body: Value = response.json().await?;
        if !body.is_array() {
            debug!(
                event = "rules.list.not_a_list",
                kind = %kind,
                "treating non-list body as empty"
            );
            return Ok(Vec::new());
        }
        serde_json::from_value(body).map_err(|source| ProvisionError::Decode { operation, source })
    }

    async fn create<B: Serialize + Sync>(
        &self,
        kind: RuleKind,
        name: &str,
        body: &B,
    ) -> Result<CreatedResource, ProvisionError> {
        let operation = format!("create {kind} rule '{name}'");
        let response = self
            .client
            .post(self.url(&kind.collection_path()))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let payload = serde_json::to_string_pretty(body).unwrap_or_default();
            error!(
                event = "rules.create.rejected",
                kind = %kind,
                name,
                status = status.as_u16(),
                detail = %describe_error_body(&text),
                payload = %payload,
                "rule creation rejected"
            );
            return Err(ProvisionError::Status {
                operation,
                status: status.as_u16(),
                body: text,
            });
        }

        response
            .json::<CreatedResource>()
            .await
            .map_err(ProvisionError::from)
    }
}

#[async_trait]
impl RuleApi for HttpRuleApi {
    fn transport(&self) -> &'static str {
        "http"
    }

    async fn list_filtering_rules(&self) -> Result<Vec<RuleSummary>, ProvisionError> {
        self.list(RuleKind::Filtering).await
    }

    async fn create_filtering_rule(
        &self,
        rule: &NewFilteringRule,
    ) -> Result<CreatedResource, ProvisionError> {
        self.create(RuleKind::Filtering, &rule.name, rule).await
    }

    async fn update_filtering_rule(
        &self,
        id: &str,
        update: &FilteringRuleUpdate,
    ) -> Result<(), ProvisionError> {
        let response = self
            .client
            .put(self.url(&RuleKind::Filtering.item_path(id)))
            .json(update)
            .send()
            .await?;
        ensure_success(&format!("update filtering rule {id}"), response).await?;
        Ok(())
    }

    async fn list_enrichment_rules(&self) -> Result<Vec<RuleSummary>, ProvisionError> {
        self.list(RuleKind::Enrichment).await
    }

    async fn create_enrichment_rule(
        &self,
        rule: &NewEnrichmentRule,
    ) -> Result<CreatedResource, ProvisionError> {
        self.create(RuleKind::Enrichment, &rule.name, rule).await
    }

    async fn delete_rule(&self, kind: RuleKind, id: &str) -> Result<(), ProvisionError> {
        let response = self.client.delete(self.url(&kind.item_path(id))).send().await?;
        ensure_success(&format!("delete {kind} rule {id}"), response).await?;
        Ok(())
    }

    async fn put_dedup_config(&self, config: &DeduplicationConfig) -> Result<(), ProvisionError> {
        let response = self
            .client
            .put(self.url(DEDUP_CONFIG_PATH))
            .json(config)
            .send()
            .await?;
        ensure_success("update deduplication config", response).await?;
        Ok(())
    }

    async fn get_dedup_config(&self) -> Result<Option<DeduplicationConfig>, ProvisionError> {
        let response = self.client.get(self.url(DEDUP_CONFIG_PATH)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = ensure_success("get deduplication config", response).await?;
        Ok(Some(response.json().await?))
    }
}

async fn ensure_success(operation: &str, response: Response) -> Result<Response, ProvisionError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProvisionError::Status {
        operation: operation.to_string(),
        status: status.as_u16(),
        body,
    })
}

/// Summarize an API error body for logs.
///
/// Picks out `error`, `error_code`, `details.message` and `message` when the
/// body is a JSON object; otherwise returns the raw text.
pub fn describe_error_body(text: &str) -> String {
    let Ok(Value::Object(body)) = serde_json::from_str::<Value>(text) else {
        return format!("raw response: {}", text.trim());
    };

    let mut parts = Vec::new();
    for field in ["error", "error_code"] {
        if let Some(value) = body.get(field) {
            parts.push(format!("{field}={}", plain(value)));
        }
    }
    if let Some(message) = body.get("details").and_then(|details| details.get("message")) {
        parts.push(format!("validation={}", plain(message)));
    }
    if let Some(message) = body.get("message") {
        parts.push(format!("message={}", plain(message)));
    }

    if parts.is_empty() {
        Value::Object(body).to_string()
    } else {
        parts.join(", ")
    }
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
