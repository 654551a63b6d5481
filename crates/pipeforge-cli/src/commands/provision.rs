use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use tracing::{info, warn};

use pipeforge_core::{Envelope, RuleSet};
use pipeforge_generate::ArtifactPaths;
use pipeforge_provision::{
    FixtureDir, HttpRuleApi, LookupPolicy, MemoryRuleApi, RuleApi, RuleProvisioner,
};
use pipeforge_stream::{EventPublisher, EventSink, FlushPolicy, KafkaSink, MemorySink};

use crate::CliError;
use crate::settings::Settings;

#[derive(Args, Debug)]
pub struct ProvisionArgs {
    /// Base URL of the rule-management API.
    #[arg(long)]
    pub api_url: Option<String>,
    /// Directory holding filtering.json, enrichment.json, deduplication.json
    /// and the fallback messages.json.
    #[arg(long)]
    pub fixtures_dir: Option<PathBuf>,
    /// Directory with generated artifacts.
    #[arg(long)]
    pub generated_dir: Option<PathBuf>,
    /// Treat rule lookup failures as "rule absent" instead of failing.
    #[arg(long, default_value_t = false)]
    pub fail_open: bool,
    /// Flush every N messages instead of after each one.
    #[arg(long, value_name = "N")]
    pub batch: Option<usize>,
    /// Milliseconds to wait between provisioning and publishing.
    #[arg(long)]
    pub propagation_wait_ms: Option<u64>,
    /// Only provision rules; publish nothing.
    #[arg(long, default_value_t = false)]
    pub skip_publish: bool,
    /// Run against in-memory rule API and sink instead of the network.
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

pub async fn run_provision(args: ProvisionArgs, settings: &Settings) -> Result<(), CliError> {
    let fixtures = FixtureDir::new(
        args.fixtures_dir
            .clone()
            .unwrap_or_else(|| settings.rules.fixtures_dir.clone()),
    );
    let generated = ArtifactPaths::new(
        args.generated_dir
            .clone()
            .unwrap_or_else(|| settings.generate.out_dir.clone()),
    );

    let rules = fixtures.load_rule_set()?;
    let messages = resolve_messages(&generated, &fixtures)?;

    let policy = if args.fail_open {
        LookupPolicy::FailOpen
    } else {
        settings.rules.lookup_policy
    };
    let flush_policy = args
        .batch
        .map(FlushPolicy::Batch)
        .unwrap_or(settings.kafka.flush_policy);
    let wait = if args.dry_run {
        Duration::ZERO
    } else {
        Duration::from_millis(
            args.propagation_wait_ms
                .unwrap_or(settings.rules.propagation_wait_ms),
        )
    };
    let plan = Plan {
        rules,
        messages,
        wait,
        publish: !args.skip_publish,
    };

    if args.dry_run {
        info!(event = "provision.dry_run", "using in-memory rule API and sink");
        let provisioner = RuleProvisioner::new(MemoryRuleApi::new()).with_lookup_policy(policy);
        let publisher = EventPublisher::new(MemorySink::new(), flush_policy);
        return execute(provisioner, publisher, plan).await;
    }

    let api_url = args.api_url.unwrap_or_else(|| settings.rules.api_url.clone());
    let api = HttpRuleApi::new(
        api_url,
        Duration::from_millis(settings.rules.request_timeout_ms),
    )?;
    let provisioner = RuleProvisioner::new(api).with_lookup_policy(policy);
    let sink = KafkaSink::new(&settings.kafka)?;
    let publisher = EventPublisher::new(sink, flush_policy);
    execute(provisioner, publisher, plan).await
}

struct Plan {
    rules: RuleSet,
    messages: Vec<Envelope>,
    wait: Duration,
    publish: bool,
}

/// Generated events when present, else the fixture events.
fn resolve_messages(
    generated: &ArtifactPaths,
    fixtures: &FixtureDir,
) -> Result<Vec<Envelope>, CliError> {
    match generated.load_events() {
        Ok(events) => Ok(events),
        Err(err) if err.is_missing() => {
            info!(
                event = "provision.fixture_messages",
                path = %fixtures.root().display(),
                "no generated messages; using fixtures"
            );
            Ok(fixtures.load_messages()?)
        }
        Err(err) => Err(err.into()),
    }
}

async fn execute<A, S>(
    provisioner: RuleProvisioner<A>,
    mut publisher: EventPublisher<S>,
    plan: Plan,
) -> Result<(), CliError>
where
    A: RuleApi,
    S: EventSink,
{
    println!("=== Setting up rules ({}) ===", provisioner.api().transport());
    let report = provisioner.provision(&plan.rules).await?;
    for rule in &report.filtering {
        println!("  Created filtering rule: {} (ID: {})", rule.name, rule.id);
    }
    for rule in &report.enrichment {
        println!("  Created enrichment rule: {} (ID: {})", rule.name, rule.id);
    }
    println!(
        "  Configured deduplication: hash={}, TTL={}s",
        report.deduplication.hash_algorithm, report.deduplication.ttl_seconds
    );

    if !plan.publish {
        return Ok(());
    }

    if !plan.wait.is_zero() {
        println!("\n=== Waiting for rules to propagate ===");
        tokio::time::sleep(plan.wait).await;
    }

    println!("\n=== Sending payment-service messages ===");
    let total = plan.messages.len();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    for (index, message) in plan.messages.into_iter().enumerate() {
        let sent = tokio::select! {
            _ = &mut ctrl_c => {
                warn!(event = "publish.interrupted", sent = index, total, "interrupted");
                println!("\nInterrupted; flushing sent messages...");
                break;
            }
            sent = publisher.publish(message) => sent?,
        };
        let payload = &sent.payload;
        let product = payload
            .product_id
            .as_deref()
            .map(|id| format!(", product_id: {id}"))
            .unwrap_or_default();
        println!(
            "  [{}/{total}] Sent: {} (order_id: {}, amount: {}, status: {}{product})",
            index + 1,
            sent.id,
            payload.order_id,
            payload.amount,
            payload.status
        );
    }

    publisher.close().await?;
    println!("\n=== Demo completed ===");
    println!("Check `pipeforge observe` output for processed messages.");
    Ok(())
}
