use clap::Args;
use tracing::warn;

use pipeforge_stream::{EnvelopeObserver, render_envelope};

use crate::CliError;
use crate::settings::Settings;

#[derive(Args, Debug)]
pub struct ObserveArgs {
    /// Topic carrying processed envelopes.
    #[arg(long)]
    pub topic: Option<String>,
    /// Consumer group id.
    #[arg(long)]
    pub group: Option<String>,
}

pub async fn run_observe(args: ObserveArgs, settings: &Settings) -> Result<(), CliError> {
    let mut config = settings.kafka.clone();
    if let Some(topic) = args.topic {
        config.output_topic = topic;
    }
    if let Some(group) = args.group {
        config.consumer_group = group;
    }

    let observer = EnvelopeObserver::new(&config)?;
    println!("Consuming from topic: {}", observer.topic());
    println!("Waiting for messages...\n");

    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(
                event = "observe.signal_unavailable",
                error = %err,
                "cannot listen for ctrl-c; stopping observer"
            );
        }
    };
    observer
        .run(shutdown, |envelope| println!("{}", render_envelope(envelope)))
        .await?;

    println!("\nStopping consumer...");
    Ok(())
}
