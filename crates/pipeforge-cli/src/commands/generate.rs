use std::path::PathBuf;

use clap::Args;

use pipeforge_generate::{DatasetEngine, GenerateOptions};

use crate::CliError;
use crate::settings::GenerateSettings;

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Number of events to generate.
    #[arg(long, short = 'n')]
    pub count: Option<usize>,
    /// Output directory for the artifacts.
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
    /// Seed for reproducible output.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Probability that an event carries a product_id.
    #[arg(long)]
    pub product_rate: Option<f64>,
}

pub fn run_generate(args: GenerateArgs, settings: &GenerateSettings) -> Result<(), CliError> {
    let count = args.count.unwrap_or(settings.count);
    let options = GenerateOptions {
        out_dir: args.out_dir.unwrap_or_else(|| settings.out_dir.clone()),
        seed: args.seed.or(settings.seed),
        base_time: None,
        product_rate: args.product_rate.unwrap_or(settings.product_rate),
        id_space: settings.id_space,
    };

    let engine = DatasetEngine::new(options);
    println!("Generating {count} messages (seed {})...", engine.seed());
    let result = engine.run(count)?;
    let report = &result.report;

    println!(
        "Generated {} messages -> {}",
        report.events,
        result.paths.messages().display()
    );
    println!(
        "Generated {} users and {} products -> {}",
        report.users,
        report.products,
        result.paths.documents().display()
    );
    println!(
        "Generated {} key-value entries ({} orders) -> {}",
        report.key_value_entries,
        report.orders,
        result.paths.key_values().display()
    );
    if report.duplicate_event_ids > 0 {
        println!("Note: {} duplicate event ids", report.duplicate_event_ids);
    }
    println!("\nData generation completed!");
    Ok(())
}
