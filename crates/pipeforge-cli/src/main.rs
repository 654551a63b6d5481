mod commands;
mod logging;
mod settings;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use thiserror::Error;

use commands::{
    GenerateArgs, LoadDocumentsArgs, LoadKeyValuesArgs, ObserveArgs, ProvisionArgs,
    run_generate, run_load_documents, run_load_key_values, run_observe, run_provision,
};
use logging::{LoggingError, init_logging};
use settings::{SettingsError, load_settings};

#[derive(Debug, Error)]
pub enum CliError {
    #[error("config error: {0}")]
    Settings(#[from] SettingsError),
    #[error("logging error: {0}")]
    Logging(#[from] LoggingError),
    #[error("generation error: {0}")]
    Generation(#[from] pipeforge_generate::GenerationError),
    #[error("artifact error: {0}")]
    Artifact(#[from] pipeforge_generate::ArtifactError),
    #[error("provisioning error: {0}")]
    Provision(#[from] pipeforge_provision::ProvisionError),
    #[error("publish error: {0}")]
    Publish(#[from] pipeforge_stream::PublishError),
    #[error("observe error: {0}")]
    Observe(#[from] pipeforge_stream::ObserveError),
    #[error("load error: {0}")]
    Load(#[from] pipeforge_load::LoadError),
}

#[derive(Parser, Debug)]
#[command(name = "pipeforge", version, about = "Pipeline demo tooling")]
struct Cli {
    /// Settings file (defaults to ./pipeforge.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Also write JSON logs to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate events plus the reference data they point at.
    Generate(GenerateArgs),
    /// Provision rules, then publish events to the input topic.
    Provision(ProvisionArgs),
    /// Load user profiles and products into the document store.
    LoadDocuments(LoadDocumentsArgs),
    /// Load users, products and orders into the key-value store.
    LoadKv(LoadKeyValuesArgs),
    /// Print processed envelopes from the output topic.
    Observe(ObserveArgs),
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Generate(_) => "generate",
            Command::Provision(_) => "provision",
            Command::LoadDocuments(_) => "load-documents",
            Command::LoadKv(_) => "load-kv",
            Command::Observe(_) => "observe",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;
    let settings = load_settings(cli.config.as_deref())?;

    let name = cli.command.name();
    let timer = Instant::now();
    tracing::info!(event = "command_started", command = name);

    let result = match cli.command {
        Command::Generate(args) => run_generate(args, &settings.generate),
        Command::Provision(args) => run_provision(args, &settings).await,
        Command::LoadDocuments(args) => run_load_documents(args, &settings).await,
        Command::LoadKv(args) => run_load_key_values(args, &settings).await,
        Command::Observe(args) => run_observe(args, &settings).await,
    };

    let duration_ms = timer.elapsed().as_millis() as u64;
    match &result {
        Ok(()) => tracing::info!(
            event = "command_finished",
            command = name,
            status = "success",
            duration_ms
        ),
        Err(err) => tracing::error!(
            event = "command_finished",
            command = name,
            status = "failed",
            duration_ms,
            error = %err
        ),
    }
    result
}
