use std::path::PathBuf;

use clap::Args;

use pipeforge_core::redact_connection_string;
use pipeforge_generate::{ArtifactError, ArtifactPaths};
use pipeforge_load::{
    DocumentStore, KeyValueStore, MemoryDocumentStore, MemoryKeyValueStore, MongoDocumentStore,
    PRODUCTS_COLLECTION, RedisKeyValueStore, USER_PROFILES_COLLECTION, load_documents,
    load_key_values,
};

use crate::CliError;
use crate::settings::Settings;

#[derive(Args, Debug)]
pub struct LoadDocumentsArgs {
    /// MongoDB connection URI.
    #[arg(long)]
    pub uri: Option<String>,
    /// Target database.
    #[arg(long)]
    pub database: Option<String>,
    /// Directory with generated artifacts.
    #[arg(long)]
    pub generated_dir: Option<PathBuf>,
    /// Load into an in-memory store instead of MongoDB.
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct LoadKeyValuesArgs {
    /// Redis connection URL.
    #[arg(long)]
    pub url: Option<String>,
    /// Directory with generated artifacts.
    #[arg(long)]
    pub generated_dir: Option<PathBuf>,
    /// Load into an in-memory store instead of Redis.
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

pub async fn run_load_documents(
    args: LoadDocumentsArgs,
    settings: &Settings,
) -> Result<(), CliError> {
    let paths = artifact_paths(args.generated_dir, settings);
    let Some(bundle) = guard_missing(paths.load_documents())? else {
        return Ok(());
    };

    let uri = args.uri.unwrap_or_else(|| settings.documents.uri.clone());
    let database = args
        .database
        .unwrap_or_else(|| settings.documents.database.clone());

    let store: Box<dyn DocumentStore> = if args.dry_run {
        Box::new(MemoryDocumentStore::new())
    } else {
        Box::new(MongoDocumentStore::connect(&uri, &database).await?)
    };

    println!(
        "Loading data into {}: {}/{database}",
        store.backend(),
        redact_connection_string(&uri)
    );
    let report = load_documents(store.as_ref(), &bundle).await?;
    println!(
        "  Loaded {} users into {USER_PROFILES_COLLECTION} collection",
        report.count(USER_PROFILES_COLLECTION)
    );
    println!(
        "  Loaded {} products into {PRODUCTS_COLLECTION} collection",
        report.count(PRODUCTS_COLLECTION)
    );
    println!("Documents loaded successfully");
    Ok(())
}

pub async fn run_load_key_values(
    args: LoadKeyValuesArgs,
    settings: &Settings,
) -> Result<(), CliError> {
    let paths = artifact_paths(args.generated_dir, settings);
    let Some(bundle) = guard_missing(paths.load_key_values())? else {
        return Ok(());
    };

    let url = args.url.unwrap_or_else(|| settings.kv.url.clone());
    let store: Box<dyn KeyValueStore> = if args.dry_run {
        Box::new(MemoryKeyValueStore::new())
    } else {
        Box::new(RedisKeyValueStore::connect(&url).await?)
    };

    println!(
        "Loading data into {}: {}",
        store.backend(),
        redact_connection_string(&url)
    );
    let report = load_key_values(store.as_ref(), &bundle).await?;
    println!("Loaded {} keys", report.writes);
    println!("Key-value data loaded successfully");
    Ok(())
}

fn artifact_paths(generated_dir: Option<PathBuf>, settings: &Settings) -> ArtifactPaths {
    ArtifactPaths::new(generated_dir.unwrap_or_else(|| settings.generate.out_dir.clone()))
}

/// A missing artifact is not a failure: tell the operator how to produce it.
fn guard_missing<T>(loaded: Result<T, ArtifactError>) -> Result<Option<T>, CliError> {
    match loaded {
        Ok(value) => Ok(Some(value)),
        Err(ArtifactError::Missing { path }) => {
            println!("Data file not found: {}", path.display());
            println!("   Run `pipeforge generate` first to generate data.");
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}
