use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::time::Instant;

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

use pipeforge_core::{DocumentBundle, Envelope, KeyValueBundle, OrderExtension};

use crate::artifacts::ArtifactPaths;
use crate::correlate::{ReferenceKeys, verify_closure};
use crate::errors::GenerationError;
use crate::generators::{self, FieldContext};
use crate::model::{GenerateOptions, GenerationReport};
use crate::output::write_json_atomic;

/// Events plus the reference datasets derived from them.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub events: Vec<Envelope>,
    pub documents: DocumentBundle,
    pub orders: BTreeMap<String, OrderExtension>,
}

impl Dataset {
    /// Flat `<entity>:<id>` view for the key-value store.
    pub fn key_values(&self) -> Result<KeyValueBundle, GenerationError> {
        Ok(KeyValueBundle::from_parts(&self.documents, &self.orders)?)
    }

    pub fn reference_keys(&self) -> ReferenceKeys {
        ReferenceKeys::from_events(&self.events)
    }

    /// Events whose `id` repeats an earlier one. Ids come from a bounded
    /// space so collisions are expected, not prevented.
    pub fn duplicate_event_ids(&self) -> u64 {
        let mut seen = HashSet::new();
        self.events
            .iter()
            .filter(|event| !seen.insert(event.id.as_str()))
            .count() as u64
    }
}

/// Result of a persisted generation run.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub paths: ArtifactPaths,
    pub dataset: Dataset,
    pub report: GenerationReport,
}

/// Entry point for generating correlated datasets.
#[derive(Debug, Clone)]
pub struct DatasetEngine {
    options: GenerateOptions,
    seed: u64,
    base_time: DateTime<Utc>,
}

impl DatasetEngine {
    /// Resolves the seed and base time once so every call to
    /// [`DatasetEngine::generate`] on this engine yields the same dataset.
    pub fn new(options: GenerateOptions) -> Self {
        let seed = options.seed.unwrap_or_else(rand::random);
        let base_time = options.base_time.unwrap_or_else(Utc::now);
        Self {
            options,
            seed,
            base_time,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn base_time(&self) -> DateTime<Utc> {
        self.base_time
    }

    /// Generate `count` events and their reference datasets. No I/O.
    pub fn generate(&self, count: usize) -> Result<Dataset, GenerationError> {
        self.validate(count)?;

        let ctx = FieldContext {
            id_space: self.options.id_space,
            base_time: self.base_time,
            product_rate: self.options.product_rate,
        };

        let mut rng = ChaCha8Rng::seed_from_u64(hash_seed(self.seed, "events"));
        let events = (0..count)
            .map(|_| generators::payment_envelope(&mut rng, &ctx))
            .collect();

        Ok(self.derive_references(events))
    }

    /// Synthesize exactly one reference record per distinct identifier the
    /// events reference.
    pub fn derive_references(&self, events: Vec<Envelope>) -> Dataset {
        let keys = ReferenceKeys::from_events(&events);

        // Each record gets its own stream so it depends only on its id.
        let users = keys
            .user_ids
            .iter()
            .map(|id| generators::user_profile(&mut self.record_rng("user", id), id))
            .collect();
        let products = keys
            .product_ids
            .iter()
            .map(|id| generators::product(&mut self.record_rng("product", id), id))
            .collect();
        let orders = keys
            .order_ids
            .iter()
            .map(|id| {
                let order = generators::order_extension(&mut self.record_rng("order", id));
                (id.clone(), order)
            })
            .collect();

        Dataset {
            events,
            documents: DocumentBundle { users, products },
            orders,
        }
    }

    /// Generate, verify the closure invariant, and persist the artifacts.
    pub fn run(&self, count: usize) -> Result<GenerationResult, GenerationError> {
        let start = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();

        info!(
            run_id = %run_id,
            count,
            seed = self.seed,
            out_dir = %self.options.out_dir.display(),
            "generation started"
        );

        let dataset = self.generate(count)?;
        verify_closure(&dataset)?;
        let key_values = dataset.key_values()?;

        let duplicate_event_ids = dataset.duplicate_event_ids();
        if duplicate_event_ids > 0 {
            warn!(
                run_id = %run_id,
                duplicates = duplicate_event_ids,
                "event ids collided; widen the message id space to reduce duplicates"
            );
        }

        let paths = ArtifactPaths::new(self.options.out_dir.clone());
        let mut bytes_written = write_json_atomic(&paths.messages(), &dataset.events)?;
        info!(
            path = %paths.messages().display(),
            events = dataset.events.len(),
            "messages written"
        );

        bytes_written += write_json_atomic(&paths.documents(), &dataset.documents)?;
        info!(
            path = %paths.documents().display(),
            users = dataset.documents.users.len(),
            products = dataset.documents.products.len(),
            "documents written"
        );

        bytes_written += write_json_atomic(&paths.key_values(), &key_values)?;
        info!(
            path = %paths.key_values().display(),
            keys = key_values.len(),
            orders = dataset.orders.len(),
            "key-value entries written"
        );

        let report = GenerationReport {
            run_id: run_id.clone(),
            seed: self.seed,
            base_time: self.base_time,
            events: dataset.events.len() as u64,
            users: dataset.documents.users.len() as u64,
            products: dataset.documents.products.len() as u64,
            orders: dataset.orders.len() as u64,
            key_value_entries: key_values.len() as u64,
            duplicate_event_ids,
            bytes_written,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        write_json_atomic(&paths.report(), &report)?;

        info!(
            run_id = %run_id,
            duration_ms = report.duration_ms,
            bytes_written = report.bytes_written,
            "generation completed"
        );

        Ok(GenerationResult {
            paths,
            dataset,
            report,
        })
    }

    pub fn out_dir(&self) -> &PathBuf {
        &self.options.out_dir
    }

    fn validate(&self, count: usize) -> Result<(), GenerationError> {
        if count == 0 {
            return Err(GenerationError::InvalidOptions(
                "event count must be positive".to_string(),
            ));
        }
        let rate = self.options.product_rate;
        if !(0.0..=1.0).contains(&rate) {
            return Err(GenerationError::InvalidOptions(format!(
                "product_rate must be within [0, 1], got {rate}"
            )));
        }
        if !self.options.id_space.is_valid() {
            return Err(GenerationError::InvalidOptions(
                "id space bounds must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn record_rng(&self, entity: &str, id: &str) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(hash_seed(self.seed, &format!("{entity}:{id}")))
    }
}

fn hash_seed(seed: u64, key: &str) -> u64 {
    let mut hash = seed ^ 0xcbf29ce484222325;
    for byte in key.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_seed_separates_streams() {
        assert_ne!(hash_seed(7, "events"), hash_seed(7, "user:user-1"));
        assert_eq!(hash_seed(7, "events"), hash_seed(7, "events"));
        assert_ne!(hash_seed(7, "events"), hash_seed(8, "events"));
    }

    #[test]
    fn rejects_empty_runs_and_bad_rates() {
        let engine = DatasetEngine::new(GenerateOptions {
            seed: Some(1),
            ..GenerateOptions::default()
        });
        assert!(matches!(
            engine.generate(0),
            Err(GenerationError::InvalidOptions(_))
        ));

        let engine = DatasetEngine::new(GenerateOptions {
            seed: Some(1),
            product_rate: 1.5,
            ..GenerateOptions::default()
        });
        assert!(matches!(
            engine.generate(3),
            Err(GenerationError::InvalidOptions(_))
        ));
    }
}
