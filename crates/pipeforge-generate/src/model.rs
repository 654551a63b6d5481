use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::generators::IdSpace;

/// Options for the dataset engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Directory where artifacts are written.
    pub out_dir: PathBuf,
    /// Seed for the run; a random one is drawn (and reported) when unset.
    pub seed: Option<u64>,
    /// Reference time for `created_at`; defaults to the current time.
    pub base_time: Option<DateTime<Utc>>,
    /// Probability that an event carries a `product_id`.
    pub product_rate: f64,
    pub id_space: IdSpace,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("generated"),
            seed: None,
            base_time: None,
            product_rate: 0.5,
            id_space: IdSpace::default(),
        }
    }
}

/// Report written next to the artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub run_id: String,
    pub seed: u64,
    pub base_time: DateTime<Utc>,
    pub events: u64,
    pub users: u64,
    pub products: u64,
    pub orders: u64,
    pub key_value_entries: u64,
    /// Events whose `id` repeats an earlier one.
    pub duplicate_event_ids: u64,
    pub bytes_written: u64,
    pub duration_ms: u64,
}
