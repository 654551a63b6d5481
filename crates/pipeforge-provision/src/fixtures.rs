use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use pipeforge_core::{
    DeduplicationConfig, Envelope, NewEnrichmentRule, NewFilteringRule, RuleSet,
};

use crate::errors::ProvisionError;

pub const FILTERING_FIXTURE: &str = "filtering.json";
pub const ENRICHMENT_FIXTURE: &str = "enrichment.json";
pub const DEDUPLICATION_FIXTURE: &str = "deduplication.json";
pub const MESSAGES_FIXTURE: &str = "messages.json";

/// Rule fixtures and fallback messages read from a fixtures directory.
#[derive(Debug, Clone)]
pub struct FixtureDir {
    root: PathBuf,
}

impl FixtureDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filtering, enrichment and deduplication fixtures as one set.
    /// A missing `enrichment.json` means no enrichment rules.
    pub fn load_rule_set(&self) -> Result<RuleSet, ProvisionError> {
        let filtering: Vec<NewFilteringRule> = read_fixture(&self.root.join(FILTERING_FIXTURE))?;
        let enrichment_path = self.root.join(ENRICHMENT_FIXTURE);
        let enrichment: Vec<NewEnrichmentRule> = if enrichment_path.exists() {
            read_fixture(&enrichment_path)?
        } else {
            Vec::new()
        };
        let deduplication: DeduplicationConfig =
            read_fixture(&self.root.join(DEDUPLICATION_FIXTURE))?;

        Ok(RuleSet {
            filtering,
            enrichment,
            deduplication,
        })
    }

    /// Fallback events used when nothing has been generated yet.
    pub fn load_messages(&self) -> Result<Vec<Envelope>, ProvisionError> {
        read_fixture(&self.root.join(MESSAGES_FIXTURE))
    }
}

fn read_fixture<T: DeserializeOwned>(path: &Path) -> Result<T, ProvisionError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ProvisionError::FixtureIo {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ProvisionError::FixtureJson {
        path: path.to_path_buf(),
        source,
    })
}
