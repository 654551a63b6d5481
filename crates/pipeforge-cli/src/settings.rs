use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pipeforge_generate::IdSpace;
use pipeforge_load::{DEFAULT_DATABASE, DEFAULT_MONGO_URI, DEFAULT_REDIS_URL};
use pipeforge_provision::{DEFAULT_API_URL, LookupPolicy};
use pipeforge_stream::KafkaConfig;

pub const DEFAULT_SETTINGS_FILE: &str = "pipeforge.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("config file not found: {}", .0.display())]
    Missing(PathBuf),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Contents of `pipeforge.toml`. Every section and key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub generate: GenerateSettings,
    pub rules: RuleSettings,
    pub kafka: KafkaConfig,
    pub documents: DocumentSettings,
    pub kv: KeyValueSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateSettings {
    pub out_dir: PathBuf,
    pub count: usize,
    pub seed: Option<u64>,
    pub product_rate: f64,
    pub id_space: IdSpace,
}

impl Default for GenerateSettings {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("generated"),
            count: 20,
            seed: None,
            product_rate: 0.5,
            id_space: IdSpace::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSettings {
    pub api_url: String,
    pub fixtures_dir: PathBuf,
    pub lookup_policy: LookupPolicy,
    pub request_timeout_ms: u64,
    /// Pause between provisioning and publishing so the pipeline can pick
    /// up the new rules.
    pub propagation_wait_ms: u64,
}

impl Default for RuleSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            fixtures_dir: PathBuf::from("fixtures"),
            lookup_policy: LookupPolicy::default(),
            request_timeout_ms: 10_000,
            propagation_wait_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentSettings {
    pub uri: String,
    pub database: String,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            uri: DEFAULT_MONGO_URI.to_string(),
            database: DEFAULT_DATABASE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyValueSettings {
    pub url: String,
}

impl Default for KeyValueSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_REDIS_URL.to_string(),
        }
    }
}

/// Load settings from `explicit`, which must exist, or from
/// `pipeforge.toml` in the working directory when present. Falls back to
/// defaults otherwise.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings, SettingsError> {
    let path = match explicit {
        Some(path) if !path.exists() => return Err(SettingsError::Missing(path.to_path_buf())),
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_SETTINGS_FILE);
            if !default.exists() {
                return Ok(Settings::default());
            }
            default
        }
    };

    let content = std::fs::read_to_string(&path).map_err(|source| SettingsError::Io {
        path: path.clone(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| SettingsError::Toml { path, source })
}
