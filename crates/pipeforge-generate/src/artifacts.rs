use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

use pipeforge_core::{DocumentBundle, Envelope, KeyValueBundle};

pub const MESSAGES_FILE: &str = "messages.json";
pub const DOCUMENTS_FILE: &str = "documents.json";
pub const KEY_VALUE_FILE: &str = "kv.json";
pub const REPORT_FILE: &str = "generation_report.json";

/// Errors raised while reading persisted artifacts.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// The artifact was never generated. Callers report this as an
    /// instruction to run generation first rather than as a failure.
    #[error("artifact not found: {}", path.display())]
    Missing { path: PathBuf },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ArtifactError {
    pub fn is_missing(&self) -> bool {
        matches!(self, ArtifactError::Missing { .. })
    }
}

/// Locations of the three generated artifacts and the run report.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub root: PathBuf,
}

impl ArtifactPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn messages(&self) -> PathBuf {
        self.root.join(MESSAGES_FILE)
    }

    pub fn documents(&self) -> PathBuf {
        self.root.join(DOCUMENTS_FILE)
    }

    pub fn key_values(&self) -> PathBuf {
        self.root.join(KEY_VALUE_FILE)
    }

    pub fn report(&self) -> PathBuf {
        self.root.join(REPORT_FILE)
    }

    pub fn load_events(&self) -> Result<Vec<Envelope>, ArtifactError> {
        read_json(&self.messages())
    }

    pub fn load_documents(&self) -> Result<DocumentBundle, ArtifactError> {
        read_json(&self.documents())
    }

    pub fn load_key_values(&self) -> Result<KeyValueBundle, ArtifactError> {
        read_json(&self.key_values())
    }
}

/// Decode a JSON file, distinguishing "not there" from "unreadable".
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(ArtifactError::Missing {
                path: path.to_path_buf(),
            });
        }
        Err(source) => {
            return Err(ArtifactError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_str(&contents).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_artifacts_are_reported_as_missing() {
        let dir = std::env::temp_dir().join(format!("pipeforge_missing_{}", uuid::Uuid::new_v4()));
        let paths = ArtifactPaths::new(&dir);

        let err = paths.load_documents().expect_err("nothing generated yet");
        assert!(err.is_missing());
        assert!(err.to_string().contains(DOCUMENTS_FILE));
    }

    #[test]
    fn malformed_artifacts_are_decode_errors() {
        let dir = std::env::temp_dir().join(format!("pipeforge_bad_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("create dir");
        std::fs::write(dir.join(KEY_VALUE_FILE), "[1, 2").expect("write garbage");

        let err = ArtifactPaths::new(&dir)
            .load_key_values()
            .expect_err("truncated json");
        assert!(matches!(err, ArtifactError::Json { .. }));
    }
}
