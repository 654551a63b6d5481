use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The two rule collections exposed by the rule API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Filtering,
    Enrichment,
}

impl RuleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleKind::Filtering => "filtering",
            RuleKind::Enrichment => "enrichment",
        }
    }

    /// Collection path relative to the API base URL.
    pub fn collection_path(self) -> String {
        format!("/api/v1/rules/{}", self.as_str())
    }

    pub fn item_path(self, id: &str) -> String {
        format!("/api/v1/rules/{}/{id}", self.as_str())
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while provisioning rules.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Listing existing rules failed, so the name could not be resolved.
    #[error("failed to look up existing {kind} rules: {source}")]
    Lookup {
        kind: RuleKind,
        #[source]
        source: Box<ProvisionError>,
    },
    /// The API answered with a non-2xx status.
    #[error("{operation} failed with status {status}: {body}")]
    Status {
        operation: String,
        status: u16,
        body: String,
    },
    #[error("{operation} returned an unexpected body: {source}")]
    Decode {
        operation: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid rule fixtures: {0}")]
    Invalid(#[from] pipeforge_core::Error),
    #[error("failed to read fixture {}: {source}", path.display())]
    FixtureIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode fixture {}: {source}", path.display())]
    FixtureJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ProvisionError {
    /// HTTP status carried by this error, looking through lookup wrappers.
    pub fn status(&self) -> Option<u16> {
        match self {
            ProvisionError::Status { status, .. } => Some(*status),
            ProvisionError::Lookup { source, .. } => source.status(),
            _ => None,
        }
    }
}
