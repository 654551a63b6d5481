//! Correlated synthetic-dataset generation for pipeforge.
//!
//! Produces payment event envelopes plus the reference datasets (profiles,
//! products, order extensions) the external pipeline joins them against,
//! and persists both as JSON artifacts.

pub mod artifacts;
pub mod correlate;
pub mod engine;
pub mod errors;
pub mod generators;
pub mod model;
pub mod output;

pub use artifacts::{ArtifactError, ArtifactPaths};
pub use correlate::{ReferenceKeys, verify_closure};
pub use engine::{Dataset, DatasetEngine, GenerationResult};
pub use errors::GenerationError;
pub use generators::{FieldContext, IdSpace};
pub use model::{GenerateOptions, GenerationReport};
