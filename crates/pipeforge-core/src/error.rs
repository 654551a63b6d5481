use thiserror::Error;

/// Core error type shared across pipeforge crates.
#[derive(Debug, Error)]
pub enum Error {
    /// A rule fixture set violates the provisioning invariants.
    #[error("invalid fixture: {0}")]
    InvalidFixture(String),
    /// A reference record could not be encoded for a store.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias for results returned by pipeforge crates.
pub type Result<T> = std::result::Result<T, Error>;
