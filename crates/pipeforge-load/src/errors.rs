use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("document store error: {0}")]
    Mongo(#[from] mongodb::error::Error),
    #[error("failed to convert document '{id}': {source}")]
    Bson {
        id: String,
        #[source]
        source: mongodb::bson::ser::Error,
    },
    #[error("key-value store error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("document '{id}' in {collection} is not a JSON object")]
    NotAnObject { collection: String, id: String },
}
