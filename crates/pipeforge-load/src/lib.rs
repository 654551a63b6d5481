//! Loads generated reference data into the document and key-value stores
//! the pipeline enriches from.

pub mod errors;
pub mod loader;
pub mod mongo;
pub mod redis_store;
pub mod store;

pub use errors::LoadError;
pub use loader::{
    LoadReport, PRODUCTS_COLLECTION, USER_PROFILES_COLLECTION, load_documents, load_key_values,
};
pub use mongo::{DEFAULT_DATABASE, DEFAULT_MONGO_URI, MongoDocumentStore};
pub use redis_store::{DEFAULT_REDIS_URL, RedisKeyValueStore};
pub use store::{
    DocumentStore, KeyValueStore, MemoryDocumentStore, MemoryKeyValueStore, Upsert,
};
