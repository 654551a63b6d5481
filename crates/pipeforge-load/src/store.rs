use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::errors::LoadError;

/// Whether an upsert replaced an existing document or inserted a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Replaced,
}

/// Collection-oriented store addressed by `_id`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn backend(&self) -> &'static str;

    /// Replace the document whose `_id` is `id`, or insert it.
    async fn upsert(
        &self,
        collection: &str,
        id: &str,
        document: Map<String, Value>,
    ) -> Result<Upsert, LoadError>;
}

/// Flat string key to string value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    fn backend(&self) -> &'static str;

    /// Unconditional overwrite.
    async fn set(&self, key: &str, value: &str) -> Result<(), LoadError>;
}

/// In-memory [`DocumentStore`] for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: Mutex<BTreeMap<String, BTreeMap<String, Map<String, Value>>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn collection(&self, name: &str) -> BTreeMap<String, Map<String, Value>> {
        self.collections
            .lock()
            .await
            .get(name)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn upsert(
        &self,
        collection: &str,
        id: &str,
        document: Map<String, Value>,
    ) -> Result<Upsert, LoadError> {
        let mut collections = self.collections.lock().await;
        let previous = collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), document);
        Ok(match previous {
            Some(_) => Upsert::Replaced,
            None => Upsert::Inserted,
        })
    }
}

/// In-memory [`KeyValueStore`] for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<BTreeMap<String, String>>,
    writes: Mutex<u64>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> BTreeMap<String, String> {
        self.entries.lock().await.clone()
    }

    /// Total `SET` calls received.
    pub async fn writes(&self) -> u64 {
        *self.writes.lock().await
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), LoadError> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        *self.writes.lock().await += 1;
        Ok(())
    }
}
