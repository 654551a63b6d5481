use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use pipeforge_core::{DocumentBundle, EntityKind, KeyValueBundle};

use crate::errors::LoadError;
use crate::store::{DocumentStore, KeyValueStore, Upsert};

pub const USER_PROFILES_COLLECTION: &str = "user_profiles";
pub const PRODUCTS_COLLECTION: &str = "products";

/// Writes performed by one load, grouped by collection (documents) or
/// entity prefix (key-value).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub counts: BTreeMap<String, u64>,
    pub inserted: u64,
    pub replaced: u64,
    pub writes: u64,
}

impl LoadReport {
    pub fn count(&self, group: &str) -> u64 {
        self.counts.get(group).copied().unwrap_or(0)
    }

    fn record(&mut self, group: &str) {
        *self.counts.entry(group.to_string()).or_insert(0) += 1;
        self.writes += 1;
    }
}

/// Upsert profiles into `user_profiles` and products into `products`,
/// keyed by `_id`. Rerunning with the same bundle leaves the same documents.
pub async fn load_documents<S>(store: &S, bundle: &DocumentBundle) -> Result<LoadReport, LoadError>
where
    S: DocumentStore + ?Sized,
{
    let mut report = LoadReport::default();

    for user in &bundle.users {
        upsert_record(store, USER_PROFILES_COLLECTION, &user.id, user, &mut report).await?;
    }
    for product in &bundle.products {
        upsert_record(store, PRODUCTS_COLLECTION, &product.id, product, &mut report).await?;
    }

    info!(
        event = "load.documents.completed",
        backend = store.backend(),
        users = report.count(USER_PROFILES_COLLECTION),
        products = report.count(PRODUCTS_COLLECTION),
        inserted = report.inserted,
        replaced = report.replaced,
        "documents loaded"
    );
    Ok(report)
}

/// `SET` every entry as a JSON string. Existing keys are overwritten.
pub async fn load_key_values<S>(store: &S, bundle: &KeyValueBundle) -> Result<LoadReport, LoadError>
where
    S: KeyValueStore + ?Sized,
{
    let mut report = LoadReport::default();

    for (key, value) in bundle.iter() {
        store.set(key, &serde_json::to_string(value)?).await?;
        let group = EntityKind::parse_key(key)
            .map(|(kind, _)| kind.prefix())
            .unwrap_or("other");
        report.record(group);
        debug!(event = "load.kv.set", key = %key, "key written");
    }

    info!(
        event = "load.kv.completed",
        backend = store.backend(),
        keys = report.writes,
        orders = report.count(EntityKind::Order.prefix()),
        "key-value entries loaded"
    );
    Ok(report)
}

async fn upsert_record<S, T>(
    store: &S,
    collection: &str,
    id: &str,
    record: &T,
    report: &mut LoadReport,
) -> Result<(), LoadError>
where
    S: DocumentStore + ?Sized,
    T: Serialize,
{
    let Value::Object(document) = serde_json::to_value(record)? else {
        return Err(LoadError::NotAnObject {
            collection: collection.to_string(),
            id: id.to_string(),
        });
    };

    match store.upsert(collection, id, document).await? {
        Upsert::Inserted => report.inserted += 1,
        Upsert::Replaced => report.replaced += 1,
    }
    report.record(collection);
    Ok(())
}
