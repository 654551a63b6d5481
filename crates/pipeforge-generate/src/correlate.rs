use std::collections::BTreeSet;

use pipeforge_core::{EntityKind, Envelope};

use crate::engine::Dataset;
use crate::errors::GenerationError;

/// Distinct identifiers referenced by a batch of envelopes.
///
/// Sets are ordered so the reference datasets derived from them come out in
/// a stable order for a given seed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceKeys {
    pub user_ids: BTreeSet<String>,
    pub product_ids: BTreeSet<String>,
    pub order_ids: BTreeSet<String>,
}

impl ReferenceKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events(events: &[Envelope]) -> Self {
        let mut keys = Self::new();
        for envelope in events {
            keys.ingest(envelope);
        }
        keys
    }

    pub fn ingest(&mut self, envelope: &Envelope) {
        let payload = &envelope.payload;
        self.user_ids.insert(payload.user_id.clone());
        self.order_ids.insert(payload.order_id.clone());
        if let Some(product_id) = &payload.product_id {
            self.product_ids.insert(product_id.clone());
        }
    }

    pub fn ids(&self, kind: EntityKind) -> &BTreeSet<String> {
        match kind {
            EntityKind::User => &self.user_ids,
            EntityKind::Product => &self.product_ids,
            EntityKind::Order => &self.order_ids,
        }
    }
}

/// Check that the reference datasets cover exactly the identifiers the
/// events reference: no orphan records, no missing ones, no duplicates.
pub fn verify_closure(dataset: &Dataset) -> Result<(), GenerationError> {
    let referenced = ReferenceKeys::from_events(&dataset.events);

    let users: Vec<&str> = dataset.documents.users.iter().map(|u| u.id.as_str()).collect();
    let products: Vec<&str> = dataset
        .documents
        .products
        .iter()
        .map(|p| p.id.as_str())
        .collect();
    let orders: Vec<&str> = dataset.orders.keys().map(String::as_str).collect();

    check_entity(EntityKind::User, &referenced, &users)?;
    check_entity(EntityKind::Product, &referenced, &products)?;
    check_entity(EntityKind::Order, &referenced, &orders)?;
    Ok(())
}

fn check_entity(
    kind: EntityKind,
    referenced: &ReferenceKeys,
    records: &[&str],
) -> Result<(), GenerationError> {
    let expected = referenced.ids(kind);
    let mut seen = BTreeSet::new();

    for id in records {
        if !seen.insert(*id) {
            return Err(GenerationError::Closure(format!(
                "duplicate {kind} record '{id}'"
            )));
        }
        if !expected.contains(*id) {
            return Err(GenerationError::Closure(format!(
                "orphan {kind} record '{id}' is not referenced by any event"
            )));
        }
    }

    if let Some(missing) = expected.iter().find(|id| !seen.contains(id.as_str())) {
        return Err(GenerationError::Closure(format!(
            "{kind} '{missing}' is referenced by an event but has no record"
        )));
    }

    Ok(())
}
