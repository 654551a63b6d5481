use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Profile joined against `payload.user_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub tier: String,
}

/// Catalog entry joined against `payload.product_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub price: f64,
    pub category: String,
}

/// Order attributes that never appear in the event payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderExtension {
    pub discount_tier: Option<String>,
    pub shipping_method: Option<String>,
    pub shipping_cost: Option<f64>,
    pub estimated_delivery_days: u8,
}

/// Document-store artifact: `{users, products}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentBundle {
    #[serde(default)]
    pub users: Vec<UserProfile>,
    #[serde(default)]
    pub products: Vec<Product>,
}

/// Entity namespaces used in key-value store keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    User,
    Product,
    Order,
}

impl EntityKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Product => "product",
            EntityKind::Order => "order",
        }
    }

    /// Store key `<entity>:<identifier>`.
    pub fn key(&self, identifier: &str) -> String {
        format!("{}:{identifier}", self.prefix())
    }

    /// Split a store key back into its entity and identifier.
    pub fn parse_key(key: &str) -> Option<(EntityKind, &str)> {
        let (prefix, identifier) = key.split_once(':')?;
        let kind = match prefix {
            "user" => EntityKind::User,
            "product" => EntityKind::Product,
            "order" => EntityKind::Order,
            _ => return None,
        };
        Some((kind, identifier))
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Key-value artifact: flat `<entity>:<identifier>` → JSON object mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyValueBundle {
    entries: BTreeMap<String, Value>,
}

impl KeyValueBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble the bundle from documents and order extensions. User and
    /// product values drop `_id` since the key already carries it.
    pub fn from_parts(
        documents: &DocumentBundle,
        orders: &BTreeMap<String, OrderExtension>,
    ) -> Result<Self> {
        let mut bundle = Self::new();
        for user in &documents.users {
            let value = serde_json::json!({
                "name": user.name,
                "email": user.email,
                "tier": user.tier,
            });
            bundle.insert(EntityKind::User, &user.id, value);
        }
        for product in &documents.products {
            let value = serde_json::json!({
                "name": product.name,
                "price": product.price,
                "category": product.category,
            });
            bundle.insert(EntityKind::Product, &product.id, value);
        }
        for (order_id, order) in orders {
            let value = serde_json::to_value(order)
                .map_err(|err| Error::Serialization(format!("order {order_id}: {err}")))?;
            bundle.insert(EntityKind::Order, order_id, value);
        }
        Ok(bundle)
    }

    pub fn insert(&mut self, kind: EntityKind, identifier: &str, value: Value) {
        self.entries.insert(kind.key(identifier), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    /// Number of keys for one entity namespace.
    pub fn count(&self, kind: EntityKind) -> usize {
        self.entries
            .keys()
            .filter_map(|key| EntityKind::parse_key(key))
            .filter(|(entry_kind, _)| *entry_kind == kind)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_keys_back_into_entities() {
        assert_eq!(EntityKind::User.key("user-12"), "user:user-12");
        assert_eq!(
            EntityKind::parse_key("order:order-001"),
            Some((EntityKind::Order, "order-001"))
        );
        assert_eq!(EntityKind::parse_key("session:abc"), None);
        assert_eq!(EntityKind::parse_key("no-separator"), None);
    }

    #[test]
    fn key_value_bundle_strips_document_ids() {
        let documents = DocumentBundle {
            users: vec![UserProfile {
                id: "user-1".to_string(),
                name: "Ada Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                tier: "premium".to_string(),
            }],
            products: vec![Product {
                id: "product-abc".to_string(),
                name: "Desk Lamp".to_string(),
                price: 25.0,
                category: "general".to_string(),
            }],
        };
        let mut orders = BTreeMap::new();
        orders.insert(
            "order-001".to_string(),
            OrderExtension {
                discount_tier: None,
                shipping_method: Some("express".to_string()),
                shipping_cost: Some(12.5),
                estimated_delivery_days: 3,
            },
        );

        let bundle = KeyValueBundle::from_parts(&documents, &orders).expect("bundle");
        assert_eq!(bundle.len(), 3);
        assert_eq!(bundle.count(EntityKind::User), 1);
        assert_eq!(bundle.count(EntityKind::Order), 1);

        let user = bundle.get("user:user-1").expect("user key");
        assert!(user.get("_id").is_none());
        assert_eq!(user["tier"], "premium");

        let order = bundle.get("order:order-001").expect("order key");
        assert_eq!(order["discount_tier"], Value::Null);
        assert_eq!(order["estimated_delivery_days"], 3);
    }
}
