//! Field generators.
//!
//! Every generator is a pure function of the RNG it is handed, so a seeded
//! `ChaCha8Rng` reproduces the same values run after run. None of them can
//! fail: each one returns a value inside its fixed micro-schema.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

pub mod payment;
pub mod reference;

pub use payment::{
    amount, created_at, currency, message_id, order_id, payment_envelope, payment_payload,
    product_id, status, user_id,
};
pub use reference::{order_extension, product, user_profile};

/// Upper bounds of the numeric identifier spaces.
///
/// Smaller spaces make identifiers collide more often, so the same user or
/// order shows up across many events; larger spaces make them mostly unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdSpace {
    pub users: u32,
    pub orders: u32,
    pub messages: u32,
}

impl Default for IdSpace {
    fn default() -> Self {
        Self {
            users: 9999,
            orders: 9999,
            messages: 9999,
        }
    }
}

impl IdSpace {
    pub fn is_valid(&self) -> bool {
        self.users > 0 && self.orders > 0 && self.messages > 0
    }
}

/// Inputs shared by the event field generators.
#[derive(Debug, Clone, Copy)]
pub struct FieldContext {
    pub id_space: IdSpace,
    /// Reference point for `created_at` offsets.
    pub base_time: DateTime<Utc>,
    /// Probability that an event carries a `product_id`.
    pub product_rate: f64,
}

/// Round to two decimal places.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn pick<'a, R: Rng + ?Sized>(values: &[&'a str], rng: &mut R) -> &'a str {
    values[rng.random_range(0..values.len())]
}

fn lowercase_letters<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| char::from(b'a' + rng.random_range(0..26u8)))
        .collect()
}
