use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use pipeforge_core::{Envelope, PaymentPayload, PaymentStatus};

use super::{FieldContext, IdSpace, lowercase_letters, round_cents};

pub const AMOUNT_MIN: f64 = 10.0;
pub const AMOUNT_MAX: f64 = 10000.0;
pub const CREATED_AT_MAX_DAYS: i64 = 90;

pub fn user_id<R: Rng + ?Sized>(rng: &mut R, space: &IdSpace) -> String {
    format!("user-{}", rng.random_range(1..=space.users))
}

pub fn product_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    let len = rng.random_range(3..=6);
    format!("product-{}", lowercase_letters(rng, len))
}

pub fn order_id<R: Rng + ?Sized>(rng: &mut R, space: &IdSpace) -> String {
    format!("order-{:03}", rng.random_range(1..=space.orders))
}

pub fn message_id<R: Rng + ?Sized>(rng: &mut R, space: &IdSpace) -> String {
    format!("payment-order-{:03}", rng.random_range(1..=space.messages))
}

/// Amount in `[10.00, 10000.00]`, rounded to cents.
pub fn amount<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    round_cents(rng.random_range(AMOUNT_MIN..=AMOUNT_MAX))
}

pub fn currency() -> &'static str {
    "USD"
}

pub fn status<R: Rng + ?Sized>(rng: &mut R) -> PaymentStatus {
    PaymentStatus::ALL[rng.random_range(0..PaymentStatus::ALL.len())]
}

/// `base` shifted by ±90 days plus an hour/minute offset within the day.
pub fn created_at<R: Rng + ?Sized>(rng: &mut R, base: DateTime<Utc>) -> DateTime<Utc> {
    let days = rng.random_range(-CREATED_AT_MAX_DAYS..=CREATED_AT_MAX_DAYS);
    let hours = rng.random_range(0..=23);
    let minutes = rng.random_range(0..=59);
    base + Duration::days(days) + Duration::hours(hours) + Duration::minutes(minutes)
}

pub fn payment_payload<R: Rng + ?Sized>(rng: &mut R, ctx: &FieldContext) -> PaymentPayload {
    // The coin flip comes first so it does not shift with payload field order.
    let has_product = rng.random_bool(ctx.product_rate);
    let order_id = order_id(rng, &ctx.id_space);
    let user_id = user_id(rng, &ctx.id_space);
    let amount = amount(rng);
    let status = status(rng);
    let created_at = created_at(rng, ctx.base_time);
    let product_id = has_product.then(|| product_id(rng));

    PaymentPayload {
        order_id,
        user_id,
        amount,
        currency: currency().to_string(),
        status,
        created_at,
        product_id,
    }
}

pub fn payment_envelope<R: Rng + ?Sized>(rng: &mut R, ctx: &FieldContext) -> Envelope {
    let payload = payment_payload(rng, ctx);
    let id = message_id(rng, &ctx.id_space);
    Envelope::new(id, payload)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn ctx() -> FieldContext {
        FieldContext {
            id_space: IdSpace::default(),
            base_time: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            product_rate: 0.5,
        }
    }

    #[test]
    fn amounts_are_cent_rounded_and_bounded() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..10_000 {
            let value = amount(&mut rng);
            assert!((AMOUNT_MIN..=AMOUNT_MAX).contains(&value), "{value} out of range");
            assert_eq!(round_cents(value), value);
        }
    }

    #[test]
    fn created_at_stays_within_window() {
        let ctx = ctx();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let earliest = ctx.base_time - Duration::days(CREATED_AT_MAX_DAYS);
        let latest = ctx.base_time
            + Duration::days(CREATED_AT_MAX_DAYS)
            + Duration::hours(23)
            + Duration::minutes(59);
        for _ in 0..2_000 {
            let value = created_at(&mut rng, ctx.base_time);
            assert!(value >= earliest && value <= latest);
        }
    }

    #[test]
    fn identifiers_follow_their_formats() {
        let space = IdSpace {
            users: 3,
            orders: 7,
            messages: 12,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        for _ in 0..500 {
            let user = user_id(&mut rng, &space);
            let number: u32 = user["user-".len()..].parse().expect("numeric user id");
            assert!((1..=3).contains(&number));

            let order = order_id(&mut rng, &space);
            assert_eq!(order.len(), "order-".len() + 3);

            let message = message_id(&mut rng, &space);
            assert!(message.starts_with("payment-order-0"));

            let product = product_id(&mut rng);
            let suffix = &product["product-".len()..];
            assert!((3..=6).contains(&suffix.len()));
            assert!(suffix.chars().all(|c| c.is_ascii_lowercase()));
        }
    }

    #[test]
    fn product_rate_extremes_are_respected() {
        let mut always = ctx();
        always.product_rate = 1.0;
        let mut never = ctx();
        never.product_rate = 0.0;

        let mut rng = ChaCha8Rng::seed_from_u64(13);
        for _ in 0..200 {
            assert!(payment_payload(&mut rng, &always).product_id.is_some());
            assert!(payment_payload(&mut rng, &never).product_id.is_none());
        }
    }

    #[test]
    fn envelope_is_unstamped() {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let envelope = payment_envelope(&mut rng, &ctx());
        assert_eq!(envelope.source, "payment-service");
        assert_eq!(envelope.payload.currency, "USD");
        assert!(envelope.timestamp.is_none());
        assert!(envelope.metadata.is_none());
    }
}
