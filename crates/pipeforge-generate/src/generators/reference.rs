use fake::Fake;
use fake::faker::lorem::en::Words;
use fake::faker::name::en::Name;
use rand::Rng;

use pipeforge_core::{OrderExtension, Product, UserProfile};

use super::{lowercase_letters, pick, round_cents};

const USER_TIERS: &[&str] = &["basic", "premium", "enterprise"];
const PRODUCT_CATEGORIES: &[&str] = &["electronics", "clothing", "food", "books", "general"];
const DISCOUNT_TIERS: &[Option<&str>] = &[None, Some("standard"), Some("gold"), Some("premium")];
const SHIPPING_METHODS: &[Option<&str>] =
    &[None, Some("standard"), Some("express"), Some("premium")];

pub const PRODUCT_PRICE_MIN: f64 = 10.0;
pub const PRODUCT_PRICE_MAX: f64 = 1000.0;
pub const SHIPPING_COST_MAX: f64 = 50.0;

pub fn user_profile<R: Rng + ?Sized>(rng: &mut R, user_id: &str) -> UserProfile {
    let name: String = Name().fake_with_rng(rng);
    let prefix_len = rng.random_range(5..=10);
    let email = format!("{}@example.com", lowercase_letters(rng, prefix_len));
    UserProfile {
        id: user_id.to_string(),
        name,
        email,
        tier: pick(USER_TIERS, rng).to_string(),
    }
}

pub fn product<R: Rng + ?Sized>(rng: &mut R, product_id: &str) -> Product {
    let words: Vec<String> = Words(2..5).fake_with_rng(rng);
    Product {
        id: product_id.to_string(),
        name: title_case(&words),
        price: round_cents(rng.random_range(PRODUCT_PRICE_MIN..=PRODUCT_PRICE_MAX)),
        category: pick(PRODUCT_CATEGORIES, rng).to_string(),
    }
}

/// Join-table attributes for an order. Shipping cost is only quoted for
/// express shipping.
pub fn order_extension<R: Rng + ?Sized>(rng: &mut R) -> OrderExtension {
    let discount_tier = pick_optional(DISCOUNT_TIERS, rng);
    let shipping_method = pick_optional(SHIPPING_METHODS, rng);
    let shipping_cost = match shipping_method.as_deref() {
        Some("express") => Some(round_cents(rng.random_range(0.0..=SHIPPING_COST_MAX))),
        _ => None,
    };
    OrderExtension {
        discount_tier,
        shipping_method,
        shipping_cost,
        estimated_delivery_days: rng.random_range(1..=14),
    }
}

fn pick_optional<R: Rng + ?Sized>(values: &[Option<&str>], rng: &mut R) -> Option<String> {
    values[rng.random_range(0..values.len())].map(str::to_string)
}

fn title_case(words: &[String]) -> String {
    words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn shipping_cost_only_for_express() {
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        for _ in 0..1_000 {
            let order = order_extension(&mut rng);
            match order.shipping_method.as_deref() {
                Some("express") => {
                    let cost = order.shipping_cost.expect("express has a cost");
                    assert!((0.0..=SHIPPING_COST_MAX).contains(&cost));
                }
                _ => assert!(order.shipping_cost.is_none()),
            }
            assert!((1..=14).contains(&order.estimated_delivery_days));
        }
    }

    #[test]
    fn user_profiles_keep_their_identifier() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let user = user_profile(&mut rng, "user-42");
        assert_eq!(user.id, "user-42");
        assert!(user.email.ends_with("@example.com"));
        assert!(USER_TIERS.contains(&user.tier.as_str()));
        assert!(!user.name.is_empty());
    }

    #[test]
    fn products_are_priced_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        for _ in 0..500 {
            let item = product(&mut rng, "product-abc");
            assert!((PRODUCT_PRICE_MIN..=PRODUCT_PRICE_MAX).contains(&item.price));
            assert!(PRODUCT_CATEGORIES.contains(&item.category.as_str()));
            assert!(item.name.chars().next().is_some_and(char::is_uppercase));
        }
    }

    #[test]
    fn title_case_capitalizes_each_word() {
        let words = vec!["desk".to_string(), "lamp".to_string()];
        assert_eq!(title_case(&words), "Desk Lamp");
    }
}
