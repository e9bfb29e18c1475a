//! Deterministic sample data: a seeded generator for users and card
//! transactions, shaped like the data the dashboard normally sees.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::{NewTransaction, NewUser};
use crate::store::DEFAULT_MCC;

pub const DEFAULT_SEED: u64 = 42;
pub const USER_COUNT: usize = 20;
pub const TRANSACTION_COUNT: usize = 500;

const FIRST_USER_ID: u32 = 1001;
const FIRST_TXN_ID: u32 = 10000;

/// Merchant name and the index into `DEFAULT_MCC` it trades under.
const MERCHANTS: &[(&str, usize)] = &[
    ("Walmart #1042", 6),
    ("Walmart Supercenter", 0),
    ("Amazon.com", 6),
    ("Amazon Marketplace", 13),
    ("Shell Oil 5523", 3),
    ("Chevron 0091", 3),
    ("McDonald's", 9),
    ("Burger King", 9),
    ("KFC", 9),
    ("St. Mary Hospital", 14),
    ("Riverside Clinic", 4),
    ("Whole Foods Market", 0),
    ("Olive Garden", 1),
    ("Delta Air Lines", 2),
    ("Yellow Cab Co", 8),
    ("Hilton Downtown", 11),
    ("Sephora", 12),
    ("Dick's Sporting Goods", 7),
    ("Old Navy", 10),
    ("AMC Theatres", 5),
];

const LOCATIONS: &[(&str, &str, &str)] = &[
    ("New York", "NY", "10001"),
    ("Los Angeles", "CA", "90001"),
    ("Chicago", "IL", "60601"),
    ("Houston", "TX", "77001"),
    ("Phoenix", "AZ", "85001"),
    ("Philadelphia", "PA", "19101"),
    ("San Antonio", "TX", "78201"),
    ("San Diego", "CA", "92101"),
    ("Dallas", "TX", "75201"),
    ("Austin", "TX", "73301"),
];

const STREETS: &[&str] = &["Main St", "Oak Ave", "Maple Dr", "Cedar Ln", "Pine Rd", "Elm St"];
const GENDERS: &[&str] = &["Female", "Male"];
const METHODS: &[&str] = &["Swipe", "Chip", "Online"];
const FRAUD_ERRORS: &[&str] = &["Bad CVV", "Bad PIN", "Bad Expiration"];

#[derive(Debug, Clone)]
pub struct DemoData {
    pub users: Vec<NewUser>,
    pub transactions: Vec<NewTransaction>,
}

fn pick<'a, T>(rng: &mut StdRng, items: &'a [T]) -> &'a T {
    &items[rng.gen_range(0..items.len())]
}

fn round_cents(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn user_id(n: usize) -> String {
    format!("C{}", FIRST_USER_ID as usize + n)
}

fn generate_users(rng: &mut StdRng) -> Vec<NewUser> {
    (0..USER_COUNT)
        .map(|i| {
            let yearly: f64 = rng.gen_range(45_000.0..150_000.0);
            let per_capita = (yearly * 0.7 + rng.gen_range(-5_000.0..5_000.0)).max(0.0);
            NewUser {
                id: user_id(i),
                current_age: Some(rng.gen_range(21..80)),
                gender: Some(pick(rng, GENDERS).to_string()),
                address: Some(format!("{} {}", rng.gen_range(100..9999), pick(rng, STREETS))),
                yearly_income: Some(yearly.round()),
                per_capita_income: Some(per_capita.round()),
                total_debt: Some(rng.gen_range(0.0..200_000.0_f64).round()),
                credit_score: Some(rng.gen_range(300..=850)),
                num_credit_cards: Some(rng.gen_range(1..=8)),
            }
        })
        .collect()
}

fn demo_amount(rng: &mut StdRng) -> f64 {
    // A thin tail of large purchases so the alert rules have work to do.
    if rng.gen_bool(0.02) {
        round_cents(rng.gen_range(5_000.0..15_000.0))
    } else {
        round_cents(rng.gen_range(5.0..2_500.0))
    }
}

fn generate_transactions(rng: &mut StdRng, now: DateTime<Utc>) -> Vec<NewTransaction> {
    (0..TRANSACTION_COUNT)
        .map(|i| {
            let user = rng.gen_range(0..USER_COUNT);
            let client = user_id(user);
            let &(merchant, mcc_index) = pick(rng, MERCHANTS);
            let (mcc, description) = DEFAULT_MCC[mcc_index % DEFAULT_MCC.len()];
            let &(city, state, zip) = pick(rng, LOCATIONS);
            let date = now - Duration::seconds(rng.gen_range(0..365 * 24 * 3600));
            let fraud = rng.gen_bool(0.05);
            let category = rng.gen_bool(0.75).then(|| description.to_string());
            let city = (!rng.gen_bool(0.01)).then(|| city.to_string());

            NewTransaction {
                id: format!("TXN{}", FIRST_TXN_ID as usize + i),
                date: date.format("%Y-%m-%d %H:%M:%S").to_string(),
                client_id: Some(client.clone()),
                card_id: Some(format!("CARD-{client}-{}", rng.gen_range(1..=3))),
                amount: demo_amount(rng),
                use_chip: pick(rng, METHODS).to_string(),
                merchant_name: Some(merchant.to_string()),
                merchant_city: city,
                merchant_state: Some(state.to_string()),
                zip: Some(zip.to_string()),
                mcc: Some(mcc.to_string()),
                category,
                errors: fraud.then(|| pick(rng, FRAUD_ERRORS).to_string()),
                fraud_label: u8::from(fraud),
            }
        })
        .collect()
}

/// Generate the sample set. The same seed and `now` always give the same rows.
pub fn generate(seed: u64, now: DateTime<Utc>) -> DemoData {
    let mut rng = StdRng::seed_from_u64(seed);
    let users = generate_users(&mut rng);
    let transactions = generate_transactions(&mut rng, now);
    DemoData {
        users,
        transactions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 30, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_generate_counts() {
        let data = generate(DEFAULT_SEED, now());
        assert_eq!(data.users.len(), USER_COUNT);
        assert_eq!(data.transactions.len(), TRANSACTION_COUNT);
        assert_eq!(data.users[0].id, "C1001");
        assert_eq!(data.transactions[0].id, "TXN10000");
    }

    #[test]
    fn test_generate_is_deterministic() {
        let a = generate(7, now());
        let b = generate(7, now());
        let ids = |d: &DemoData| -> Vec<(String, f64)> {
            d.transactions.iter().map(|t| (t.id.clone(), t.amount)).collect()
        };
        assert_eq!(ids(&a), ids(&b));
        let c = generate(8, now());
        assert_ne!(ids(&a), ids(&c));
    }

    #[test]
    fn test_generated_values_in_range() {
        let data = generate(DEFAULT_SEED, now());
        let earliest = now() - Duration::days(366);
        for t in &data.transactions {
            assert!(t.amount >= 5.0 && t.amount <= 15_000.0, "{}", t.amount);
            let parsed = crate::normalizer::parse_date(&t.date).unwrap();
            assert!(parsed <= now() && parsed >= earliest);
            assert!(t.fraud_label <= 1);
            assert!(DEFAULT_MCC.iter().any(|(code, _)| Some(*code) == t.mcc.as_deref()));
        }
        for u in &data.users {
            let score = u.credit_score.unwrap();
            assert!((300..=850).contains(&score));
            let cards = u.num_credit_cards.unwrap();
            assert!((1..=8).contains(&cards));
        }
    }

    #[test]
    fn test_clients_reference_generated_users() {
        let data = generate(DEFAULT_SEED, now());
        for t in &data.transactions {
            let client = t.client_id.as_deref().unwrap();
            assert!(data.users.iter().any(|u| u.id == client));
            assert!(t.card_id.as_deref().unwrap().starts_with(&format!("CARD-{client}-")));
        }
    }

    #[test]
    fn test_errors_only_on_fraud() {
        let data = generate(DEFAULT_SEED, now());
        for t in &data.transactions {
            assert_eq!(t.errors.is_some(), t.fraud_label == 1);
        }
    }
}
