use crate::models::Transaction;

/// Category used when no rule matches, including for a blank merchant.
pub const OTHER: &str = "Other";

struct KeywordRule {
    keywords: &'static [&'static str],
    category: &'static str,
}

// Evaluated in order; first rule with a matching keyword wins.
const FALLBACK_RULES: &[KeywordRule] = &[
    KeywordRule { keywords: &["walmart"], category: "Retail" },
    KeywordRule { keywords: &["amazon"], category: "Online Shopping" },
    KeywordRule { keywords: &["shell", "chevron"], category: "Gas" },
    KeywordRule { keywords: &["mcdonald", "burger", "kfc"], category: "Fast Food" },
    KeywordRule { keywords: &["hospital", "clinic"], category: "Healthcare" },
];

fn matches(merchant: &str, keyword: &str) -> bool {
    merchant.to_lowercase().contains(keyword)
}

/// Derive a category from a merchant name by keyword substring match.
pub fn categorize_merchant(merchant: &str) -> &'static str {
    if merchant.trim().is_empty() {
        return OTHER;
    }
    FALLBACK_RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| matches(merchant, k)))
        .map(|rule| rule.category)
        .unwrap_or(OTHER)
}

/// The explicit upstream category when present, otherwise the keyword fallback.
pub fn category_for(txn: &Transaction) -> &str {
    match txn.category.as_deref() {
        Some(category) => category,
        None => categorize_merchant(&txn.merchant_name),
    }
}
