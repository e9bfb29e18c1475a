use std::fmt;

use crate::models::Transaction;

pub const CRITICAL_AMOUNT: f64 = 10_000.0;
pub const MODERATE_AMOUNT: f64 = 5_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertLevel {
    Critical,
    Moderate,
    Low,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::Moderate => "Moderate",
            Self::Low => "Low",
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_missing(field: &str) -> bool {
    field.trim().is_empty()
}

/// Rule-based severity for a single transaction. First matching rule wins.
///
/// An unparseable amount is never above a threshold, so such rows fall
/// through to the missing-field check.
pub fn classify(txn: &Transaction) -> AlertLevel {
    let amount_above = |limit: f64| txn.amount.is_some_and(|a| a > limit);

    if amount_above(CRITICAL_AMOUNT) {
        return AlertLevel::Critical;
    }
    if amount_above(MODERATE_AMOUNT) {
        return AlertLevel::Moderate;
    }
    if is_missing(&txn.client_id) || is_missing(&txn.card_id) || is_missing(&txn.merchant_city) {
        return AlertLevel::Moderate;
    }
    AlertLevel::Low
}

pub struct FlaggedTransaction<'a> {
    pub txn: &'a Transaction,
    pub level: AlertLevel,
}

pub struct FlaggedReport<'a> {
    pub alerts: Vec<FlaggedTransaction<'a>>,
    pub critical: usize,
    pub moderate: usize,
}

impl FlaggedReport<'_> {
    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}

/// Classify every transaction and keep the flagged ones in input order.
pub fn flag(txns: &[Transaction]) -> FlaggedReport<'_> {
    let mut report = FlaggedReport {
        alerts: Vec::new(),
        critical: 0,
        moderate: 0,
    };
    for txn in txns {
        let level = classify(txn);
        match level {
            AlertLevel::Critical => report.critical += 1,
            AlertLevel::Moderate => report.moderate += 1,
            AlertLevel::Low => continue,
        }
        report.alerts.push(FlaggedTransaction { txn, level });
    }
    log::debug!(
        "flagged {} of {} transactions ({} critical, {} moderate)",
        report.alerts.len(),
        txns.len(),
        report.critical,
        report.moderate
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete(amount: f64) -> Transaction {
        Transaction {
            id: format!("T{amount}"),
            amount: Some(amount),
            client_id: "x".to_string(),
            card_id: "y".to_string(),
            merchant_city: "z".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_critical_above_ten_thousand() {
        for amount in [10_000.01, 12_000.0, 1_000_000.0] {
            assert_eq!(classify(&complete(amount)), AlertLevel::Critical);
        }
    }

    #[test]
    fn test_moderate_band() {
        for amount in [5_000.01, 7_500.0, 10_000.0] {
            assert_eq!(classify(&complete(amount)), AlertLevel::Moderate);
        }
    }

    #[test]
    fn test_low_at_or_below_five_thousand() {
        for amount in [0.0, 20.0, 5_000.0, -300.0] {
            assert_eq!(classify(&complete(amount)), AlertLevel::Low);
        }
    }

    #[test]
    fn test_missing_fields_are_moderate() {
        let mut txn = complete(50.0);
        txn.client_id.clear();
        assert_eq!(classify(&txn), AlertLevel::Moderate);

        let mut txn = complete(50.0);
        txn.card_id = "  ".to_string();
        assert_eq!(classify(&txn), AlertLevel::Moderate);

        let mut txn = complete(50.0);
        txn.merchant_city.clear();
        assert_eq!(classify(&txn), AlertLevel::Moderate);
    }

    #[test]
    fn test_amount_rules_take_precedence_over_missing_fields() {
        let mut txn = complete(20_000.0);
        txn.client_id.clear();
        assert_eq!(classify(&txn), AlertLevel::Critical);
    }

    #[test]
    fn test_unparseable_amount_falls_through() {
        let mut txn = complete(0.0);
        txn.amount = None;
        assert_eq!(classify(&txn), AlertLevel::Low);
        txn.merchant_city.clear();
        assert_eq!(classify(&txn), AlertLevel::Moderate);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let txn = complete(6_000.0);
        assert_eq!(classify(&txn), classify(&txn));
    }

    #[test]
    fn test_flag_scenario() {
        let mut missing_client = complete(50.0);
        missing_client.id = "missing".to_string();
        missing_client.client_id.clear();
        let txns = vec![complete(12_000.0), missing_client, complete(20.0)];

        let report = flag(&txns);
        assert_eq!(report.len(), 2);
        assert_eq!(report.critical, 1);
        assert_eq!(report.moderate, 1);
        assert_eq!(report.alerts[0].level, AlertLevel::Critical);
        assert_eq!(report.alerts[1].level, AlertLevel::Moderate);
        assert_eq!(report.alerts[1].txn.id, "missing");
    }

    #[test]
    fn test_flag_preserves_input_order() {
        let txns = vec![complete(6_000.0), complete(11_000.0), complete(7_000.0)];
        let report = flag(&txns);
        let amounts: Vec<f64> = report.alerts.iter().map(|a| a.txn.amount.unwrap()).collect();
        assert_eq!(amounts, vec![6_000.0, 11_000.0, 7_000.0]);
    }

    #[test]
    fn test_flag_empty() {
        let report = flag(&[]);
        assert!(report.is_empty());
        assert_eq!((report.critical, report.moderate), (0, 0));
    }
}
