//! Median-based outlier threshold for a window of transactions.
//!
//! The threshold is advisory and is computed over every row handed in,
//! including the ones it ends up flagging.

use crate::models::Transaction;

pub const THRESHOLD_MULTIPLIER: f64 = 3.0;

fn median(sorted: &[f64]) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let middle = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        return Some((sorted[middle - 1] + sorted[middle]) / 2.0);
    }
    Some(sorted[middle])
}

/// Three times the median usable amount, or `+inf` when there is none.
pub fn threshold<'a, I>(txns: I) -> f64
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut amounts: Vec<f64> = txns.into_iter().filter_map(|t| t.amount).collect();
    amounts.sort_by(|a, b| a.total_cmp(b));
    median(&amounts).map_or(f64::INFINITY, |m| m * THRESHOLD_MULTIPLIER)
}

pub fn is_anomalous(txn: &Transaction, threshold: f64) -> bool {
    txn.amount.is_some_and(|a| a > threshold)
}

/// Rows above the window's own threshold, in input order.
pub fn anomalies<'a>(txns: &[&'a Transaction]) -> (f64, Vec<&'a Transaction>) {
    let limit = threshold(txns.iter().copied());
    let flagged: Vec<&Transaction> = txns
        .iter()
        .copied()
        .filter(|t| is_anomalous(t, limit))
        .collect();
    log::debug!("anomaly threshold {limit:.2}: {} of {} rows above", flagged.len(), txns.len());
    (limit, flagged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amt(a: Option<f64>) -> Transaction {
        Transaction {
            id: format!("{a:?}"),
            amount: a,
            ..Default::default()
        }
    }

    #[test]
    fn test_threshold_empty_is_infinite() {
        assert_eq!(threshold(std::iter::empty::<&Transaction>()), f64::INFINITY);
        let none = vec![amt(None), amt(None)];
        assert_eq!(threshold(&none), f64::INFINITY);
    }

    #[test]
    fn test_threshold_odd_count() {
        let txns = vec![amt(Some(30.0)), amt(Some(10.0)), amt(Some(20.0))];
        assert_eq!(threshold(&txns), 60.0);
    }

    #[test]
    fn test_threshold_even_count_averages_middle() {
        let txns = vec![amt(Some(40.0)), amt(Some(10.0)), amt(Some(20.0)), amt(Some(1000.0))];
        assert_eq!(threshold(&txns), 90.0);
    }

    #[test]
    fn test_threshold_ignores_missing_amounts() {
        let txns = vec![amt(Some(10.0)), amt(None), amt(Some(20.0)), amt(Some(30.0))];
        assert_eq!(threshold(&txns), 60.0);
    }

    #[test]
    fn test_is_anomalous_strictly_above() {
        assert!(is_anomalous(&amt(Some(60.01)), 60.0));
        assert!(!is_anomalous(&amt(Some(60.0)), 60.0));
        assert!(!is_anomalous(&amt(None), 0.0));
        assert!(!is_anomalous(&amt(Some(1e12)), f64::INFINITY));
    }

    #[test]
    fn test_anomalies_in_input_order() {
        let rows = vec![
            amt(Some(500.0)),
            amt(Some(10.0)),
            amt(Some(12.0)),
            amt(Some(11.0)),
            amt(Some(400.0)),
        ];
        let refs: Vec<&Transaction> = rows.iter().collect();
        let (limit, flagged) = anomalies(&refs);
        assert_eq!(limit, 36.0);
        let amounts: Vec<f64> = flagged.iter().filter_map(|t| t.amount).collect();
        assert_eq!(amounts, vec![500.0, 400.0]);
    }
}
