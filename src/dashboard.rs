//! Headline figures for the dashboard, composed from the pipeline stages.

use chrono::{DateTime, Utc};

use crate::aggregator::{aggregate, AggregationPlan, Aggregates};
use crate::anomaly::anomalies;
use crate::classifier::{classify, AlertLevel};
use crate::models::{Snapshot, Transaction, User};
use crate::window::{filter_window, AggregationWindow, DashboardRange};

pub struct DashboardSummary<'a> {
    pub range: DashboardRange,
    pub transactions: usize,
    pub total_revenue: f64,
    pub fraud_count: usize,
    pub critical_alerts: usize,
    pub moderate_alerts: usize,
    pub active_users: usize,
    pub total_assets: f64,
    pub threshold: f64,
    pub anomalies: Vec<&'a Transaction>,
    pub aggregates: Aggregates,
    /// Rows left out of the window because they carry no date.
    pub excluded_undated: usize,
}

pub fn summarize<'a>(
    snapshot: &'a Snapshot,
    users: &[User],
    range: DashboardRange,
    plan: &AggregationPlan,
    now: DateTime<Utc>,
) -> DashboardSummary<'a> {
    let window = AggregationWindow::from(range);
    let windowed = filter_window(&snapshot.transactions, window.resolve(now));
    let txns = &windowed.transactions;

    let aggregates = aggregate(txns.iter().copied(), plan, now);
    let (threshold, anomalies) = anomalies(txns);

    let mut critical_alerts = 0;
    let mut moderate_alerts = 0;
    for t in txns {
        match classify(t) {
            AlertLevel::Critical => critical_alerts += 1,
            AlertLevel::Moderate => moderate_alerts += 1,
            AlertLevel::Low => {}
        }
    }

    DashboardSummary {
        range,
        transactions: txns.len(),
        total_revenue: aggregates.total,
        fraud_count: txns.iter().filter(|t| t.is_fraud()).count(),
        critical_alerts,
        moderate_alerts,
        active_users: users.len(),
        total_assets: users.iter().filter_map(|u| u.yearly_income).sum(),
        threshold,
        anomalies,
        aggregates,
        excluded_undated: windowed.excluded_undated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 30, 12, 0, 0).unwrap()
    }

    fn txn(id: &str, amount: f64, days_ago: Option<i64>, fraud: bool) -> Transaction {
        Transaction {
            id: id.to_string(),
            amount: Some(amount),
            date: days_ago.map(|d| now() - Duration::days(d)),
            client_id: "C1".to_string(),
            card_id: "K1".to_string(),
            merchant_city: "Austin".to_string(),
            fraud_label: u8::from(fraud),
            ..Default::default()
        }
    }

    #[test]
    fn test_summary_over_window() {
        let snapshot = Snapshot {
            transactions: vec![
                txn("a", 10.0, Some(1), false),
                txn("b", 20.0, Some(2), true),
                txn("c", 12_000.0, Some(3), false),
                txn("old", 5.0, Some(200), true),
                txn("undated", 7.0, None, false),
            ],
            issues: vec![],
        };
        let users = vec![User {
            id: "C1".to_string(),
            yearly_income: Some(50_000.0),
            ..Default::default()
        }];
        let s = summarize(
            &snapshot,
            &users,
            DashboardRange::Last30Days,
            &AggregationPlan::default(),
            now(),
        );
        assert_eq!(s.transactions, 3);
        assert_eq!(s.total_revenue, 12_030.0);
        assert_eq!(s.fraud_count, 1);
        assert_eq!(s.critical_alerts, 1);
        assert_eq!(s.moderate_alerts, 0);
        assert_eq!(s.active_users, 1);
        assert_eq!(s.total_assets, 50_000.0);
        assert_eq!(s.threshold, 60.0);
        assert_eq!(s.anomalies.len(), 1);
        assert_eq!(s.anomalies[0].id, "c");
        assert_eq!(s.excluded_undated, 1);
    }

    #[test]
    fn test_summary_all_range_keeps_undated() {
        let snapshot = Snapshot {
            transactions: vec![txn("undated", 7.0, None, false)],
            issues: vec![],
        };
        let s = summarize(&snapshot, &[], DashboardRange::All, &AggregationPlan::default(), now());
        assert_eq!(s.transactions, 1);
        assert_eq!(s.total_revenue, 7.0);
        assert_eq!(s.excluded_undated, 0);
        assert_eq!(s.aggregates.undated, 1);
    }

    #[test]
    fn test_summary_uses_range_window() {
        let snapshot = Snapshot {
            transactions: vec![
                txn("inside", 4.0, Some(179), false),
                txn("outside", 8.0, Some(181), false),
            ],
            issues: vec![],
        };
        let s = summarize(
            &snapshot,
            &[],
            DashboardRange::Last6Months,
            &AggregationPlan::default(),
            now(),
        );
        let interval = AggregationWindow::from(DashboardRange::Last6Months).resolve(now());
        assert_eq!(s.transactions, filter_window(&snapshot.transactions, interval).transactions.len());
        assert_eq!(s.transactions, 1);
        assert_eq!(s.total_revenue, 4.0);
    }

    #[test]
    fn test_summary_empty() {
        let snapshot = Snapshot::default();
        let s = summarize(&snapshot, &[], DashboardRange::Last90Days, &AggregationPlan::default(), now());
        assert_eq!(s.total_revenue, 0.0);
        assert!(s.threshold.is_infinite());
        assert!(s.anomalies.is_empty());
    }
}
