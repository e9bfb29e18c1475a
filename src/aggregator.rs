//! Reducers over an already window-filtered set of transactions.
//!
//! All reducers share one pass through the rows (`Aggregator::add`) and
//! produce fresh structures; inputs are never touched. Rows without a usable
//! amount are skipped by every sum, rows without a date are skipped by the
//! day and month buckets only.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};

use crate::categorizer::category_for;
use crate::models::Transaction;

pub const UNKNOWN_MERCHANT: &str = "Unknown";
/// Longest revenue series a plan may ask for (ten years).
pub const MAX_DAYS: u32 = 3660;
/// Longest monthly rollup a plan may ask for (a century).
pub const MAX_MONTHS: u32 = 1200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationPlan {
    /// Trailing days in the revenue series, today included.
    pub days: u32,
    /// Trailing months in the rollup, current month included.
    pub months: u32,
}

impl Default for AggregationPlan {
    fn default() -> Self {
        Self { days: 30, months: 12 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyBucket {
    pub date: NaiveDate,
    pub amount: f64,
    pub count: usize,
}

impl DailyBucket {
    pub fn key(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthBucket {
    pub year: i32,
    pub month: u32,
    pub amount: f64,
    pub count: usize,
}

impl MonthBucket {
    /// "Jan 2025"
    pub fn label(&self) -> String {
        match NaiveDate::from_ymd_opt(self.year, self.month, 1) {
            Some(d) => d.format("%b %Y").to_string(),
            None => format!("{}-{:02}", self.year, self.month),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupTotal {
    pub name: String,
    pub total: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Aggregates {
    pub daily: Vec<DailyBucket>,
    pub merchants: Vec<GroupTotal>,
    pub categories: Vec<GroupTotal>,
    pub monthly: Vec<MonthBucket>,
    /// Sum of every usable amount in the input.
    pub total: f64,
    /// Rows that contributed to `total`.
    pub counted: usize,
    /// Rows left out of every sum for lack of a usable amount.
    pub skipped_amount: usize,
    /// Rows with an amount but no date, so absent from day and month buckets.
    pub undated: usize,
}

/// Totals keyed by name, remembering first-seen order for tie breaks.
#[derive(Default)]
struct Grouper {
    index: HashMap<String, usize>,
    groups: Vec<GroupTotal>,
}

impl Grouper {
    fn add(&mut self, name: &str, amount: f64) {
        let idx = match self.index.get(name) {
            Some(&idx) => idx,
            None => {
                self.groups.push(GroupTotal {
                    name: name.to_string(),
                    total: 0.0,
                    count: 0,
                });
                self.index.insert(name.to_string(), self.groups.len() - 1);
                self.groups.len() - 1
            }
        };
        let group = &mut self.groups[idx];
        group.total += amount;
        group.count += 1;
    }

    fn finish(self) -> Vec<GroupTotal> {
        let mut groups = self.groups;
        // sort_by is stable, so equal totals keep first-seen order
        groups.sort_by(|a, b| b.total.total_cmp(&a.total));
        groups
    }
}

fn month_index(year: i32, month: u32) -> i64 {
    i64::from(year) * 12 + i64::from(month) - 1
}

fn from_month_index(idx: i64) -> (i32, u32) {
    (idx.div_euclid(12) as i32, idx.rem_euclid(12) as u32 + 1)
}

pub struct Aggregator {
    first_day: NaiveDate,
    daily: Vec<DailyBucket>,
    first_month: i64,
    monthly: Vec<MonthBucket>,
    merchants: Grouper,
    categories: Grouper,
    total: f64,
    counted: usize,
    skipped_amount: usize,
    undated: usize,
}

impl Aggregator {
    pub fn new(plan: &AggregationPlan, now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        let days = if plan.days > MAX_DAYS {
            log::warn!("revenue series of {} days exceeds {MAX_DAYS}; left empty", plan.days);
            0
        } else {
            plan.days
        };
        let months = if plan.months > MAX_MONTHS {
            log::warn!("rollup of {} months exceeds {MAX_MONTHS}; left empty", plan.months);
            0
        } else {
            plan.months
        };

        let first_day = today
            .checked_sub_days(Days::new(u64::from(days.saturating_sub(1))))
            .unwrap_or(today);
        let daily = (0..days)
            .filter_map(|i| first_day.checked_add_days(Days::new(u64::from(i))))
            .map(|date| DailyBucket {
                date,
                amount: 0.0,
                count: 0,
            })
            .collect();

        let first_month =
            month_index(today.year(), today.month()) - i64::from(months.saturating_sub(1));
        let monthly = (0..months)
            .map(|i| {
                let (year, month) = from_month_index(first_month + i64::from(i));
                MonthBucket {
                    year,
                    month,
                    amount: 0.0,
                    count: 0,
                }
            })
            .collect();

        Self {
            first_day,
            daily,
            first_month,
            monthly,
            merchants: Grouper::default(),
            categories: Grouper::default(),
            total: 0.0,
            counted: 0,
            skipped_amount: 0,
            undated: 0,
        }
    }

    pub fn add(&mut self, txn: &Transaction) {
        let Some(amount) = txn.amount else {
            self.skipped_amount += 1;
            return;
        };
        self.total += amount;
        self.counted += 1;

        let merchant = txn.merchant_name.trim();
        let merchant = if merchant.is_empty() { UNKNOWN_MERCHANT } else { merchant };
        self.merchants.add(merchant, amount);
        self.categories.add(category_for(txn), amount);

        let Some(date) = txn.date else {
            self.undated += 1;
            return;
        };
        let day = date.date_naive();

        let offset = (day - self.first_day).num_days();
        if let Some(bucket) = usize::try_from(offset).ok().and_then(|i| self.daily.get_mut(i)) {
            bucket.amount += amount;
            bucket.count += 1;
        }

        let offset = month_index(day.year(), day.month()) - self.first_month;
        if let Some(bucket) = usize::try_from(offset).ok().and_then(|i| self.monthly.get_mut(i)) {
            bucket.amount += amount;
            bucket.count += 1;
        }
    }

    pub fn finish(self) -> Aggregates {
        Aggregates {
            daily: self.daily,
            merchants: self.merchants.finish(),
            categories: self.categories.finish(),
            monthly: self.monthly,
            total: self.total,
            counted: self.counted,
            skipped_amount: self.skipped_amount,
            undated: self.undated,
        }
    }
}

/// Run every reducer over `txns` in a single pass.
pub fn aggregate<'a, I>(txns: I, plan: &AggregationPlan, now: DateTime<Utc>) -> Aggregates
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut agg = Aggregator::new(plan, now);
    for txn in txns {
        agg.add(txn);
    }
    let out = agg.finish();
    log::debug!(
        "aggregated {} rows (total {:.2}, {} without amount, {} undated)",
        out.counted,
        out.total,
        out.skipped_amount,
        out.undated
    );
    out
}

/// Daily revenue for the trailing `days` UTC days ending today.
pub fn revenue_series<'a, I>(txns: I, days: u32, now: DateTime<Utc>) -> Vec<DailyBucket>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    aggregate(txns, &AggregationPlan { days, months: 0 }, now).daily
}

/// Per-merchant totals, largest first.
pub fn merchant_breakdown<'a, I>(txns: I) -> Vec<GroupTotal>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    aggregate(txns, &AggregationPlan { days: 0, months: 0 }, Utc::now()).merchants
}

/// Per-category totals, largest first.
pub fn category_breakdown<'a, I>(txns: I) -> Vec<GroupTotal>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    aggregate(txns, &AggregationPlan { days: 0, months: 0 }, Utc::now()).categories
}

/// Monthly totals for the trailing `months` months, oldest first.
pub fn monthly_rollup<'a, I>(txns: I, months: u32, now: DateTime<Utc>) -> Vec<MonthBucket>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    aggregate(txns, &AggregationPlan { days: 0, months }, now).monthly
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap()
    }

    fn txn(merchant: &str, amount: Option<f64>, date: Option<(i32, u32, u32)>) -> Transaction {
        Transaction {
            id: format!("{merchant}-{amount:?}"),
            merchant_name: merchant.to_string(),
            amount,
            date: date.map(|(y, m, d)| Utc.with_ymd_and_hms(y, m, d, 9, 30, 0).unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn test_category_breakdown_scenario() {
        let txns = vec![txn("Walmart #12", Some(30.0), None), txn("", Some(10.0), None)];
        let cats = category_breakdown(&txns);
        assert_eq!(cats.len(), 2);
        assert_eq!((cats[0].name.as_str(), cats[0].total), ("Retail", 30.0));
        assert_eq!((cats[1].name.as_str(), cats[1].total), ("Other", 10.0));
    }

    #[test]
    fn test_breakdown_sorted_desc_ties_first_seen() {
        let txns = vec![
            txn("Alpha", Some(5.0), None),
            txn("Beta", Some(20.0), None),
            txn("Gamma", Some(5.0), None),
            txn("Alpha", Some(0.0), None),
        ];
        let names: Vec<String> = merchant_breakdown(&txns).into_iter().map(|g| g.name).collect();
        assert_eq!(names, vec!["Beta", "Alpha", "Gamma"]);
    }

    #[test]
    fn test_merchant_breakdown_trims_and_defaults_unknown() {
        let txns = vec![
            txn("  Shell  ", Some(40.0), None),
            txn("Shell", Some(2.0), None),
            txn("   ", Some(7.0), None),
        ];
        let merchants = merchant_breakdown(&txns);
        assert_eq!(merchants[0].name, "Shell");
        assert_eq!(merchants[0].total, 42.0);
        assert_eq!(merchants[0].count, 2);
        assert_eq!(merchants[1].name, UNKNOWN_MERCHANT);
    }

    #[test]
    fn test_explicit_category_used_over_keywords() {
        let mut t = txn("Walmart", Some(12.0), None);
        t.category = Some("Grocery Stores".to_string());
        let cats = category_breakdown([&t]);
        assert_eq!(cats[0].name, "Grocery Stores");
    }

    #[test]
    fn test_revenue_series_zero_filled() {
        let txns = vec![
            txn("A", Some(10.0), Some((2025, 3, 15))),
            txn("B", Some(5.0), Some((2025, 3, 15))),
            txn("C", Some(1.0), Some((2025, 3, 1))),
            txn("old", Some(99.0), Some((2025, 1, 1))),
        ];
        let series = revenue_series(&txns, 30, now());
        assert_eq!(series.len(), 30);
        assert_eq!(series[0].key(), "2025-02-14");
        assert_eq!(series[29].key(), "2025-03-15");
        assert_eq!(series[29].amount, 15.0);
        assert_eq!(series[29].count, 2);
        assert_eq!(series[15].key(), "2025-03-01");
        assert_eq!(series[15].amount, 1.0);
        let total: f64 = series.iter().map(|b| b.amount).sum();
        assert_eq!(total, 16.0);
    }

    #[test]
    fn test_monthly_rollup_returns_n_buckets_even_when_empty() {
        let buckets = monthly_rollup(std::iter::empty::<&Transaction>(), 6, now());
        assert_eq!(buckets.len(), 6);
        assert!(buckets.iter().all(|b| b.amount == 0.0 && b.count == 0));
        assert_eq!((buckets[0].year, buckets[0].month), (2024, 10));
        assert_eq!((buckets[5].year, buckets[5].month), (2025, 3));
        assert_eq!(buckets[0].label(), "Oct 2024");
    }

    #[test]
    fn test_monthly_rollup_crosses_year_boundary() {
        let txns = vec![
            txn("A", Some(100.0), Some((2024, 12, 31))),
            txn("B", Some(50.0), Some((2025, 1, 1))),
            txn("C", Some(25.0), Some((2025, 3, 2))),
        ];
        let buckets = monthly_rollup(&txns, 12, now());
        assert_eq!(buckets.len(), 12);
        let dec = buckets.iter().find(|b| (b.year, b.month) == (2024, 12)).unwrap();
        assert_eq!(dec.amount, 100.0);
        let jan = buckets.iter().find(|b| (b.year, b.month) == (2025, 1)).unwrap();
        assert_eq!(jan.amount, 50.0);
        assert_eq!(buckets[11].amount, 25.0);
    }

    #[test]
    fn test_aggregate_counts_skipped_and_undated() {
        let txns = vec![
            txn("A", Some(10.0), Some((2025, 3, 10))),
            txn("B", None, Some((2025, 3, 10))),
            txn("C", Some(4.0), None),
        ];
        let agg = aggregate(&txns, &AggregationPlan::default(), now());
        assert_eq!(agg.total, 14.0);
        assert_eq!(agg.counted, 2);
        assert_eq!(agg.skipped_amount, 1);
        assert_eq!(agg.undated, 1);
        // undated rows still count towards breakdowns
        assert_eq!(agg.merchants.len(), 2);
        let daily_total: f64 = agg.daily.iter().map(|b| b.amount).sum();
        assert_eq!(daily_total, 10.0);
    }

    #[test]
    fn test_aggregate_empty_input() {
        let agg = aggregate(std::iter::empty::<&Transaction>(), &AggregationPlan::default(), now());
        assert_eq!(agg.total, 0.0);
        assert!(agg.merchants.is_empty());
        assert!(agg.categories.is_empty());
        assert_eq!(agg.daily.len(), 30);
        assert_eq!(agg.monthly.len(), 12);
    }

    #[test]
    fn test_aggregate_is_repeatable() {
        let txns = vec![
            txn("Amazon", Some(3.5), Some((2025, 3, 1))),
            txn("KFC", Some(8.25), Some((2025, 2, 1))),
        ];
        let a = aggregate(&txns, &AggregationPlan::default(), now());
        let b = aggregate(&txns, &AggregationPlan::default(), now());
        assert_eq!(a, b);
    }

    #[test]
    fn test_oversized_plan_yields_empty_buckets() {
        let txns = vec![txn("Amazon", Some(3.5), Some((2025, 3, 1)))];
        assert!(revenue_series(&txns, 100_000_000, now()).is_empty());
        assert!(monthly_rollup(&txns, u32::MAX, now()).is_empty());

        let agg = aggregate(
            &txns,
            &AggregationPlan {
                days: u32::MAX,
                months: 3,
            },
            now(),
        );
        assert!(agg.daily.is_empty());
        assert_eq!(agg.monthly.len(), 3);
        assert_eq!(agg.total, 3.5);
    }

    #[test]
    fn test_largest_plan_still_builds() {
        let series = revenue_series(std::iter::empty::<&Transaction>(), MAX_DAYS, now());
        assert_eq!(series.len(), MAX_DAYS as usize);
        assert_eq!(series.last().map(|b| b.key()), Some("2025-03-15".to_string()));
        let rollup = monthly_rollup(std::iter::empty::<&Transaction>(), MAX_MONTHS, now());
        assert_eq!(rollup.len(), MAX_MONTHS as usize);
        assert_eq!((rollup[0].year, rollup[0].month), (1925, 4));
    }
}
