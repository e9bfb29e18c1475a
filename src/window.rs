//! Named aggregation windows and their resolution to concrete UTC intervals.
//!
//! Windows are resolved against a caller-supplied `now`, never stored. Every
//! bounded window ends at the start of the UTC day after `now`, so anything
//! dated today is in range and future-dated rows are not.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};

use crate::error::RampError;
use crate::models::Transaction;

/// Half-open `[start, end)` interval. `None` on either side means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl Interval {
    pub const UNBOUNDED: Interval = Interval { start: None, end: None };

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start.map_or(true, |s| at >= s) && self.end.map_or(true, |e| at < e)
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

fn start_of_day(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0).map(|n| n.and_utc())
}

fn end_of_today(now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    now.date_naive().succ_opt().and_then(start_of_day)
}

fn start_of_year(now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(now.year(), 1, 1).and_then(start_of_day)
}

// ---------------------------------------------------------------------------
// Dashboard ranges
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DashboardRange {
    #[default]
    Last30Days,
    Last90Days,
    Last6Months,
    YearToDate,
    All,
}

impl DashboardRange {
    pub const ALL_RANGES: [DashboardRange; 5] = [
        Self::Last30Days,
        Self::Last90Days,
        Self::Last6Months,
        Self::YearToDate,
        Self::All,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Last30Days => "30D",
            Self::Last90Days => "90D",
            Self::Last6Months => "6M",
            Self::YearToDate => "YTD",
            Self::All => "ALL",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Last30Days => "Last 30 days",
            Self::Last90Days => "Last 90 days",
            Self::Last6Months => "Last 6 months",
            Self::YearToDate => "Year to date",
            Self::All => "All time",
        }
    }

    /// Trailing day ranges count back whole days from `now`; 6M is 180 days.
    pub fn resolve(&self, now: DateTime<Utc>) -> Interval {
        let trailing = |days: i64| Interval {
            start: Some(now - Duration::days(days)),
            end: end_of_today(now),
        };
        match self {
            Self::Last30Days => trailing(30),
            Self::Last90Days => trailing(90),
            Self::Last6Months => trailing(180),
            Self::YearToDate => Interval {
                start: start_of_year(now),
                end: end_of_today(now),
            },
            Self::All => Interval::UNBOUNDED,
        }
    }
}

impl FromStr for DashboardRange {
    type Err = RampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL_RANGES
            .into_iter()
            .find(|r| r.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RampError::UnknownWindow(s.to_string()))
    }
}

impl fmt::Display for DashboardRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ---------------------------------------------------------------------------
// Report ranges
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportRange {
    #[default]
    All,
    Last3Months,
    Last6Months,
    Last12Months,
    YearToDate,
}

impl ReportRange {
    pub const ALL_RANGES: [ReportRange; 5] = [
        Self::All,
        Self::Last3Months,
        Self::Last6Months,
        Self::Last12Months,
        Self::YearToDate,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Last3Months => "3months",
            Self::Last6Months => "6months",
            Self::Last12Months => "12months",
            Self::YearToDate => "ytd",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "All time",
            Self::Last3Months => "Last 3 months",
            Self::Last6Months => "Last 6 months",
            Self::Last12Months => "Last 12 months",
            Self::YearToDate => "Year to date",
        }
    }

    /// Trailing month ranges step back calendar months from `now`.
    pub fn resolve(&self, now: DateTime<Utc>) -> Interval {
        let trailing = |months: u32| Interval {
            start: now.checked_sub_months(Months::new(months)),
            end: end_of_today(now),
        };
        match self {
            Self::All => Interval::UNBOUNDED,
            Self::Last3Months => trailing(3),
            Self::Last6Months => trailing(6),
            Self::Last12Months => trailing(12),
            Self::YearToDate => Interval {
                start: start_of_year(now),
                end: end_of_today(now),
            },
        }
    }
}

impl FromStr for ReportRange {
    type Err = RampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL_RANGES
            .into_iter()
            .find(|r| r.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RampError::UnknownWindow(s.to_string()))
    }
}

impl fmt::Display for ReportRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ---------------------------------------------------------------------------
// Window filter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationWindow {
    Dashboard(DashboardRange),
    Report(ReportRange),
}

impl AggregationWindow {
    pub fn resolve(&self, now: DateTime<Utc>) -> Interval {
        match self {
            Self::Dashboard(r) => r.resolve(now),
            Self::Report(r) => r.resolve(now),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Dashboard(r) => r.label(),
            Self::Report(r) => r.label(),
        }
    }
}

impl From<DashboardRange> for AggregationWindow {
    fn from(r: DashboardRange) -> Self {
        Self::Dashboard(r)
    }
}

impl From<ReportRange> for AggregationWindow {
    fn from(r: ReportRange) -> Self {
        Self::Report(r)
    }
}

pub struct Windowed<'a> {
    pub transactions: Vec<&'a Transaction>,
    /// Rows dropped because they had no usable date.
    pub excluded_undated: usize,
}

/// Keep the transactions that fall inside `interval`, in input order.
/// Undated rows are kept only by an unbounded interval.
pub fn filter_window(txns: &[Transaction], interval: Interval) -> Windowed<'_> {
    if interval.is_unbounded() {
        return Windowed {
            transactions: txns.iter().collect(),
            excluded_undated: 0,
        };
    }
    let mut excluded_undated = 0;
    let transactions = txns
        .iter()
        .filter(|t| match t.date {
            Some(date) => interval.contains(date),
            None => {
                excluded_undated += 1;
                false
            }
        })
        .collect();
    Windowed {
        transactions,
        excluded_undated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn dated(id: &str, date: Option<DateTime<Utc>>) -> Transaction {
        Transaction {
            id: id.to_string(),
            date,
            amount: Some(1.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_dashboard_range() {
        assert_eq!("30D".parse::<DashboardRange>().unwrap(), DashboardRange::Last30Days);
        assert_eq!("6m".parse::<DashboardRange>().unwrap(), DashboardRange::Last6Months);
        assert_eq!("ALL".parse::<DashboardRange>().unwrap(), DashboardRange::All);
        let err = "45D".parse::<DashboardRange>().unwrap_err();
        assert!(err.to_string().contains("45D"));
    }

    #[test]
    fn test_parse_report_range() {
        assert_eq!("3months".parse::<ReportRange>().unwrap(), ReportRange::Last3Months);
        assert_eq!("ytd".parse::<ReportRange>().unwrap(), ReportRange::YearToDate);
        assert!("3m".parse::<ReportRange>().is_err());
    }

    #[test]
    fn test_dashboard_30d_interval() {
        let now = at(2025, 3, 15, 12);
        let iv = DashboardRange::Last30Days.resolve(now);
        assert_eq!(iv.start, Some(at(2025, 2, 13, 12)));
        assert_eq!(iv.end, Some(at(2025, 3, 16, 0)));
        assert!(iv.contains(at(2025, 3, 15, 23)));
        assert!(!iv.contains(at(2025, 3, 16, 0)));
        assert!(!iv.contains(at(2025, 2, 13, 11)));
    }

    #[test]
    fn test_six_month_dashboard_is_180_days() {
        let now = at(2025, 7, 1, 0);
        let iv = DashboardRange::Last6Months.resolve(now);
        assert_eq!(iv.start, Some(now - Duration::days(180)));
    }

    #[test]
    fn test_ytd_starts_jan_first() {
        let now = at(2025, 5, 20, 8);
        for iv in [DashboardRange::YearToDate.resolve(now), ReportRange::YearToDate.resolve(now)] {
            assert_eq!(iv.start, Some(at(2025, 1, 1, 0)));
            assert_eq!(iv.end, Some(at(2025, 5, 21, 0)));
        }
    }

    #[test]
    fn test_report_months_are_calendar_months() {
        let now = at(2025, 3, 31, 10);
        let iv = ReportRange::Last3Months.resolve(now);
        // Dec has 31 days; Feb clamping does not apply
        assert_eq!(iv.start, Some(at(2024, 12, 31, 10)));
        let iv = ReportRange::Last12Months.resolve(now);
        assert_eq!(iv.start, Some(at(2024, 3, 31, 10)));
    }

    #[test]
    fn test_all_is_unbounded() {
        let now = at(2025, 1, 1, 0);
        assert!(DashboardRange::All.resolve(now).is_unbounded());
        assert!(ReportRange::All.resolve(now).is_unbounded());
    }

    #[test]
    fn test_filter_window_excludes_undated_and_counts_them() {
        let now = at(2025, 3, 15, 12);
        let txns = vec![
            dated("in", Some(at(2025, 3, 10, 0))),
            dated("old", Some(at(2024, 1, 1, 0))),
            dated("undated", None),
            dated("future", Some(at(2025, 4, 1, 0))),
        ];
        let windowed = filter_window(&txns, DashboardRange::Last30Days.resolve(now));
        let ids: Vec<&str> = windowed.transactions.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["in"]);
        assert_eq!(windowed.excluded_undated, 1);
    }

    #[test]
    fn test_filter_window_all_keeps_everything() {
        let txns = vec![dated("a", None), dated("b", Some(at(2000, 1, 1, 0)))];
        let windowed = filter_window(&txns, Interval::UNBOUNDED);
        assert_eq!(windowed.transactions.len(), 2);
        assert_eq!(windowed.excluded_undated, 0);
    }
}
