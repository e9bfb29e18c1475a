use chrono::{DateTime, Datelike, Utc};

use crate::aggregator::{category_breakdown, merchant_breakdown, monthly_rollup, revenue_series};
use crate::cli::export::write_outputs;
use crate::cli::{load_snapshot, open_store, parse_columns, screen_table, ReportArgs};
use crate::error::Result;
use crate::export::table::{
    category_table, daily_table, merchant_table, monthly_table, transactions_table,
    TRANSACTION_COLUMNS,
};
use crate::fmt::money;
use crate::settings::{load_settings, Settings};
use crate::store::Page;
use crate::window::{filter_window, AggregationWindow, ReportRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Category,
    Merchant,
    Monthly,
    Daily,
    Transactions,
}

/// Months in the rollup: the range's own span, or the configured default
/// when the range is open-ended.
fn rollup_months(range: ReportRange, settings: &Settings, now: DateTime<Utc>) -> u32 {
    match range {
        ReportRange::Last3Months => 3,
        ReportRange::Last6Months => 6,
        ReportRange::Last12Months => 12,
        ReportRange::YearToDate => now.month(),
        ReportRange::All => settings.report_months,
    }
}

pub fn run(kind: ReportKind, args: &ReportArgs) -> Result<()> {
    let range: ReportRange = args.range.parse()?;
    let window = AggregationWindow::from(range);
    let settings = load_settings();
    let store = open_store(&settings)?;
    let snapshot = load_snapshot(&store, Page::All)?;

    let now = Utc::now();
    let windowed = filter_window(&snapshot.transactions, window.resolve(now));
    let txns = || windowed.transactions.iter().copied();

    let table = match kind {
        ReportKind::Category => category_table(&category_breakdown(txns())),
        ReportKind::Merchant => merchant_table(&merchant_breakdown(txns())),
        ReportKind::Monthly => {
            monthly_table(&monthly_rollup(txns(), rollup_months(range, &settings, now), now))
        }
        ReportKind::Daily => daily_table(&revenue_series(txns(), settings.revenue_days, now)),
        ReportKind::Transactions => transactions_table(txns()),
    };
    // The transaction listing carries every field; show the short set unless asked.
    let columns = parse_columns(args.columns.as_deref()).or_else(|| {
        (kind == ReportKind::Transactions).then(|| TRANSACTION_COLUMNS.map(String::from).to_vec())
    });
    let table = match columns {
        Some(cols) => table.with_columns(&cols)?,
        None => table,
    };

    if table.is_empty() {
        println!("No data for {}.", window.label());
    } else {
        println!("{} ({})\n{}", table.title, window.label(), screen_table(&table));
    }
    let amounts: Vec<f64> = txns().filter_map(|t| t.amount).collect();
    println!("{} transactions, total {}", amounts.len(), money(amounts.iter().sum()));
    if windowed.excluded_undated > 0 {
        println!("{} undated transactions not in this range", windowed.excluded_undated);
    }

    let subtitle = format!("{} | {} transactions", window.label(), windowed.transactions.len());
    let title = table.title.clone();
    write_outputs(&args.output, &title, &subtitle, &[&table])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_rollup_months_follow_range() {
        let now = Utc.with_ymd_and_hms(2025, 4, 10, 0, 0, 0).unwrap();
        let settings = Settings::default();
        assert_eq!(rollup_months(ReportRange::Last3Months, &settings, now), 3);
        assert_eq!(rollup_months(ReportRange::YearToDate, &settings, now), 4);
        assert_eq!(rollup_months(ReportRange::All, &settings, now), 12);
    }
}
