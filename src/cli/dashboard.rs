use chrono::Utc;
use colored::Colorize;

use crate::aggregator::AggregationPlan;
use crate::cli::{load_snapshot, load_users, open_store, screen_table};
use crate::dashboard::summarize;
use crate::error::Result;
use crate::export::table::{category_table, monthly_table, transactions_table, TRANSACTION_COLUMNS};
use crate::fmt::{money, threshold};
use crate::settings::load_settings;
use crate::store::Page;
use crate::window::DashboardRange;

const TOP_CATEGORIES: usize = 5;

pub fn run(range: &str) -> Result<()> {
    let range: DashboardRange = range.parse()?;
    let settings = load_settings();
    let store = open_store(&settings)?;

    let snapshot = load_snapshot(
        &store,
        Page::Range {
            page: 1,
            size: settings.dashboard_fetch_limit,
        },
    )?;
    let users = load_users(&store)?;
    let plan = AggregationPlan {
        days: settings.revenue_days,
        months: settings.dashboard_months,
    };
    let s = summarize(&snapshot, &users, range, &plan, Utc::now());

    println!("{}", format!("Dashboard ({})", range.label()).bold());
    println!("  Transactions:      {}", s.transactions);
    println!("  Total revenue:     {}", money(s.total_revenue));
    println!("  Fraud flagged:     {}", s.fraud_count);
    println!(
        "  Alerts:            {} critical, {} moderate",
        s.critical_alerts.to_string().red().bold(),
        s.moderate_alerts.to_string().yellow()
    );
    println!("  Active users:      {}", s.active_users);
    println!("  Total assets:      {}", money(s.total_assets));
    println!("  Anomaly threshold: {}", threshold(s.threshold));
    if s.excluded_undated > 0 {
        println!(
            "  {}",
            format!("{} undated transactions left out of this range", s.excluded_undated).dimmed()
        );
    }
    if s.aggregates.skipped_amount > 0 {
        println!(
            "  {}",
            format!("{} transactions without a usable amount", s.aggregates.skipped_amount).dimmed()
        );
    }

    println!("\n{}\n{}", "Monthly Totals".bold(), screen_table(&monthly_table(&s.aggregates.monthly)));

    let top: Vec<_> = s.aggregates.categories.iter().take(TOP_CATEGORIES).cloned().collect();
    if !top.is_empty() {
        println!("\n{}\n{}", "Top Categories".bold(), screen_table(&category_table(&top)));
    }

    if !s.anomalies.is_empty() {
        let table = transactions_table(s.anomalies.iter().copied())
            .with_columns(&TRANSACTION_COLUMNS.map(String::from))?;
        println!(
            "\n{}\n{}",
            format!("Anomalies ({} above {})", s.anomalies.len(), threshold(s.threshold)).bold(),
            screen_table(&table)
        );
    }
    Ok(())
}
