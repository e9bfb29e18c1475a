pub mod alerts;
pub mod dashboard;
pub mod demo;
pub mod export;
pub mod init;
pub mod predict;
pub mod report;
pub mod status;
pub mod transactions;
pub mod users;

use clap::{Args, Parser, Subcommand};
use comfy_table::{Cell as TableCell, CellAlignment, Table};

use crate::error::{RampError, Result};
use crate::export::{Cell, ExportTable};
use crate::fmt::money;
use crate::models::{Snapshot, User};
use crate::normalizer::normalize;
use crate::settings::Settings;
use crate::store::{Page, SqliteStore, Store};
use crate::users::normalize_users;

#[derive(Parser)]
#[command(
    name = "budgetramp",
    about = "Transaction analytics and rule-based fraud alerts for card data."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and initialize the database.
    Init {
        /// Path for budgetramp data (default: ~/Documents/budgetramp)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Headline figures, monthly totals and anomalies for a time range.
    Dashboard {
        /// 30D, 90D, 6M, YTD or ALL
        #[arg(long, default_value = "30D")]
        range: String,
    },
    /// List transactions flagged by the alert rules.
    Alerts {
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Aggregate reports over a time range.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Browse and edit transactions.
    Transactions {
        #[command(subcommand)]
        command: TransactionsCommands,
    },
    /// Browse and add users.
    Users {
        #[command(subcommand)]
        command: UsersCommands,
    },
    /// Ask the prediction endpoint about a transaction or a customer.
    Predict {
        #[command(subcommand)]
        command: PredictCommands,
    },
    /// Load deterministic sample users and transactions.
    Demo {
        /// Random seed; the same seed always produces the same data
        #[arg(long, default_value_t = crate::demo::DEFAULT_SEED)]
        seed: u64,
    },
    /// Show data directory, row counts and data-quality summary.
    Status,
}

#[derive(Args, Clone, Default)]
pub struct OutputArgs {
    /// Also write the table to this CSV file
    #[arg(long)]
    pub csv: Option<String>,
    /// Also write the table to this PDF file
    #[arg(long)]
    pub pdf: Option<String>,
}

#[derive(Args, Clone)]
pub struct ReportArgs {
    /// all, 3months, 6months, 12months or ytd
    #[arg(long, default_value = "all")]
    pub range: String,
    /// Comma-separated column names to keep, in order
    #[arg(long)]
    pub columns: Option<String>,
    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Totals by category.
    Category {
        #[command(flatten)]
        args: ReportArgs,
    },
    /// Totals by merchant.
    Merchant {
        #[command(flatten)]
        args: ReportArgs,
    },
    /// Month-by-month totals.
    Monthly {
        #[command(flatten)]
        args: ReportArgs,
    },
    /// Day-by-day revenue for the trailing days.
    Daily {
        #[command(flatten)]
        args: ReportArgs,
    },
    /// Every transaction in the range.
    Transactions {
        #[command(flatten)]
        args: ReportArgs,
    },
}

#[derive(Subcommand)]
pub enum TransactionsCommands {
    /// List transactions, newest first.
    List {
        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// Rows per page
        #[arg(long, default_value_t = 25)]
        size: usize,
        /// Match id, client, merchant or city
        #[arg(long)]
        search: Option<String>,
    },
    /// Add a transaction.
    Add {
        /// Transaction id (default: TXN<millis>)
        #[arg(long)]
        id: Option<String>,
        /// Amount in dollars
        #[arg(long, allow_hyphen_values = true)]
        amount: f64,
        /// Timestamp, e.g. 2025-06-01 14:30:00 (default: now)
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        client: Option<String>,
        #[arg(long)]
        card: Option<String>,
        /// Swipe, Chip or Online
        #[arg(long, default_value = "Chip")]
        method: String,
        #[arg(long)]
        merchant: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        state: Option<String>,
        #[arg(long)]
        zip: Option<String>,
        /// Category description from the MCC table, e.g. 'Grocery Stores'
        #[arg(long)]
        category: Option<String>,
        /// Merchant category code (looked up from --category when omitted)
        #[arg(long)]
        mcc: Option<String>,
        /// Mark as confirmed fraud
        #[arg(long)]
        fraud: bool,
    },
    /// Delete a transaction by id.
    Delete {
        id: String,
    },
    /// Import transactions from a CSV file.
    Import {
        /// Path to the CSV file
        file: String,
    },
}

#[derive(Subcommand)]
pub enum UsersCommands {
    /// List users with optional filters and sorting.
    List {
        /// below30, 30to60 or above60 (per-capita income, thousands)
        #[arg(long)]
        income: Option<String>,
        /// Match id, address or gender
        #[arg(long)]
        search: Option<String>,
        /// id, age, gender, credit_score, yearly_income, per_capita_income, total_debt, cards
        #[arg(long)]
        sort: Option<String>,
        /// Sort descending
        #[arg(long)]
        desc: bool,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = 25)]
        size: usize,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Add a user.
    Add {
        /// User id (default: next C-number)
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        age: Option<i64>,
        #[arg(long)]
        gender: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long = "yearly-income")]
        yearly_income: Option<f64>,
        #[arg(long = "per-capita-income")]
        per_capita_income: Option<f64>,
        #[arg(long = "total-debt")]
        total_debt: Option<f64>,
        #[arg(long = "credit-score")]
        credit_score: Option<i64>,
        #[arg(long)]
        cards: Option<i64>,
    },
}

#[derive(Subcommand)]
pub enum PredictCommands {
    /// Score a single transaction for fraud.
    Fraud {
        #[arg(long)]
        amount: f64,
        /// Hour of day, 0-23
        #[arg(long)]
        hour: u32,
        #[arg(long)]
        mcc: u32,
        #[arg(long)]
        zip: String,
        /// Swipe, Chip or Online
        #[arg(long)]
        method: String,
    },
    /// Predict a customer's monthly spending.
    Spend {
        #[arg(long)]
        age: u32,
        #[arg(long)]
        income: f64,
        #[arg(long = "avg-monthly-spend")]
        avg_monthly_spend: f64,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

pub(crate) fn open_store(settings: &Settings) -> Result<SqliteStore> {
    let db_path = settings.db_path();
    if !db_path.exists() {
        return Err(RampError::Other(
            "No database found. Run `budgetramp init` first.".to_string(),
        ));
    }
    SqliteStore::open(&db_path)
}

pub(crate) fn load_snapshot(store: &dyn Store, page: Page) -> Result<Snapshot> {
    let fetched = store.fetch_transactions(page)?;
    Ok(normalize(&fetched.rows))
}

pub(crate) fn load_users(store: &dyn Store) -> Result<Vec<User>> {
    let fetched = store.fetch_users(Page::All)?;
    Ok(normalize_users(&fetched.rows))
}

/// "id, amount" -> ["id", "amount"]; blank input means no selection.
pub(crate) fn parse_columns(raw: Option<&str>) -> Option<Vec<String>> {
    let cols: Vec<String> = raw?
        .split(',')
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    (!cols.is_empty()).then_some(cols)
}

fn screen_cell(cell: &Cell) -> String {
    match cell {
        Cell::Number(n) => money(*n),
        other => other.render(),
    }
}

/// Terminal rendering of an export table: amounts as money, numbers right-aligned.
pub(crate) fn screen_table(table: &ExportTable) -> Table {
    let numeric = table.numeric_columns();
    let mut out = Table::new();
    out.set_header(table.columns.iter().map(String::as_str).collect::<Vec<_>>());
    for row in &table.rows {
        out.add_row(row.iter().zip(&numeric).map(|(cell, &is_num)| {
            let c = TableCell::new(screen_cell(cell));
            if is_num {
                c.set_alignment(CellAlignment::Right)
            } else {
                c
            }
        }));
    }
    out
}

/// Slice of `items` for a 1-based page, plus the page count.
pub(crate) fn paginate<T>(items: &[T], page: usize, size: usize) -> (&[T], usize) {
    let size = size.max(1);
    let pages = items.len().div_ceil(size).max(1);
    let start = (page.max(1) - 1).saturating_mul(size).min(items.len());
    let end = start.saturating_add(size).min(items.len());
    (&items[start..end], pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_columns() {
        assert_eq!(
            parse_columns(Some("ID, Amount ,,Date")),
            Some(vec!["ID".to_string(), "Amount".to_string(), "Date".to_string()])
        );
        assert_eq!(parse_columns(Some(" , ")), None);
        assert_eq!(parse_columns(None), None);
    }

    #[test]
    fn test_paginate() {
        let items: Vec<u32> = (1..=7).collect();
        assert_eq!(paginate(&items, 1, 3), (&[1, 2, 3][..], 3));
        assert_eq!(paginate(&items, 3, 3), (&[7][..], 3));
        assert_eq!(paginate(&items, 9, 3).0.len(), 0);
        let empty: Vec<u32> = vec![];
        assert_eq!(paginate(&empty, 1, 10), (&[][..], 1));
    }

    #[test]
    fn test_screen_cell_formats_money() {
        assert_eq!(screen_cell(&Cell::Number(1234.5)), "$1,234.50");
        assert_eq!(screen_cell(&Cell::Integer(3)), "3");
        assert_eq!(screen_cell(&Cell::Empty), "");
    }
}
