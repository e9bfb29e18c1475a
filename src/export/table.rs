use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::aggregator::{DailyBucket, GroupTotal, MonthBucket};
use crate::categorizer::category_for;
use crate::classifier::FlaggedReport;
use crate::error::{RampError, Result};
use crate::models::{Transaction, User};

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Integer(i64),
    Empty,
}

impl Cell {
    /// Plain rendering for files: no currency symbol, no thousands separators.
    /// Numbers are rounded to cents; non-finite numbers render empty.
    pub fn render(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) if n.is_finite() => format!("{}", (n * 100.0).round() / 100.0 + 0.0),
            Cell::Number(_) => String::new(),
            Cell::Integer(i) => i.to_string(),
            Cell::Empty => String::new(),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Cell::Number(_) | Cell::Integer(_))
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<usize> for Cell {
    fn from(n: usize) -> Self {
        Cell::Integer(i64::try_from(n).unwrap_or(i64::MAX))
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(v: Option<T>) -> Self {
        v.map_or(Cell::Empty, Into::into)
    }
}

impl From<i64> for Cell {
    fn from(n: i64) -> Self {
        Cell::Integer(n)
    }
}

/// Column name to value. Columns a record lacks render empty.
pub type Record = BTreeMap<String, Cell>;

#[derive(Debug, Clone, PartialEq)]
pub struct ExportTable {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl ExportTable {
    /// Project records onto `columns`, keeping the caller's column order.
    pub fn from_records(title: &str, columns: &[&str], records: &[Record]) -> Self {
        let rows = records
            .iter()
            .map(|rec| {
                columns
                    .iter()
                    .map(|c| rec.get(*c).cloned().unwrap_or(Cell::Empty))
                    .collect()
            })
            .collect();
        Self {
            title: title.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    /// Keep only `wanted` columns, in that order. Names match case-insensitively.
    pub fn with_columns(&self, wanted: &[String]) -> Result<Self> {
        let mut picks = Vec::with_capacity(wanted.len());
        for name in wanted {
            let idx = self
                .columns
                .iter()
                .position(|c| c.eq_ignore_ascii_case(name.trim()))
                .ok_or_else(|| RampError::UnknownColumn(name.clone()))?;
            picks.push(idx);
        }
        Ok(Self {
            title: self.title.clone(),
            columns: picks.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| picks.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rendered rows, for screen tables and PDF.
    pub fn rendered_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(Cell::render).collect())
            .collect()
    }

    /// A column is numeric when every non-empty cell in it is.
    pub fn numeric_columns(&self) -> Vec<bool> {
        (0..self.columns.len())
            .map(|i| {
                let mut cells = self.rows.iter().map(|r| &r[i]).filter(|c| **c != Cell::Empty);
                let mut any = false;
                let all = cells.all(|c| {
                    any = true;
                    c.is_numeric()
                });
                any && all
            })
            .collect()
    }
}

fn record<const N: usize>(pairs: [(&str, Cell); N]) -> Record {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

pub fn format_timestamp(date: Option<DateTime<Utc>>) -> Cell {
    date.map_or(Cell::Empty, |d| Cell::Text(d.format("%Y-%m-%d %H:%M").to_string()))
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

fn group_table(title: &str, key: &str, groups: &[GroupTotal]) -> ExportTable {
    let records: Vec<Record> = groups
        .iter()
        .map(|g| {
            record([
                (key, g.name.as_str().into()),
                ("Amount", g.total.into()),
                ("Count", g.count.into()),
            ])
        })
        .collect();
    ExportTable::from_records(title, &[key, "Amount", "Count"], &records)
}

pub fn category_table(groups: &[GroupTotal]) -> ExportTable {
    group_table("Spending by Category", "Category", groups)
}

pub fn merchant_table(groups: &[GroupTotal]) -> ExportTable {
    group_table("Spending by Merchant", "Merchant", groups)
}

pub fn monthly_table(buckets: &[MonthBucket]) -> ExportTable {
    let records: Vec<Record> = buckets
        .iter()
        .map(|b| {
            record([
                ("Month", b.label().into()),
                ("Amount", b.amount.into()),
                ("Count", b.count.into()),
            ])
        })
        .collect();
    ExportTable::from_records("Monthly Totals", &["Month", "Amount", "Count"], &records)
}

pub fn daily_table(buckets: &[DailyBucket]) -> ExportTable {
    let records: Vec<Record> = buckets
        .iter()
        .map(|b| {
            record([
                ("Date", b.key().into()),
                ("Amount", b.amount.into()),
                ("Count", b.count.into()),
            ])
        })
        .collect();
    ExportTable::from_records("Daily Revenue", &["Date", "Amount", "Count"], &records)
}

pub const ALERT_COLUMNS: [&str; 6] = ["ID", "Client", "Amount", "City", "Status", "Date"];

pub fn alerts_table(report: &FlaggedReport<'_>) -> ExportTable {
    let records: Vec<Record> = report
        .alerts
        .iter()
        .map(|a| {
            record([
                ("ID", a.txn.id.as_str().into()),
                ("Client", a.txn.client_id.as_str().into()),
                ("Amount", a.txn.amount.into()),
                ("City", a.txn.merchant_city.as_str().into()),
                ("Status", a.level.as_str().into()),
                ("Date", format_timestamp(a.txn.date)),
            ])
        })
        .collect();
    ExportTable::from_records("Fraud Alerts", &ALERT_COLUMNS, &records)
}

pub const TRANSACTION_COLUMNS: [&str; 6] = ["ID", "Client", "Merchant", "Amount", "Date", "Fraud"];

fn transaction_record(t: &Transaction) -> Record {
    record([
        ("ID", t.id.as_str().into()),
        ("Client", t.client_id.as_str().into()),
        ("Card", t.card_id.as_str().into()),
        ("Merchant", t.merchant_name.as_str().into()),
        ("City", t.merchant_city.as_str().into()),
        ("State", t.merchant_state.as_str().into()),
        ("Zip", t.zip.as_str().into()),
        ("MCC", t.mcc.as_str().into()),
        ("Category", category_for(t).into()),
        ("Method", t.use_chip.as_str().into()),
        ("Amount", t.amount.into()),
        ("Date", format_timestamp(t.date)),
        ("Fraud", Cell::from(if t.is_fraud() { "Yes" } else { "No" })),
        ("Errors", t.errors.as_str().into()),
    ])
}

/// Every known transaction field; the first six are the default listing
/// (`TRANSACTION_COLUMNS`), the rest are reachable through `with_columns`.
pub fn transactions_table<'a, I>(txns: I) -> ExportTable
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let records: Vec<Record> = txns.into_iter().map(transaction_record).collect();
    ExportTable::from_records("Transactions", &ALL_TRANSACTION_FIELDS, &records)
}

pub const ALL_TRANSACTION_FIELDS: [&str; 14] = [
    "ID", "Client", "Merchant", "Amount", "Date", "Fraud", "Card", "City", "State", "Zip", "MCC",
    "Category", "Method", "Errors",
];

pub const USER_COLUMNS: [&str; 7] = [
    "ID",
    "Gender",
    "Age",
    "Credit Score",
    "Per Capita Income",
    "Yearly Income",
    "Cards",
];

pub fn users_table(users: &[&User]) -> ExportTable {
    let records: Vec<Record> = users
        .iter()
        .map(|u| {
            record([
                ("ID", u.id.as_str().into()),
                ("Gender", u.gender.as_str().into()),
                ("Age", u.current_age.into()),
                ("Credit Score", u.credit_score.into()),
                ("Per Capita Income", u.per_capita_income.into()),
                ("Yearly Income", u.yearly_income.into()),
                ("Cards", u.num_credit_cards.into()),
                ("Address", u.address.as_str().into()),
                ("Total Debt", u.total_debt.into()),
            ])
        })
        .collect();
    let mut columns = USER_COLUMNS.to_vec();
    columns.extend(["Address", "Total Debt"]);
    ExportTable::from_records("Users", &columns, &records)
}
