use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};

/// A row exactly as the data store returned it: column name to loosely typed value.
pub type RawRow = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UseChip {
    Swipe,
    Chip,
    Online,
    Other(String),
}

impl UseChip {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_lowercase().as_str() {
            "swipe" | "swipe transaction" => Self::Swipe,
            "chip" | "chip transaction" => Self::Chip,
            "online" | "online transaction" => Self::Online,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Swipe => "Swipe",
            Self::Chip => "Chip",
            Self::Online => "Online",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for UseChip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical transaction produced by the normalizer. String fields are never
/// null; `amount` and `date` are `None` when upstream sent something unusable.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub date: Option<DateTime<Utc>>,
    pub client_id: String,
    pub card_id: String,
    pub amount: Option<f64>,
    pub merchant_name: String,
    pub merchant_city: String,
    pub merchant_state: String,
    pub zip: String,
    pub mcc: String,
    pub use_chip: UseChip,
    pub fraud_label: u8,
    pub category: Option<String>,
    pub errors: String,
}

impl Default for Transaction {
    fn default() -> Self {
        Self {
            id: String::new(),
            date: None,
            client_id: String::new(),
            card_id: String::new(),
            amount: None,
            merchant_name: String::new(),
            merchant_city: String::new(),
            merchant_state: String::new(),
            zip: String::new(),
            mcc: String::new(),
            use_chip: UseChip::Other(String::new()),
            fraud_label: 0,
            category: None,
            errors: String::new(),
        }
    }
}

impl Transaction {
    pub fn is_fraud(&self) -> bool {
        self.fraud_label == 1
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct User {
    pub id: String,
    pub current_age: Option<i64>,
    pub gender: String,
    pub address: String,
    pub yearly_income: Option<f64>,
    pub per_capita_income: Option<f64>,
    pub total_debt: Option<f64>,
    pub credit_score: Option<i64>,
    pub num_credit_cards: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mcc {
    pub mcc: String,
    pub description: String,
}

/// Input for inserting a transaction through the CLI.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub id: String,
    pub date: String,
    pub client_id: Option<String>,
    pub card_id: Option<String>,
    pub amount: f64,
    pub use_chip: String,
    pub merchant_name: Option<String>,
    pub merchant_city: Option<String>,
    pub merchant_state: Option<String>,
    pub zip: Option<String>,
    pub mcc: Option<String>,
    pub category: Option<String>,
    pub errors: Option<String>,
    pub fraud_label: u8,
}

/// Input for inserting a user through the CLI.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: String,
    pub current_age: Option<i64>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub yearly_income: Option<f64>,
    pub per_capita_income: Option<f64>,
    pub total_debt: Option<f64>,
    pub credit_score: Option<i64>,
    pub num_credit_cards: Option<i64>,
}

/// A single row-level data-quality problem found while normalizing.
#[derive(Debug, Clone, PartialEq)]
pub enum QualityIssue {
    MissingId { row: usize },
    UnparseableAmount { row: usize, id: String, raw: String },
    MissingDate { row: usize, id: String },
    UnparseableDate { row: usize, id: String, raw: String },
    InvalidFraudLabel { row: usize, id: String, raw: String },
}

impl QualityIssue {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingId { .. } => "missing id",
            Self::UnparseableAmount { .. } => "unparseable amount",
            Self::MissingDate { .. } => "missing date",
            Self::UnparseableDate { .. } => "unparseable date",
            Self::InvalidFraudLabel { .. } => "invalid fraud label",
        }
    }
}

impl fmt::Display for QualityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingId { row } => write!(f, "row {row}: missing id"),
            Self::UnparseableAmount { row, id, raw } => {
                write!(f, "row {row} ({id}): unparseable amount {raw:?}")
            }
            Self::MissingDate { row, id } => write!(f, "row {row} ({id}): missing date"),
            Self::UnparseableDate { row, id, raw } => {
                write!(f, "row {row} ({id}): unparseable date {raw:?}")
            }
            Self::InvalidFraudLabel { row, id, raw } => {
                write!(f, "row {row} ({id}): invalid fraud label {raw:?}")
            }
        }
    }
}

/// Immutable point-in-time set of normalized transactions plus everything
/// the normalizer had to default or drop along the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub transactions: Vec<Transaction>,
    pub issues: Vec<QualityIssue>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn undated(&self) -> usize {
        self.transactions.iter().filter(|t| t.date.is_none()).count()
    }

    pub fn unparsed_amounts(&self) -> usize {
        self.transactions.iter().filter(|t| t.amount.is_none()).count()
    }

    pub fn issue_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for issue in &self.issues {
            *counts.entry(issue.kind()).or_insert(0) += 1;
        }
        counts
    }
}
