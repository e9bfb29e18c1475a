use std::path::PathBuf;

use chrono::Utc;
use colored::Colorize;

use crate::cli::{load_snapshot, open_store, paginate, screen_table};
use crate::error::{RampError, Result};
use crate::export::table::{transactions_table, TRANSACTION_COLUMNS};
use crate::models::{NewTransaction, Transaction};
use crate::settings::{load_settings, shellexpand_path};
use crate::store::{Page, Store};

fn matches_search(t: &Transaction, needle: &str) -> bool {
    [&t.id, &t.client_id, &t.merchant_name, &t.merchant_city]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

pub fn list(page: usize, size: usize, search: Option<&str>) -> Result<()> {
    let settings = load_settings();
    let store = open_store(&settings)?;
    let needle = search.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty());

    let (rows, total, pages) = match needle {
        // Search runs over the whole table, then pages the matches.
        Some(needle) => {
            let snapshot = load_snapshot(&store, Page::All)?;
            let hits: Vec<Transaction> = snapshot
                .transactions
                .into_iter()
                .filter(|t| matches_search(t, &needle))
                .collect();
            let (slice, pages) = paginate(&hits, page, size);
            (slice.to_vec(), hits.len(), pages)
        }
        None => {
            let fetched = store.fetch_transactions(Page::Range { page, size })?;
            let pages = fetched.total.div_ceil(size.max(1)).max(1);
            let total = fetched.total;
            (crate::normalizer::normalize(&fetched.rows).transactions, total, pages)
        }
    };

    if rows.is_empty() {
        println!("No transactions found.");
        return Ok(());
    }
    let table = transactions_table(&rows).with_columns(&TRANSACTION_COLUMNS.map(String::from))?;
    println!("Transactions\n{}", screen_table(&table));
    println!("Page {} of {pages} ({total} transactions)", page.max(1));
    Ok(())
}

pub struct AddTransaction {
    pub id: Option<String>,
    pub amount: f64,
    pub date: Option<String>,
    pub client: Option<String>,
    pub card: Option<String>,
    pub method: String,
    pub merchant: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub category: Option<String>,
    pub mcc: Option<String>,
    pub fraud: bool,
}

/// Look up the code for a category description in the MCC table.
fn resolve_mcc(store: &dyn Store, category: &str) -> Result<Option<String>> {
    let codes = store.fetch_mcc()?;
    let found = codes
        .into_iter()
        .find(|m| m.description.eq_ignore_ascii_case(category.trim()))
        .map(|m| m.mcc);
    if found.is_none() {
        log::warn!("category {category:?} is not in the MCC table; storing without a code");
    }
    Ok(found)
}

pub fn add(args: AddTransaction) -> Result<()> {
    if !args.amount.is_finite() {
        return Err(RampError::Other(format!("Invalid amount: {}", args.amount)));
    }
    let settings = load_settings();
    let store = open_store(&settings)?;

    let now = Utc::now();
    let mcc = match (&args.mcc, &args.category) {
        (Some(code), _) => Some(code.clone()),
        (None, Some(category)) => resolve_mcc(&store, category)?,
        (None, None) => None,
    };
    let date = match args.date {
        Some(raw) => {
            if crate::normalizer::parse_date(&raw).is_none() {
                return Err(RampError::Other(format!("Unrecognized date: {raw}")));
            }
            raw
        }
        None => now.format("%Y-%m-%d %H:%M:%S").to_string(),
    };
    let txn = NewTransaction {
        id: args.id.unwrap_or_else(|| format!("TXN{}", now.timestamp_millis())),
        date,
        client_id: args.client,
        card_id: args.card,
        amount: args.amount,
        use_chip: args.method,
        merchant_name: args.merchant,
        merchant_city: args.city,
        merchant_state: args.state,
        zip: args.zip,
        mcc,
        category: args.category,
        errors: None,
        fraud_label: u8::from(args.fraud),
    };
    store.insert_transaction(&txn)?;
    println!("Added transaction {}", txn.id.bold());
    Ok(())
}

pub fn delete(id: &str) -> Result<()> {
    let settings = load_settings();
    let store = open_store(&settings)?;
    if !store.delete_transaction(id)? {
        return Err(RampError::Other(format!("No transaction with id {id}")));
    }
    println!("Deleted transaction {id}");
    Ok(())
}

pub fn import(file: &str) -> Result<()> {
    let settings = load_settings();
    let store = open_store(&settings)?;
    let path = PathBuf::from(shellexpand_path(file));
    if !path.exists() {
        return Err(RampError::Other(format!("File not found: {}", path.display())));
    }
    let result = store.import_csv(&path)?;
    if result.duplicate_file {
        println!("This file has already been imported (duplicate checksum).");
        return Ok(());
    }
    println!("{} imported, {} skipped (duplicate ids)", result.imported, result.skipped);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;

    #[test]
    fn test_search_matches_merchant_case_insensitively() {
        let t = Transaction {
            id: "TXN1".to_string(),
            merchant_name: "Walmart #12".to_string(),
            ..Default::default()
        };
        assert!(matches_search(&t, "walmart"));
        assert!(matches_search(&t, "txn1"));
        assert!(!matches_search(&t, "amazon"));
    }

    #[test]
    fn test_resolve_mcc_by_description() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("t.db")).unwrap();
        assert_eq!(resolve_mcc(&store, "grocery stores").unwrap().as_deref(), Some("5411"));
        assert_eq!(resolve_mcc(&store, "Spaceships").unwrap(), None);
    }
}
