use chrono::Utc;

use crate::cli::open_store;
use crate::demo::generate;
use crate::error::Result;
use crate::settings::load_settings;
use crate::store::{Page, SqliteStore, Store};

const FIRST_PAGE: Page = Page::Range { page: 1, size: 1 };

/// Insert the generated rows. Returns (users, transactions) written.
fn insert_demo_data(store: &SqliteStore, seed: u64) -> Result<(usize, usize)> {
    let data = generate(seed, Utc::now());
    for user in &data.users {
        store.insert_user(user)?;
    }
    for txn in &data.transactions {
        store.insert_transaction(txn)?;
    }
    Ok((data.users.len(), data.transactions.len()))
}

pub fn run(seed: u64) -> Result<()> {
    let settings = load_settings();
    let store = open_store(&settings)?;

    // Idempotency guard
    let existing_txns = store.fetch_transactions(FIRST_PAGE)?.total;
    let existing_users = store.fetch_users(FIRST_PAGE)?.total;
    if existing_txns > 0 || existing_users > 0 {
        println!(
            "Database already has data ({existing_txns} transactions, {existing_users} users); demo not loaded."
        );
        return Ok(());
    }

    let (users, txns) = insert_demo_data(&store, seed)?;
    println!("Demo data loaded!");
    println!("  Seed:         {seed}");
    println!("  Users:        {users}");
    println!("  Transactions: {txns}");
    println!();
    println!("Try these next:");
    println!("  budgetramp dashboard --range 90D");
    println!("  budgetramp alerts");
    println!("  budgetramp report category --range 6months");
    println!("  budgetramp users list --sort credit_score --desc");
    Ok(())
}
