use std::path::PathBuf;

use crate::cli::load_snapshot;
use crate::error::Result;
use crate::settings::{load_settings, settings_file_exists, settings_path};
use crate::store::{Page, SqliteStore, Store};

pub fn run() -> Result<()> {
    let settings = load_settings();
    let data_dir = PathBuf::from(&settings.data_dir);
    let db_path = settings.db_path();

    println!("Data dir:   {}", data_dir.display());
    println!("Database:   {}", db_path.display());
    println!(
        "Settings:   {}{}",
        settings_path().display(),
        if settings_file_exists() { "" } else { " (not created)" }
    );
    println!(
        "Prediction: {}",
        if settings.prediction_url.trim().is_empty() {
            "(not configured)"
        } else {
            settings.prediction_url.as_str()
        }
    );

    if !db_path.exists() {
        println!();
        println!("Database not found. Run `budgetramp init` to set up.");
        return Ok(());
    }

    let store = SqliteStore::open(&db_path)?;
    let snapshot = load_snapshot(&store, Page::All)?;
    let users = store.fetch_users(Page::Range { page: 1, size: 1 })?.total;

    println!();
    println!("Transactions:  {}", snapshot.len());
    println!("Users:         {users}");
    println!("Imports:       {}", store.import_count()?);
    println!("MCC codes:     {}", store.fetch_mcc()?.len());

    if snapshot.is_empty() {
        println!();
        println!("No transactions yet. Try `budgetramp demo` or `budgetramp transactions import`.");
        return Ok(());
    }

    println!();
    if snapshot.issues.is_empty() {
        println!("Data quality:  no issues");
    } else {
        println!("Data quality:  {} issues", snapshot.issues.len());
        for (kind, n) in snapshot.issue_counts() {
            println!("  {kind:<20} {n}");
        }
    }
    println!("Undated:       {}", snapshot.undated());
    println!("No amount:     {}", snapshot.unparsed_amounts());
    Ok(())
}
