use std::path::PathBuf;

use crate::error::Result;
use crate::settings::{load_settings, save_settings, settings_path, shellexpand_path};
use crate::store::SqliteStore;

pub fn run(data_dir: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }

    let data_dir = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&data_dir)?;
    std::fs::create_dir_all(settings.exports_dir())?;

    let db_path = settings.db_path();
    SqliteStore::open(&db_path)?;
    save_settings(&settings)?;

    println!("Initialized budgetramp");
    println!("  Data dir:  {}", data_dir.display());
    println!("  Database:  {}", db_path.display());
    println!("  Settings:  {}", settings_path().display());
    println!();
    println!("Try these next:");
    println!("  budgetramp demo");
    println!("  budgetramp dashboard");
    Ok(())
}
