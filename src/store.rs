//! Row store behind the analytics core.
//!
//! The store hands back loosely typed rows (`RawRow`) exactly as they sit in
//! the database; turning them into `Transaction`s is the normalizer's job.
//! `amount`, `date`, `mcc` and the user numeric columns are declared without
//! a type so whatever upstream wrote survives untouched. Ordering goes
//! through `sort_key`, the parsed `date` as UTC `%Y-%m-%dT%H:%M:%S` (null
//! when the date does not parse).

use std::path::Path;

use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params, params_from_iter, Connection};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{RampError, Result};
use crate::models::{Mcc, NewTransaction, NewUser, RawRow};
use crate::normalizer::value_to_date;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL,
    import_date TEXT DEFAULT (datetime('now')),
    record_count INTEGER,
    skipped INTEGER,
    checksum TEXT UNIQUE
);

CREATE TABLE IF NOT EXISTS transactions (
    id TEXT UNIQUE,
    date,
    client_id TEXT,
    card_id TEXT,
    amount,
    use_chip TEXT,
    merchant_name TEXT,
    merchant_city TEXT,
    merchant_state TEXT,
    zip TEXT,
    mcc,
    errors TEXT,
    fraud_label,
    category TEXT,
    sort_key TEXT,
    import_id INTEGER,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (import_id) REFERENCES imports(id)
);

CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    current_age,
    gender TEXT,
    address TEXT,
    yearly_income,
    per_capita_income,
    total_debt,
    credit_score,
    num_credit_cards
);

CREATE TABLE IF NOT EXISTS mcc (
    mcc TEXT PRIMARY KEY,
    description TEXT NOT NULL
);
";

/// Columns of a transaction row, in the order they are returned.
pub const TRANSACTION_FIELDS: [&str; 14] = [
    "id",
    "date",
    "client_id",
    "card_id",
    "amount",
    "use_chip",
    "merchant_name",
    "merchant_city",
    "merchant_state",
    "zip",
    "mcc",
    "errors",
    "fraud_label",
    "category",
];

const USER_FIELDS: &str = "id, current_age, gender, address, yearly_income, per_capita_income, \
                           total_debt, credit_score, num_credit_cards";

pub const DEFAULT_MCC: &[(&str, &str)] = &[
    ("5411", "Grocery Stores"),
    ("5812", "Eating Places, Restaurants"),
    ("4511", "Airlines"),
    ("5541", "Service Stations"),
    ("5912", "Drug Stores and Pharmacies"),
    ("7999", "Recreation Services"),
    ("5311", "Department Stores"),
    ("5941", "Sporting Goods Stores"),
    ("4121", "Taxicabs and Limousines"),
    ("5814", "Fast Food Restaurants"),
    ("5651", "Family Clothing Stores"),
    ("7011", "Hotels, Motels, and Resorts"),
    ("5977", "Cosmetic Stores"),
    ("5942", "Book Stores"),
    ("8062", "Hospitals"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    All,
    /// 1-based page of `size` rows.
    Range { page: usize, size: usize },
}

impl Page {
    fn limit_offset(&self) -> (i64, i64) {
        match *self {
            Page::All => (-1, 0),
            Page::Range { page, size } => {
                let size = i64::try_from(size).unwrap_or(i64::MAX);
                let skip = i64::try_from(page.max(1) - 1).unwrap_or(0);
                (size, skip.saturating_mul(size))
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Fetched {
    pub rows: Vec<RawRow>,
    /// Exact number of rows in the table, regardless of paging.
    pub total: usize,
}

pub trait Store {
    /// Newest first.
    fn fetch_transactions(&self, page: Page) -> Result<Fetched>;
    /// Ordered by id.
    fn fetch_users(&self, page: Page) -> Result<Fetched>;
    /// Ordered by description.
    fn fetch_mcc(&self) -> Result<Vec<Mcc>>;
    fn insert_transaction(&self, txn: &NewTransaction) -> Result<()>;
    fn insert_user(&self, user: &NewUser) -> Result<()>;
    /// Store a row verbatim. Returns false when a row with the same id exists.
    fn insert_raw_transaction(&self, row: &RawRow) -> Result<bool>;
    /// Returns false when no row had that id.
    fn delete_transaction(&self, id: &str) -> Result<bool>;
}

pub struct SqliteStore {
    conn: Connection,
}

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    let count: i64 = conn.query_row("SELECT count(*) FROM mcc", [], |row| row.get(0))?;
    if count == 0 {
        for (code, description) in DEFAULT_MCC {
            conn.execute(
                "INSERT INTO mcc (mcc, description) VALUES (?1, ?2)",
                params![code, description],
            )?;
        }
    }
    Ok(())
}

fn json_value(v: ValueRef<'_>) -> Value {
    match v {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(String::from_utf8_lossy(b).into_owned()),
    }
}

fn sql_value(v: &Value) -> SqlValue {
    match v {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => n.as_f64().map_or(SqlValue::Null, SqlValue::Real),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

const SORT_KEY_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

fn sort_key(date: Option<&Value>) -> Option<String> {
    value_to_date(date).map(|dt| dt.format(SORT_KEY_FORMAT).to_string())
}

fn query_rows<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<RawRow>> {
    let mut stmt = conn.prepare(sql)?;
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let rows = stmt.query_map(params, |row| {
        let mut map = RawRow::new();
        for (i, name) in names.iter().enumerate() {
            map.insert(name.clone(), json_value(row.get_ref(i)?));
        }
        Ok(map)
    })?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

fn count(conn: &Connection, table: &str) -> Result<usize> {
    let n: i64 = conn.query_row(&format!("SELECT count(*) FROM {table}"), [], |r| r.get(0))?;
    Ok(usize::try_from(n).unwrap_or(0))
}

impl SqliteStore {
    /// Open (creating if needed) the database at `db_path`.
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = get_connection(db_path)?;
        init_db(&conn)?;
        log::debug!("opened store at {}", db_path.display());
        Ok(Self { conn })
    }

    fn transaction_exists(&self, id: &str) -> Result<bool> {
        let mut stmt = self.conn.prepare_cached("SELECT 1 FROM transactions WHERE id = ?1")?;
        Ok(stmt.exists([id])?)
    }

    /// Load a CSV export of transactions. Header names are matched to
    /// columns case-insensitively; unknown headers are ignored and empty
    /// cells are stored as null. A file already imported is skipped whole,
    /// rows whose id already exists are skipped individually.
    pub fn import_csv(&self, path: &Path) -> Result<ImportResult> {
        let checksum = compute_checksum(path)?;
        {
            let mut stmt = self.conn.prepare("SELECT 1 FROM imports WHERE checksum = ?1")?;
            if stmt.exists([&checksum])? {
                log::info!("{} already imported", path.display());
                return Ok(ImportResult {
                    imported: 0,
                    skipped: 0,
                    duplicate_file: true,
                });
            }
        }

        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        let headers: Vec<Option<&'static str>> = rdr
            .headers()?
            .iter()
            .map(|h| {
                let h = h.trim();
                let known = TRANSACTION_FIELDS.iter().copied().find(|f| f.eq_ignore_ascii_case(h));
                if known.is_none() {
                    log::debug!("ignoring column {h:?}");
                }
                known
            })
            .collect();

        let mut imported = 0usize;
        let mut skipped = 0usize;
        for record in rdr.records() {
            let record = record?;
            let mut row = RawRow::new();
            for (field, value) in headers.iter().zip(record.iter()) {
                if let Some(field) = field {
                    let value = if value.trim().is_empty() {
                        Value::Null
                    } else {
                        Value::String(value.to_string())
                    };
                    row.insert(field.to_string(), value);
                }
            }
            if self.insert_raw_transaction(&row)? {
                imported += 1;
            } else {
                skipped += 1;
            }
        }

        self.conn.execute(
            "INSERT INTO imports (filename, record_count, skipped, checksum) VALUES (?1, ?2, ?3, ?4)",
            params![
                path.file_name().and_then(|n| n.to_str()).unwrap_or(""),
                imported as i64,
                skipped as i64,
                checksum,
            ],
        )?;
        log::info!("imported {imported} rows from {} ({skipped} skipped)", path.display());
        Ok(ImportResult {
            imported,
            skipped,
            duplicate_file: false,
        })
    }

    pub fn import_count(&self) -> Result<usize> {
        count(&self.conn, "imports")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportResult {
    pub imported: usize,
    pub skipped: usize,
    pub duplicate_file: bool,
}

fn compute_checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

impl Store for SqliteStore {
    fn fetch_transactions(&self, page: Page) -> Result<Fetched> {
        let (limit, offset) = page.limit_offset();
        let sql = format!(
            "SELECT {} FROM transactions \
             ORDER BY sort_key IS NULL, sort_key DESC, rowid LIMIT ?1 OFFSET ?2",
            TRANSACTION_FIELDS.join(", ")
        );
        let rows = query_rows(&self.conn, &sql, params![limit, offset])?;
        let total = count(&self.conn, "transactions")?;
        log::debug!("fetched {} of {total} transactions", rows.len());
        Ok(Fetched { rows, total })
    }

    fn fetch_users(&self, page: Page) -> Result<Fetched> {
        let (limit, offset) = page.limit_offset();
        let sql = format!("SELECT {USER_FIELDS} FROM users ORDER BY id LIMIT ?1 OFFSET ?2");
        let rows = query_rows(&self.conn, &sql, params![limit, offset])?;
        let total = count(&self.conn, "users")?;
        Ok(Fetched { rows, total })
    }

    fn fetch_mcc(&self) -> Result<Vec<Mcc>> {
        let mut stmt = self
            .conn
            .prepare("SELECT mcc, description FROM mcc ORDER BY description")?;
        let rows = stmt.query_map([], |row| {
            Ok(Mcc {
                mcc: row.get(0)?,
                description: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    fn insert_transaction(&self, txn: &NewTransaction) -> Result<()> {
        if self.transaction_exists(&txn.id)? {
            return Err(RampError::Other(format!("Transaction {} already exists", txn.id)));
        }
        self.conn.execute(
            "INSERT INTO transactions (id, date, client_id, card_id, amount, use_chip, \
             merchant_name, merchant_city, merchant_state, zip, mcc, errors, fraud_label, category, \
             sort_key) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                txn.id,
                txn.date,
                txn.client_id,
                txn.card_id,
                txn.amount,
                txn.use_chip,
                txn.merchant_name,
                txn.merchant_city,
                txn.merchant_state,
                txn.zip,
                txn.mcc,
                txn.errors,
                txn.fraud_label,
                txn.category,
                sort_key(Some(&Value::String(txn.date.clone()))),
            ],
        )?;
        log::info!("inserted transaction {}", txn.id);
        Ok(())
    }

    fn insert_user(&self, user: &NewUser) -> Result<()> {
        self.conn.execute(
            &format!("INSERT INTO users ({USER_FIELDS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
            params![
                user.id,
                user.current_age,
                user.gender,
                user.address,
                user.yearly_income,
                user.per_capita_income,
                user.total_debt,
                user.credit_score,
                user.num_credit_cards,
            ],
        )?;
        log::info!("inserted user {}", user.id);
        Ok(())
    }

    fn insert_raw_transaction(&self, row: &RawRow) -> Result<bool> {
        let fields: Vec<&str> = TRANSACTION_FIELDS
            .iter()
            .copied()
            .filter(|f| row.contains_key(*f))
            .collect();
        if fields.is_empty() {
            return Ok(false);
        }
        let placeholders: Vec<String> = (1..=fields.len() + 1).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT OR IGNORE INTO transactions ({}, sort_key) VALUES ({})",
            fields.join(", "),
            placeholders.join(", ")
        );
        let key = sort_key(row.get("date")).map_or(SqlValue::Null, SqlValue::Text);
        let values = fields
            .iter()
            .map(|f| sql_value(&row[*f]))
            .chain(std::iter::once(key));
        let changed = self.conn.execute(&sql, params_from_iter(values))?;
        Ok(changed == 1)
    }

    fn delete_transaction(&self, id: &str) -> Result<bool> {
        let changed = self.conn.execute("DELETE FROM transactions WHERE id = ?1", [id])?;
        if changed > 0 {
            log::info!("deleted transaction {id}");
        }
        Ok(changed > 0)
    }
}
