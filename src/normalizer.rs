use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use crate::models::{QualityIssue, RawRow, Snapshot, Transaction, UseChip};

// ---------------------------------------------------------------------------
// Field coercion helpers
// ---------------------------------------------------------------------------

/// Parse a money string. Strips `$`, `,` and stray quotes, reads accounting
/// parentheses as negative. Non-finite results count as unparseable.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let s = raw.replace([',', '"', '$'], "");
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let value = match s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        Some(inner) => -inner.trim().parse::<f64>().ok()?,
        None => s.parse::<f64>().ok()?,
    };
    value.is_finite().then_some(value)
}

/// Parse a timestamp in any of the shapes the data store has been seen to
/// emit. Offset-less values are taken to be UTC.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    for fmt in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|n| n.and_utc());
        }
    }
    None
}

/// Render any JSON value as the string a loose client would see. Null and
/// missing become the empty string.
pub(crate) fn value_to_string(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => number_to_string(n),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}

fn number_to_string(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}

pub(crate) fn value_to_f64(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => parse_amount(s),
        _ => None,
    }
}

pub(crate) fn value_to_i64(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn value_to_date(value: Option<&Value>) -> Option<DateTime<Utc>> {
    match value? {
        Value::String(s) => parse_date(s),
        Value::Number(n) => n.as_i64().and_then(|secs| DateTime::from_timestamp(secs, 0)),
        _ => None,
    }
}

fn is_absent(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        _ => false,
    }
}

fn value_to_fraud_label(value: Option<&Value>) -> Option<u8> {
    match value {
        None | Some(Value::Null) => Some(0),
        Some(Value::Bool(b)) => Some(u8::from(*b)),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) if f == 1.0 => Some(1),
            Some(f) if f == 0.0 => Some(0),
            _ => None,
        },
        Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "1" | "true" => Some(1),
            "0" | "false" | "" => Some(0),
            _ => None,
        },
        Some(_) => None,
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Coerce one raw row into a canonical transaction. Never fails: anything
/// unusable is defaulted and reported as a [`QualityIssue`].
pub fn normalize_row(row_index: usize, row: &RawRow) -> (Transaction, Vec<QualityIssue>) {
    let mut issues = Vec::new();

    let id = value_to_string(row.get("id"));
    if id.trim().is_empty() {
        issues.push(QualityIssue::MissingId { row: row_index });
    }

    let amount = value_to_f64(row.get("amount"));
    if amount.is_none() {
        issues.push(QualityIssue::UnparseableAmount {
            row: row_index,
            id: id.clone(),
            raw: value_to_string(row.get("amount")),
        });
    }

    let date = value_to_date(row.get("date"));
    if date.is_none() {
        if is_absent(row.get("date")) {
            issues.push(QualityIssue::MissingDate { row: row_index, id: id.clone() });
        } else {
            issues.push(QualityIssue::UnparseableDate {
                row: row_index,
                id: id.clone(),
                raw: value_to_string(row.get("date")),
            });
        }
    }

    let fraud_label = match value_to_fraud_label(row.get("fraud_label")) {
        Some(label) => label,
        None => {
            issues.push(QualityIssue::InvalidFraudLabel {
                row: row_index,
                id: id.clone(),
                raw: value_to_string(row.get("fraud_label")),
            });
            0
        }
    };

    let category = Some(value_to_string(row.get("category")))
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    let txn = Transaction {
        id,
        date,
        client_id: value_to_string(row.get("client_id")),
        card_id: value_to_string(row.get("card_id")),
        amount,
        merchant_name: value_to_string(row.get("merchant_name")),
        merchant_city: value_to_string(row.get("merchant_city")),
        merchant_state: value_to_string(row.get("merchant_state")),
        zip: value_to_string(row.get("zip")),
        mcc: value_to_string(row.get("mcc")).trim().to_string(),
        use_chip: UseChip::parse(&value_to_string(row.get("use_chip"))),
        fraud_label,
        category,
        errors: value_to_string(row.get("errors")),
    };

    (txn, issues)
}

/// Normalize a fetched batch into a [`Snapshot`]. Row order is preserved.
pub fn normalize(rows: &[RawRow]) -> Snapshot {
    let mut snapshot = Snapshot {
        transactions: Vec::with_capacity(rows.len()),
        issues: Vec::new(),
    };
    for (i, row) in rows.iter().enumerate() {
        let (txn, issues) = normalize_row(i, row);
        for issue in &issues {
            log::warn!("data quality: {issue}");
        }
        snapshot.transactions.push(txn);
        snapshot.issues.extend(issues);
    }
    log::debug!(
        "normalized {} rows ({} quality issues)",
        snapshot.transactions.len(),
        snapshot.issues.len()
    );
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    fn row(value: Value) -> RawRow {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,234.56"), Some(1234.56));
        assert_eq!(parse_amount("$42.10"), Some(42.10));
        assert_eq!(parse_amount("(500.00)"), Some(-500.0));
        assert_eq!(parse_amount("-12"), Some(-12.0));
        assert_eq!(parse_amount("  "), None);
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("NaN"), None);
        assert_eq!(parse_amount("inf"), None);
    }

    #[test]
    fn test_parse_date_formats() {
        let rfc = parse_date("2024-03-05T10:15:00Z").unwrap();
        assert_eq!((rfc.year(), rfc.month(), rfc.day(), rfc.hour()), (2024, 3, 5, 10));

        let offset = parse_date("2024-03-05T23:30:00-05:00").unwrap();
        assert_eq!((offset.month(), offset.day(), offset.hour()), (3, 6, 4));

        let short_offset = parse_date("2024-03-05 10:15:00+00").unwrap();
        assert_eq!(short_offset, rfc);

        let naive = parse_date("2024-03-05 10:15:00").unwrap();
        assert_eq!(naive, rfc);

        let day = parse_date("2024-03-05").unwrap();
        assert_eq!((day.day(), day.hour()), (5, 0));

        let mdy = parse_date("03/05/2024").unwrap();
        assert_eq!(mdy, day);

        assert!(parse_date("yesterday").is_none());
        assert!(parse_date("").is_none());
    }

    #[test]
    fn test_complete_row() {
        let (txn, issues) = normalize_row(
            0,
            &row(json!({
                "id": "TXN1",
                "date": "2024-03-05T10:15:00Z",
                "client_id": "C1001",
                "card_id": "CARD-1",
                "amount": 25.5,
                "use_chip": "Chip Transaction",
                "merchant_name": "Walmart",
                "merchant_city": "Austin",
                "merchant_state": "TX",
                "zip": 78701,
                "mcc": 5411,
                "fraud_label": 1
            })),
        );
        assert!(issues.is_empty(), "{issues:?}");
        assert_eq!(txn.amount, Some(25.5));
        assert_eq!(txn.mcc, "5411");
        assert_eq!(txn.zip, "78701");
        assert_eq!(txn.use_chip, UseChip::Chip);
        assert!(txn.is_fraud());
        assert!(txn.category.is_none());
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let (txn, _) = normalize_row(
            0,
            &row(json!({ "id": "TXN2", "date": "2024-01-01", "amount": "10", "merchant_name": null })),
        );
        assert_eq!(txn.merchant_name, "");
        assert_eq!(txn.merchant_city, "");
        assert_eq!(txn.client_id, "");
        assert_eq!(txn.mcc, "");
        assert_eq!(txn.fraud_label, 0);
        assert_eq!(txn.amount, Some(10.0));
    }

    #[test]
    fn test_float_mcc_renders_as_integer() {
        let (txn, _) = normalize_row(0, &row(json!({ "id": "a", "mcc": 5812.0 })));
        assert_eq!(txn.mcc, "5812");
    }

    #[test]
    fn test_bad_amount_is_reported_not_thrown() {
        let (txn, issues) = normalize_row(
            3,
            &row(json!({ "id": "TXN3", "date": "2024-01-01", "amount": "twelve" })),
        );
        assert_eq!(txn.amount, None);
        assert_eq!(
            issues,
            vec![QualityIssue::UnparseableAmount {
                row: 3,
                id: "TXN3".to_string(),
                raw: "twelve".to_string()
            }]
        );
    }

    #[test]
    fn test_bad_and_missing_dates() {
        let snapshot = normalize(&[
            row(json!({ "id": "a", "amount": 1, "date": "not a date" })),
            row(json!({ "id": "b", "amount": 1 })),
            row(json!({ "id": "c", "amount": 1, "date": 1_700_000_000 })),
        ]);
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.undated(), 2);
        assert!(snapshot.transactions[2].date.is_some());
        let counts = snapshot.issue_counts();
        assert_eq!(counts.get("unparseable date"), Some(&1));
        assert_eq!(counts.get("missing date"), Some(&1));
    }

    #[test]
    fn test_fraud_label_coercion() {
        let label = |v: Value| normalize_row(0, &row(json!({ "id": "x", "fraud_label": v })));
        assert_eq!(label(json!("1")).0.fraud_label, 1);
        assert_eq!(label(json!(true)).0.fraud_label, 1);
        assert_eq!(label(json!(0)).0.fraud_label, 0);
        let (txn, issues) = label(json!(7));
        assert_eq!(txn.fraud_label, 0);
        assert!(issues.iter().any(|i| i.kind() == "invalid fraud label"));
    }

    #[test]
    fn test_blank_category_is_none() {
        let (txn, _) = normalize_row(0, &row(json!({ "id": "x", "category": "  " })));
        assert!(txn.category.is_none());
        let (txn, _) = normalize_row(0, &row(json!({ "id": "x", "category": " Grocery Stores " })));
        assert_eq!(txn.category.as_deref(), Some("Grocery Stores"));
    }

    #[test]
    fn test_missing_id_reported() {
        let snapshot = normalize(&[row(json!({ "amount": 1, "date": "2024-01-01" }))]);
        assert_eq!(snapshot.issues, vec![QualityIssue::MissingId { row: 0 }]);
    }

    #[test]
    fn test_order_preserved() {
        let snapshot = normalize(&[
            row(json!({ "id": "first" })),
            row(json!({ "id": "second" })),
        ]);
        let ids: Vec<&str> = snapshot.transactions.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);
    }
}
