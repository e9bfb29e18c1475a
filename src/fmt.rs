//! Screen-only formatting. File exports use `Cell::render` instead.

/// Format a float as a dollar amount with thousands separators: $1,234.56
pub fn money(val: f64) -> String {
    if !val.is_finite() {
        return "n/a".to_string();
    }
    let negative = val < 0.0;
    let cents = format!("{:.2}", val.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((&cents, "00"));

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative {
        format!("-${with_commas}.{dec_part}")
    } else {
        format!("${with_commas}.{dec_part}")
    }
}

/// Amount column for listings: blank when upstream sent something unusable.
pub fn money_opt(val: Option<f64>) -> String {
    val.map(money).unwrap_or_default()
}

/// Anomaly threshold for display; an empty window has no threshold.
pub fn threshold(val: f64) -> String {
    if val.is_infinite() {
        "none (no data)".to_string()
    } else {
        money(val)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_formatting() {
        assert_eq!(money(1234.56), "$1,234.56");
        assert_eq!(money(-500.00), "-$500.00");
        assert_eq!(money(0.0), "$0.00");
        assert_eq!(money(1000000.99), "$1,000,000.99");
        assert_eq!(money(42.10), "$42.10");
        assert_eq!(money(f64::NAN), "n/a");
    }

    #[test]
    fn test_optional_and_threshold() {
        assert_eq!(money_opt(None), "");
        assert_eq!(money_opt(Some(12000.0)), "$12,000.00");
        assert_eq!(threshold(f64::INFINITY), "none (no data)");
        assert_eq!(threshold(60.0), "$60.00");
    }
}
