//! Users directory: normalization, filters, ordering and headline figures.

use std::cmp::Ordering;
use std::str::FromStr;

use crate::error::{RampError, Result};
use crate::models::{RawRow, User};
use crate::normalizer::{value_to_f64, value_to_i64, value_to_string};

pub fn normalize_user(row: &RawRow) -> User {
    User {
        id: value_to_string(row.get("id")),
        current_age: value_to_i64(row.get("current_age")),
        gender: value_to_string(row.get("gender")),
        address: value_to_string(row.get("address")),
        yearly_income: value_to_f64(row.get("yearly_income")),
        per_capita_income: value_to_f64(row.get("per_capita_income")),
        total_debt: value_to_f64(row.get("total_debt")),
        credit_score: value_to_i64(row.get("credit_score")),
        num_credit_cards: value_to_i64(row.get("num_credit_cards")),
    }
}

pub fn normalize_users(rows: &[RawRow]) -> Vec<User> {
    rows.iter().map(normalize_user).collect()
}

/// Per-capita income bands. Bounds are inclusive on the middle band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncomeBand {
    Below30k,
    From30kTo60k,
    Above60k,
}

impl IncomeBand {
    pub fn contains(&self, user: &User) -> bool {
        let Some(income) = user.per_capita_income else {
            return false;
        };
        match self {
            Self::Below30k => income < 30_000.0,
            Self::From30kTo60k => (30_000.0..=60_000.0).contains(&income),
            Self::Above60k => income > 60_000.0,
        }
    }
}

impl FromStr for IncomeBand {
    type Err = RampError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "below30" => Ok(Self::Below30k),
            "30to60" => Ok(Self::From30kTo60k),
            "above60" => Ok(Self::Above60k),
            _ => Err(RampError::Other(format!(
                "Unknown income band: {s} (expected below30, 30to60 or above60)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSortKey {
    Id,
    Age,
    Gender,
    CreditScore,
    YearlyIncome,
    PerCapitaIncome,
    TotalDebt,
    Cards,
}

impl FromStr for UserSortKey {
    type Err = RampError;

    fn from_str(s: &str) -> Result<Self> {
        let key = match s.trim().to_lowercase().replace('-', "_").as_str() {
            "id" => Self::Id,
            "age" | "current_age" => Self::Age,
            "gender" => Self::Gender,
            "credit_score" => Self::CreditScore,
            "yearly_income" => Self::YearlyIncome,
            "per_capita_income" => Self::PerCapitaIncome,
            "total_debt" => Self::TotalDebt,
            "cards" | "num_credit_cards" => Self::Cards,
            _ => return Err(RampError::UnknownColumn(s.to_string())),
        };
        Ok(key)
    }
}

fn cmp_f64(a: Option<f64>, b: Option<f64>) -> Option<Ordering> {
    Some(a?.total_cmp(&b?))
}

fn cmp_i64(a: Option<i64>, b: Option<i64>) -> Option<Ordering> {
    Some(a?.cmp(&b?))
}

impl UserSortKey {
    /// `None` when either side lacks the value.
    fn compare(&self, a: &User, b: &User) -> Option<Ordering> {
        match self {
            Self::Id => Some(a.id.cmp(&b.id)),
            Self::Gender => Some(a.gender.cmp(&b.gender)),
            Self::Age => cmp_i64(a.current_age, b.current_age),
            Self::CreditScore => cmp_i64(a.credit_score, b.credit_score),
            Self::Cards => cmp_i64(a.num_credit_cards, b.num_credit_cards),
            Self::YearlyIncome => cmp_f64(a.yearly_income, b.yearly_income),
            Self::PerCapitaIncome => cmp_f64(a.per_capita_income, b.per_capita_income),
            Self::TotalDebt => cmp_f64(a.total_debt, b.total_debt),
        }
    }

    fn has_value(&self, u: &User) -> bool {
        match self {
            Self::Id | Self::Gender => true,
            Self::Age => u.current_age.is_some(),
            Self::CreditScore => u.credit_score.is_some(),
            Self::Cards => u.num_credit_cards.is_some(),
            Self::YearlyIncome => u.yearly_income.is_some(),
            Self::PerCapitaIncome => u.per_capita_income.is_some(),
            Self::TotalDebt => u.total_debt.is_some(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserQuery {
    pub income: Option<IncomeBand>,
    pub search: Option<String>,
    pub sort: Option<UserSortKey>,
    pub descending: bool,
}

fn matches_search(user: &User, needle: &str) -> bool {
    [&user.id, &user.address, &user.gender]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

/// Filter then sort. Users missing the sort value go last in either
/// direction; the sort is stable.
pub fn select<'a>(users: &'a [User], query: &UserQuery) -> Vec<&'a User> {
    let needle = query
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let mut out: Vec<&User> = users
        .iter()
        .filter(|u| query.income.map_or(true, |band| band.contains(u)))
        .filter(|u| needle.as_deref().map_or(true, |n| matches_search(u, n)))
        .collect();

    if let Some(key) = query.sort {
        out.sort_by(|a, b| match (key.has_value(a), key.has_value(b)) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => Ordering::Equal,
            (true, true) => {
                let ord = key.compare(a, b).unwrap_or(Ordering::Equal);
                if query.descending {
                    ord.reverse()
                } else {
                    ord
                }
            }
        });
    }
    out
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserSummary {
    pub count: usize,
    /// Sum of yearly income.
    pub total_assets: f64,
    pub total_debt: f64,
    pub avg_credit_score: Option<f64>,
}

pub fn summarize(users: &[&User]) -> UserSummary {
    let scores: Vec<i64> = users.iter().filter_map(|u| u.credit_score).collect();
    let avg_credit_score =
        (!scores.is_empty()).then(|| scores.iter().sum::<i64>() as f64 / scores.len() as f64);
    UserSummary {
        count: users.len(),
        total_assets: users.iter().filter_map(|u| u.yearly_income).sum(),
        total_debt: users.iter().filter_map(|u| u.total_debt).sum(),
        avg_credit_score,
    }
}
