//! Reusable aggregation stages: grouping, rates, top-N selection, and time bucketing.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// Percentage of `part` over `total` on a 0-100 scale. Zero denominators yield 0.
pub fn rate(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn count_by<'a, T, K, F>(items: impl IntoIterator<Item = &'a T>, key: F) -> BTreeMap<K, u64>
where
    T: 'a,
    K: Ord,
    F: Fn(&T) -> K,
{
    let mut counts = BTreeMap::new();
    for item in items {
        *counts.entry(key(item)).or_insert(0) += 1;
    }
    counts
}

/// Sorts by descending count and truncates. Ties keep ascending key order.
pub fn top_n<K: Ord>(counts: BTreeMap<K, u64>, limit: usize) -> Vec<(K, u64)> {
    let mut entries: Vec<(K, u64)> = counts.into_iter().collect();
    // BTreeMap iteration is already key-ascending and sort_by is stable.
    entries.sort_by(|left, right| right.1.cmp(&left.1));
    entries.truncate(limit);
    entries
}

pub fn index_by<T, K, F>(items: &[T], key: F) -> HashMap<K, &T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    items.iter().map(|item| (key(item), item)).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendInterval {
    Day,
    Week,
    #[default]
    Month,
}

impl TrendInterval {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, ServiceError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            other => Err(ServiceError::validation(format!(
                "invalid interval '{other}', expected day, week, or month"
            ))),
        }
    }

    /// Period key. Weeks are Sunday-based (`%U`) so keys sort chronologically as text.
    pub fn period_key(self, at: DateTime<Utc>) -> String {
        let pattern = match self {
            Self::Day => "%Y-%m-%d",
            Self::Week => "%Y-%U",
            Self::Month => "%Y-%m",
        };
        at.format(pattern).to_string()
    }
}

pub fn parse_day(field: &str, raw: &str) -> Result<NaiveDate, ServiceError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        ServiceError::validation(format!("{field} must be a YYYY-MM-DD date, got '{raw}'"))
    })
}

pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Inclusive upper bound for a date filter: 23:59:59 of that day.
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    let last_second = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    Utc.from_utc_datetime(&date.and_time(last_second))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CgpaBand {
    BelowSix,
    SixToSevenHalf,
    SevenHalfToEightHalf,
    EightHalfToTen,
    Unknown,
}

impl CgpaBand {
    pub fn for_cgpa(cgpa: Option<f64>) -> Self {
        match cgpa {
            Some(value) if (0.0..6.0).contains(&value) => Self::BelowSix,
            Some(value) if (6.0..7.5).contains(&value) => Self::SixToSevenHalf,
            Some(value) if (7.5..8.5).contains(&value) => Self::SevenHalfToEightHalf,
            Some(value) if (8.5..10.0).contains(&value) => Self::EightHalfToTen,
            _ => Self::Unknown,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::BelowSix => "0-6",
            Self::SixToSevenHalf => "6-7.5",
            Self::SevenHalfToEightHalf => "7.5-8.5",
            Self::EightHalfToTen => "8.5-10",
            Self::Unknown => "Unknown",
        }
    }
}
