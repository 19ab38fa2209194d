//! Coercion of loosely typed client JSON into record fields
//!
//! Clients send counts and amounts as numbers, numeric strings or nothing at
//! all. These helpers settle every field to a concrete value at write time so
//! stored records never carry raw client types.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use super::month_window::start_of_day;
use crate::defaults::MAX_COUNT;

/// How date strings without an offset are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStyle {
    /// Single-record writes: naive dates and times are local time
    Local,
    /// Bulk import: a bare `YYYY-MM-DD` is UTC midnight
    ImportDay,
}

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Numeric value of a JSON field, following JavaScript `Number()` for the
/// shapes clients actually send. `None` means "no usable number".
pub fn to_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse::<f64>().ok()?
            }
        }
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Integer count, truncated toward zero; unusable input counts as 0.
/// Magnitudes beyond [`MAX_COUNT`] are unusable too.
pub fn count_or_zero(value: &Value) -> i64 {
    to_number(value)
        .map(f64::trunc)
        .filter(|n| n.abs() <= MAX_COUNT as f64)
        .map(|n| n as i64)
        .unwrap_or(0)
}

/// Monetary amount; unusable input counts as 0
pub fn amount_or_zero(value: &Value) -> f64 {
    to_number(value).unwrap_or(0.0)
}

/// Optional number; absent or unusable input stays null
pub fn number_or_null(value: &Value) -> Option<f64> {
    to_number(value)
}

/// Optional free text; scalars are stringified, anything else is null
pub fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn is_plain_date(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Parse a client date value into an instant
pub fn parse_date(value: &Value, style: DateStyle) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => {
            let millis = n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })?;
            DateTime::from_timestamp_millis(millis)
        }
        Value::String(s) => parse_date_str(s.trim(), style),
        _ => None,
    }
}

fn parse_date_str(s: &str, style: DateStyle) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }

    if is_plain_date(s) {
        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
        return match style {
            DateStyle::ImportDay => date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()),
            DateStyle::Local => start_of_day(date, &Local),
        };
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Some(naive) = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return naive
            .and_local_timezone(Local)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc));
    }

    s.parse::<i64>().ok().and_then(DateTime::from_timestamp_millis)
}

/// Epoch milliseconds for a client date value, falling back to `now`
pub fn date_millis_or(value: &Value, style: DateStyle, now: DateTime<Utc>) -> i64 {
    parse_date(value, style).unwrap_or(now).timestamp_millis()
}
