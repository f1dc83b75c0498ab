//! Text-column conversion helpers.
//!
//! Amounts, dates, and timestamps are stored as text (decimals keep exact
//! digits, `%Y-%m-%d` dates compare correctly as strings). These helpers
//! centralize the conversions so row models stay thin.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;

pub fn decimal_to_db(value: Decimal) -> String {
    value.to_string()
}

pub fn opt_decimal_to_db(value: Option<Decimal>) -> Option<String> {
    value.map(|v| v.to_string())
}

pub fn decimal_from_db(raw: &str) -> Decimal {
    Decimal::from_str(raw).unwrap_or_default()
}

pub fn opt_decimal_from_db(raw: Option<String>) -> Option<Decimal> {
    raw.as_deref().and_then(|s| Decimal::from_str(s).ok())
}

pub fn date_to_db(value: NaiveDate) -> String {
    value.format("%Y-%m-%d").to_string()
}

pub fn opt_date_to_db(value: Option<NaiveDate>) -> Option<String> {
    value.map(date_to_db)
}

pub fn date_from_db(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap_or_default()
}

pub fn opt_date_from_db(raw: Option<String>) -> Option<NaiveDate> {
    raw.as_deref()
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

pub fn datetime_to_db(value: DateTime<Utc>) -> String {
    value.to_rfc3339()
}

pub fn opt_datetime_to_db(value: Option<DateTime<Utc>>) -> Option<String> {
    value.map(datetime_to_db)
}

pub fn datetime_from_db(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

pub fn opt_datetime_from_db(raw: Option<String>) -> Option<DateTime<Utc>> {
    raw.as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}
