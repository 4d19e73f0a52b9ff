//! Utility functions for SQLite storage operations.
//!
//! Column encoding helpers plus chunking utilities to avoid parameter limits.
//! Decimals are stored as TEXT, dates as `YYYY-MM-DD` and timestamps as
//! RFC 3339 UTC with fixed microsecond precision, so string comparison in SQL
//! orders them correctly.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use commitment_core::errors::{Result, ValidationError};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Maximum number of parameters for SQLite IN (...) queries.
///
/// SQLite has a compile-time limit on the number of parameters in a SQL statement,
/// typically around 999 (SQLITE_MAX_VARIABLE_NUMBER). To stay safely under this limit
/// and leave room for other parameters in the query, we use 500 as our chunk size.
pub const SQLITE_MAX_PARAMS_CHUNK: usize = 500;

/// Chunk a slice into smaller slices for batch SQLite queries.
pub fn chunk_for_sqlite<T>(items: &[T]) -> impl Iterator<Item = &[T]> {
    items.chunks(SQLITE_MAX_PARAMS_CHUNK)
}

pub fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(value).map_err(ValidationError::DateTimeParse)?;
    Ok(parsed.with_timezone(&Utc))
}

pub fn parse_optional_timestamp(value: Option<String>) -> Result<Option<DateTime<Utc>>> {
    value.as_deref().map(parse_timestamp).transpose()
}

pub fn format_date(value: NaiveDate) -> String {
    value.format("%Y-%m-%d").to_string()
}

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(ValidationError::DateTimeParse)?)
}

pub fn parse_decimal(value: &str) -> Result<Decimal> {
    Ok(Decimal::from_str(value).map_err(ValidationError::DecimalParse)?)
}
