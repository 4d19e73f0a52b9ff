use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::errors::{Error, Result};

/// Parses an IANA timezone name such as `Europe/Amsterdam`.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| Error::InvalidConfigValue(format!("Unknown timezone '{}'", name)))
}

/// Converts a UTC instant to the calendar day it falls on in `tz`.
///
/// This is the single source of truth for converting instants to domain dates.
pub fn local_date_from_utc(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// The most recent calendar day in `tz` that has fully closed at `now`.
pub fn previous_local_day(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    let today = local_date_from_utc(now, tz);
    today.pred_opt().unwrap_or(today)
}
