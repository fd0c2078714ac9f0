use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::error::{ValidationError, DATETIME_FORMAT_HINT};

// `%.f` also matches an absent fractional part.
const PICKUP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Hour-of-day and day-of-week of a pickup, Monday = 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemporalFeatures {
    pub hour: u32,
    pub day_of_week: u32,
}

/// Parse a pickup timestamp such as `2023-01-01 12:00:00` or
/// `2023-01-01 12:00:00.000000`.
///
/// The historical trip corpus stamps rows as `2015-05-07 19:52:06 UTC`;
/// the trailing zone tag is accepted so the dataset pipeline and the
/// service share this parser.
pub fn parse_pickup_datetime(raw: &str) -> Result<TemporalFeatures, ValidationError> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix(" UTC").unwrap_or(trimmed);

    let dt = NaiveDateTime::parse_from_str(trimmed, PICKUP_FORMAT).map_err(|_| {
        ValidationError::MalformedDatetime {
            value: raw.to_string(),
            expected: DATETIME_FORMAT_HINT,
        }
    })?;

    Ok(TemporalFeatures {
        hour: dt.hour(),
        day_of_week: dt.weekday().num_days_from_monday(),
    })
}
