use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;
use tracing::debug;

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const TIME_FORMATS: [&str; 2] = ["%H:%M:%S", "%H:%M"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    Date(String),

    #[error("Invalid time '{0}', expected HH:MM or HH:MM:SS")]
    Time(String),

    #[error("Invalid timestamp '{0}', expected YYYY-MM-DD HH:MM[:SS]")]
    Timestamp(String),
}

/// Parses a slot timestamp in either ISO (`T`) or space-separated form.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, TimestampError> {
    let trimmed = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| TimestampError::Timestamp(value.to_string()))
}

/// Combines the separate date and time inputs of a scheduling form.
pub fn combine_date_time(date: &str, time: &str) -> Result<NaiveDateTime, TimestampError> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| TimestampError::Date(date.to_string()))?;
    let parsed_time = TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(time.trim(), format).ok())
        .ok_or_else(|| TimestampError::Time(time.to_string()))?;

    let timestamp = date.and_time(parsed_time);
    debug!("Coerced slot timestamp {}", timestamp);
    Ok(timestamp)
}
