//! Finish Date Normalization
//!
//! Dates travel through the system as the literal six characters `DDMMYY`.

use chrono::{Local, NaiveDate};
use thiserror::Error;

/// strftime pattern for the finish date
pub const DATE_FORMAT: &str = "%d%m%y";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("Finish Date format invalid. Use DDMMYY.")]
    InvalidFormat(String),
}

/// Validate `raw` as DDMMYY, or return today's date when `use_today` is set.
///
/// When `use_today` is set the raw input is ignored entirely. The caller is
/// expected to treat its date field as read-only in that mode.
pub fn normalize(raw: &str, use_today: bool) -> Result<String, DateError> {
    if use_today {
        return Ok(today());
    }
    parse_ddmmyy(raw)?;
    Ok(raw.to_string())
}

/// Today's local date as DDMMYY
pub fn today() -> String {
    Local::now().format(DATE_FORMAT).to_string()
}

/// Strict DDMMYY parse. Exactly six ASCII digits that name a real calendar day.
pub fn parse_ddmmyy(raw: &str) -> Result<NaiveDate, DateError> {
    if raw.len() != 6 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DateError::InvalidFormat(raw.to_string()));
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|_| DateError::InvalidFormat(raw.to_string()))
}
