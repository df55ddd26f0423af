//! Due-date parsing.
//!
//! Ledger timestamps are signed seconds since the Unix epoch (UTC). Callers
//! may pass either a full RFC 3339 timestamp or a bare `YYYY-MM-DD` date,
//! which is pinned to midnight UTC.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::error::{LbcError, LbcResult};

/// Parse a due date into Unix seconds.
///
/// # Errors
///
/// Returns [`LbcError::InvalidInput`] for an empty string or a value that is
/// neither RFC 3339 nor `YYYY-MM-DD`.
pub fn parse_due(input: &str) -> LbcResult<i64> {
    let input = input.trim();
    if input.is_empty() {
        return Err(LbcError::InvalidInput("missing datetime".to_string()));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.timestamp());
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(|| {
            LbcError::InvalidInput(format!("cannot build midnight for {:?}", input))
        })?;
        return Ok(Utc.from_utc_datetime(&midnight).timestamp());
    }

    Err(LbcError::InvalidInput(format!(
        "cannot parse time: {:?} (use YYYY-MM-DD or RFC3339)",
        input
    )))
}
