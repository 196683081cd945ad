//! Normalization of incoming timestamps to clinic-local time.
//!
//! The engine works in naive local time. Timestamps that carry an offset are
//! converted into the clinic's IANA zone; naive timestamps are taken as
//! already local.

use chrono::{DateTime, NaiveDateTime};
use chrono_tz::Tz;

use crate::error::{BookingError, Result};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Parse an IANA zone name such as `Europe/Rome`.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse()
        .map_err(|_| BookingError::InvalidTimezone(name.to_string()))
}

/// Convert a timestamp string into clinic-local naive time.
///
/// Accepts RFC 3339 (`2026-03-02T08:00:00Z`, `2026-03-02T09:00:00+01:00`),
/// which is converted into `clinic_tz`, and naive `YYYY-MM-DDTHH:MM[:SS]`,
/// which is returned unchanged.
pub fn to_clinic_time(input: &str, clinic_tz: Tz) -> Result<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&clinic_tz).naive_local());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .ok_or_else(|| BookingError::InvalidTimestamp(input.to_string()))
}
