use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::error::{CoreError, CoreResult};

/// Source of "now" for date validation.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

const NAIVE_DATETIME_FORMATS: [&str; 3] =
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

/// Parses an ISO-8601 date and requires it to lie strictly after `now`.
///
/// Accepts full RFC 3339 timestamps, offset-less date-times and bare dates.
/// Inputs without an offset are read as UTC; a bare date means midnight.
pub fn parse_event_date(input: &str, now: DateTime<Utc>) -> CoreResult<DateTime<Utc>> {
    let parsed = parse_iso(input.trim())
        .ok_or_else(|| CoreError::InvalidInput(format!("'{}' is not a valid date", input)))?;

    if parsed <= now {
        return Err(CoreError::InvalidInput(
            "event date must be in the future".to_string(),
        ));
    }

    Ok(parsed)
}

fn parse_iso(input: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
