//! Lenient ISO-8601 parsing for provider timestamps.
//!
//! NWS sends offsets (`2025-11-02T06:00:00-08:00`); Open-Meteo sends local
//! wall-clock times with no offset (`2025-11-02T06:00`), which are placed in
//! the location's zone.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

/// A timestamp as written by the provider, before any zone is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawTimestamp {
    /// Carries a UTC offset
    Offset(DateTime<FixedOffset>),
    /// Local wall-clock time
    Local(NaiveDateTime),
}

impl RawTimestamp {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(Self::Offset(dt));
        }

        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .or_else(|| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
            .map(Self::Local)
    }

    /// The instant this timestamp names, placing local times in `tz`.
    pub fn to_utc(self, tz: Tz) -> Option<DateTime<Utc>> {
        match self {
            Self::Offset(dt) => Some(dt.with_timezone(&Utc)),
            // `earliest` picks the first instant of a repeated DST hour; a
            // skipped hour has no instant and is treated as unparseable.
            Self::Local(naive) => tz
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

pub fn parse_timestamp(raw: &str, tz: Tz) -> Option<DateTime<Utc>> {
    RawTimestamp::parse(raw)?.to_utc(tz)
}

/// Whole days from `earlier` to `later`, truncated toward zero.
///
/// Two local times are compared on the wall clock, so a DST change does not
/// move the result. Two offset times are compared as instants. A mix of the
/// two, or anything unparseable, has no answer.
pub fn whole_days_between(earlier: &str, later: &str) -> Option<i64> {
    match (RawTimestamp::parse(earlier)?, RawTimestamp::parse(later)?) {
        (RawTimestamp::Offset(a), RawTimestamp::Offset(b)) => Some((b - a).num_days()),
        (RawTimestamp::Local(a), RawTimestamp::Local(b)) => Some((b - a).num_days()),
        _ => None,
    }
}
