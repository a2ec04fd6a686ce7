//! Time scale conversions and local calendar day resolution
//!
//! The solunar pipeline works in two time arguments: UTC Julian dates for
//! Earth rotation (UT1 − UTC is ignored, well under a second) and TT Julian
//! dates for the lunar ephemeris, related by the fixed modern-era offset
//! [`TT_MINUS_UTC_S`](crate::constants::TT_MINUS_UTC_S).
//!
//! [`LocalDay`] resolves a civil date in an IANA timezone to unambiguous
//! half-open UTC bounds, which define the event search window.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use crate::constants::{DAY_S, J2000, JULIAN_CENTURY_DAYS, TT_MINUS_UTC_S};

/// Julian date of the Unix epoch (1970-01-01T00:00:00Z)
const UNIX_EPOCH_JD: f64 = 2_440_587.5;

/// Convert a UTC instant to a Julian date (UTC scale).
pub fn julian_date(instant: &DateTime<Utc>) -> f64 {
    instant.timestamp_micros() as f64 / (DAY_S * 1e6) + UNIX_EPOCH_JD
}

/// Convert a Julian date (UTC scale) back to a UTC instant.
///
/// Returns `None` if the date falls outside chrono's representable range.
/// Microsecond resolution, which is far below the event refinement
/// tolerance.
pub fn datetime_from_jd(jd: f64) -> Option<DateTime<Utc>> {
    let micros = (jd - UNIX_EPOCH_JD) * DAY_S * 1e6;
    if !micros.is_finite() || micros.abs() >= i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_micros(micros.round() as i64)
}

/// Terrestrial Time Julian date for a UTC Julian date.
pub fn jd_tt(jd_utc: f64) -> f64 {
    jd_utc + TT_MINUS_UTC_S / DAY_S
}

/// Julian centuries since J2000.0 for a TT Julian date.
pub fn julian_centuries(jd_tt: f64) -> f64 {
    (jd_tt - J2000) / JULIAN_CENTURY_DAYS
}

/// A civil calendar day in a specific timezone, resolved to UTC bounds.
///
/// The bounds are half-open: `start <= t < end`. DST transition days
/// resolve to 23 or 25 hours; an ambiguous local midnight resolves to its
/// earliest occurrence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalDay {
    /// The civil date
    pub date: NaiveDate,
    /// The timezone the date is interpreted in
    pub tz: Tz,
    /// First instant of the day, UTC
    pub start: DateTime<Utc>,
    /// First instant of the following day, UTC
    pub end: DateTime<Utc>,
}

impl LocalDay {
    /// Resolve a civil date in a timezone to its UTC day bounds.
    pub fn resolve(date: NaiveDate, tz: Tz) -> Self {
        let start = local_midnight_to_utc(date, tz);
        let end = match date.succ_opt() {
            Some(next) => local_midnight_to_utc(next, tz),
            None => start + Duration::days(1),
        };
        LocalDay {
            date,
            tz,
            start,
            end,
        }
    }

    /// Start of the day as a Julian date (UTC scale).
    pub fn start_jd(&self) -> f64 {
        julian_date(&self.start)
    }

    /// End of the day as a Julian date (UTC scale).
    pub fn end_jd(&self) -> f64 {
        julian_date(&self.end)
    }

    /// Whether a UTC instant falls within this day's half-open bounds.
    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        *instant >= self.start && *instant < self.end
    }
}

/// Convert a local date's midnight to UTC, handling DST transitions.
///
/// Ambiguous midnights (fall back) take the earliest occurrence; midnights
/// skipped by spring forward shift to the next valid instant.
fn local_midnight_to_utc(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let midnight = date.and_time(chrono::NaiveTime::MIN);
    match tz.from_local_datetime(&midnight).earliest() {
        Some(dt) => dt.with_timezone(&Utc),
        None => {
            // Midnight does not exist locally (spring-forward at 00:00,
            // e.g. America/Havana): scan forward to the first valid minute.
            let mut probe = midnight;
            for _ in 0..180 {
                probe += Duration::minutes(1);
                if let Some(dt) = tz.from_local_datetime(&probe).earliest() {
                    return dt.with_timezone(&Utc);
                }
            }
            Utc.from_utc_datetime(&midnight)
        }
    }
}
