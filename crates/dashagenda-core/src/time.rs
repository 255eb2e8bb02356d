//! Local time resolution.
//!
//! Every instant in the agenda is expressed in the process's local timezone.
//! These helpers take the timezone as a parameter so callers can pass
//! [`chrono::Local`] in production and a fixed offset in tests.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, TimeZone, Utc};

/// Converts an instant into `tz`, keeping the offset in effect at that instant.
pub fn to_local<Tz: TimeZone, O: TimeZone>(dt: &DateTime<O>, tz: &Tz) -> DateTime<FixedOffset> {
    let local = dt.with_timezone(tz);
    let offset = local.offset().fix();
    local.with_timezone(&offset)
}

/// Returns local midnight of `date` in `tz`.
///
/// An ambiguous midnight resolves to the earliest mapping. When midnight
/// falls into a DST gap the first hour after it is used instead. Returns
/// `None` only if neither exists.
pub fn local_midnight<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Option<DateTime<FixedOffset>> {
    let midnight = date.and_hms_opt(0, 0, 0)?;
    let resolved = tz
        .from_local_datetime(&midnight)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(midnight + Duration::hours(1))).earliest())?;
    let offset = resolved.offset().fix();
    Some(resolved.with_timezone(&offset))
}

/// Returns the instant of local midnight of the day containing `now`.
///
/// This is the lower bound used when querying calendars, so events earlier
/// today are still listed.
pub fn start_of_local_day<Tz: TimeZone>(now: DateTime<Utc>, tz: &Tz) -> DateTime<Utc> {
    let today = now.with_timezone(tz).date_naive();
    local_midnight(today, tz)
        .map(|m| m.with_timezone(&Utc))
        .unwrap_or(now)
}
