//! RawEvent to AgendaEvent conversion.
//!
//! A record with a start date becomes an all-day event anchored at local
//! midnight of that date. Otherwise, or when the date does not parse, the
//! RFC 3339 start timestamp is parsed and converted to local time. Records that fail either step are rejected
//! one by one; the batch functions collect them in a separate pool and keep
//! going.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, TimeZone};
use tracing::warn;

use dashagenda_core::{AgendaEvent, local_midnight, to_local};

use crate::error::NormalizationError;
use crate::raw_event::{RawEvent, RawEventTime};

/// Format of all-day start dates.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Converts a [`RawEvent`] to an [`AgendaEvent`] in the process's local timezone.
///
/// # Errors
///
/// Returns a [`NormalizationError`] if the record has no usable start.
pub fn normalize_event(raw: &RawEvent) -> Result<AgendaEvent, NormalizationError> {
    normalize_event_in(raw, &Local)
}

/// Converts a [`RawEvent`] to an [`AgendaEvent`] in `tz`.
///
/// A valid non-empty date decides and makes the event all-day. If the date
/// does not parse, a valid timestamp is used instead; the date error is
/// returned only when no usable timestamp is present.
///
/// # Errors
///
/// Returns a [`NormalizationError`] if the record has no usable start.
pub fn normalize_event_in<Tz: TimeZone>(
    raw: &RawEvent,
    tz: &Tz,
) -> Result<AgendaEvent, NormalizationError> {
    let start = raw.start.as_ref().ok_or(NormalizationError::MissingStart)?;

    let event = match parse_start(start)? {
        ParsedStart::Date(date) => {
            let midnight = local_midnight(date, tz)
                .ok_or(NormalizationError::NonexistentLocalDate { date })?;
            AgendaEvent::all_day(raw.summary_text(), midnight)
        }
        ParsedStart::Instant(instant) => {
            AgendaEvent::timed(raw.summary_text(), to_local(&instant, tz))
        }
    };

    Ok(event.with_calendar_id(&raw.calendar_id))
}

/// A start value that parsed, before any timezone is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParsedStart {
    Date(NaiveDate),
    Instant(DateTime<FixedOffset>),
}

/// Parses whichever start field is usable, date first.
pub(crate) fn parse_start(start: &RawEventTime) -> Result<ParsedStart, NormalizationError> {
    let date_error = match start.date_value() {
        Some(value) => match NaiveDate::parse_from_str(value, DATE_FORMAT) {
            Ok(date) => return Ok(ParsedStart::Date(date)),
            Err(source) => Some(NormalizationError::InvalidDate {
                value: value.to_string(),
                source,
            }),
        },
        None => None,
    };

    match start.date_time_value() {
        Some(value) => match DateTime::parse_from_rfc3339(value) {
            Ok(instant) => Ok(ParsedStart::Instant(instant)),
            Err(source) => Err(date_error.unwrap_or(NormalizationError::InvalidTimestamp {
                value: value.to_string(),
                source,
            })),
        },
        None => Err(date_error.unwrap_or(NormalizationError::MissingStart)),
    }
}

/// A record that could not be normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedEvent {
    /// The record's id within its calendar.
    pub id: String,
    /// The calendar the record came from.
    pub calendar_id: String,
    /// Why it was rejected.
    pub error: NormalizationError,
}

/// The outcome of normalizing a batch of records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedBatch {
    /// Events that normalized successfully, in input order.
    pub accepted: Vec<AgendaEvent>,
    /// Records that failed, in input order.
    pub rejected: Vec<RejectedEvent>,
    /// Number of cancelled records that were skipped.
    pub cancelled: usize,
}

impl NormalizedBatch {
    /// Returns the number of records that were looked at.
    pub fn total(&self) -> usize {
        self.accepted.len() + self.rejected.len() + self.cancelled
    }
}

/// Batch normalize records in the process's local timezone.
pub fn normalize_events(raw_events: &[RawEvent]) -> NormalizedBatch {
    normalize_events_in(raw_events, &Local)
}

/// Batch normalize records in `tz`.
///
/// Cancelled records are skipped. Every failure is logged at `warn` and
/// kept in [`NormalizedBatch::rejected`]; it does not affect other records.
pub fn normalize_events_in<Tz: TimeZone>(raw_events: &[RawEvent], tz: &Tz) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();

    for raw in raw_events {
        if raw.is_cancelled() {
            batch.cancelled += 1;
            continue;
        }

        match normalize_event_in(raw, tz) {
            Ok(event) => batch.accepted.push(event),
            Err(error) => {
                warn!(
                    event_id = %raw.id,
                    calendar_id = %raw.calendar_id,
                    error = %error,
                    "skipping event that could not be normalized"
                );
                batch.rejected.push(RejectedEvent {
                    id: raw.id.clone(),
                    calendar_id: raw.calendar_id.clone(),
                    error,
                });
            }
        }
    }

    batch
}
