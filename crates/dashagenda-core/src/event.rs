//! Agenda event type.
//!
//! [`AgendaEvent`] is the canonical, provider-agnostic form of one calendar
//! occurrence. It is produced by the normalizer, ordered by the sorter and
//! consumed by the renderer within a single request.

use std::borrow::Cow;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// Label rendered in the time column for all-day events.
pub const ALL_DAY_LABEL: &str = "All day";

/// One calendar occurrence, resolved to local time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgendaEvent {
    /// Display text. May be empty.
    pub summary: String,
    /// Start of the occurrence, carrying the local offset in effect at that instant.
    ///
    /// For all-day events this is local midnight of the event date.
    pub instant: DateTime<FixedOffset>,
    /// Whether the source record only carried a calendar date.
    pub all_day: bool,
    /// The calendar this event was fetched from.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub calendar_id: String,
}

impl AgendaEvent {
    /// Creates a timed event.
    pub fn timed(summary: impl Into<String>, instant: DateTime<FixedOffset>) -> Self {
        Self {
            summary: summary.into(),
            instant,
            all_day: false,
            calendar_id: String::new(),
        }
    }

    /// Creates an all-day event anchored at the given local midnight.
    pub fn all_day(summary: impl Into<String>, midnight: DateTime<FixedOffset>) -> Self {
        Self {
            summary: summary.into(),
            instant: midnight,
            all_day: true,
            calendar_id: String::new(),
        }
    }

    /// Builder method to set the source calendar.
    pub fn with_calendar_id(mut self, calendar_id: impl Into<String>) -> Self {
        self.calendar_id = calendar_id.into();
        self
    }

    /// Returns the local calendar day of this event.
    pub fn day(&self) -> NaiveDate {
        self.instant.date_naive()
    }

    /// Returns the text shown in the time column: `All day` or a 12-hour clock time.
    pub fn time_label(&self) -> Cow<'static, str> {
        if self.all_day {
            Cow::Borrowed(ALL_DAY_LABEL)
        } else {
            Cow::Owned(self.instant.format("%-I:%M%p").to_string())
        }
    }

    /// Returns the day heading for this event, e.g. `Tuesday Mar 05`.
    pub fn day_heading(&self) -> String {
        self.instant.format("%A %b %d").to_string()
    }
}
