//! Raw event records as delivered by a calendar source.
//!
//! The shape follows the Google Calendar Events resource, so an `items`
//! array from the Events API (or a file exported from it) deserializes
//! directly. Only the fields the agenda needs are kept; unknown fields are
//! ignored.
//!
//! Start values are kept as the strings the source sent. Parsing happens in
//! the normalizer so one malformed record can be rejected on its own.

use serde::{Deserialize, Serialize};

/// Status value marking a deleted occurrence.
pub const STATUS_CANCELLED: &str = "cancelled";

/// The start of a raw event.
///
/// All-day events carry `date` (`YYYY-MM-DD`); timed events carry
/// `date_time` (RFC 3339). When `date` is present it wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEventTime {
    /// Calendar date for all-day events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// RFC 3339 timestamp for timed events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    /// IANA zone the event was created in. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl RawEventTime {
    /// Creates a date-only start.
    pub fn date(date: impl Into<String>) -> Self {
        Self {
            date: Some(date.into()),
            ..Default::default()
        }
    }

    /// Creates a timestamped start.
    pub fn date_time(date_time: impl Into<String>) -> Self {
        Self {
            date_time: Some(date_time.into()),
            ..Default::default()
        }
    }

    /// Returns the date value if it is present and non-empty.
    pub fn date_value(&self) -> Option<&str> {
        self.date.as_deref().filter(|d| !d.is_empty())
    }

    /// Returns the timestamp value if it is present and non-empty.
    pub fn date_time_value(&self) -> Option<&str> {
        self.date_time.as_deref().filter(|d| !d.is_empty())
    }

    /// Returns true if this start only carries a calendar date.
    pub fn is_all_day(&self) -> bool {
        self.date_value().is_some()
    }
}

/// A raw calendar event from a source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    /// Identifier within the source calendar. Used in log messages.
    #[serde(default)]
    pub id: String,

    /// The event title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// The event status (`confirmed`, `tentative`, `cancelled`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// When the event starts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<RawEventTime>,

    /// The calendar this record was fetched from. Set by the provider.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub calendar_id: String,
}

impl RawEvent {
    /// Creates a raw event with the given id and start.
    pub fn new(id: impl Into<String>, start: RawEventTime) -> Self {
        Self {
            id: id.into(),
            start: Some(start),
            ..Default::default()
        }
    }

    /// Returns the summary, or an empty string when the source sent none.
    pub fn summary_text(&self) -> &str {
        self.summary.as_deref().unwrap_or_default()
    }

    /// Returns true if the event is cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.status
            .as_ref()
            .is_some_and(|s| s.eq_ignore_ascii_case(STATUS_CANCELLED))
    }

    /// Returns true if this is an all-day event.
    pub fn is_all_day(&self) -> bool {
        self.start.as_ref().is_some_and(RawEventTime::is_all_day)
    }

    /// Builder method to set the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Builder method to set the status.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Builder method to set the source calendar.
    pub fn with_calendar_id(mut self, calendar_id: impl Into<String>) -> Self {
        self.calendar_id = calendar_id.into();
        self
    }
}

/// A page of events as returned by the Events API: `{"items": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEventList {
    /// The events on this page.
    #[serde(default)]
    pub items: Vec<RawEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_event_time_variants() {
        let timed = RawEventTime::date_time("2024-03-05T09:00:00-05:00");
        assert!(!timed.is_all_day());

        let date = RawEventTime::date("2024-03-05");
        assert!(date.is_all_day());
    }

    #[test]
    fn empty_date_is_not_all_day() {
        let start = RawEventTime {
            date: Some(String::new()),
            date_time: Some("2024-03-05T09:00:00Z".to_string()),
            time_zone: None,
        };
        assert!(!start.is_all_day());
        assert_eq!(start.date_time_value(), Some("2024-03-05T09:00:00Z"));
    }

    #[test]
    fn raw_event_builder() {
        let event = RawEvent::new("evt-1", RawEventTime::date("2024-03-05"))
            .with_summary("Dentist")
            .with_calendar_id("family");

        assert_eq!(event.id, "evt-1");
        assert_eq!(event.summary_text(), "Dentist");
        assert_eq!(event.calendar_id, "family");
        assert!(event.is_all_day());
        assert!(!event.is_cancelled());
    }

    #[test]
    fn missing_summary_is_empty() {
        let event = RawEvent::new("evt-1", RawEventTime::date("2024-03-05"));
        assert_eq!(event.summary_text(), "");
    }

    #[test]
    fn cancelled_status_is_case_insensitive() {
        let event = RawEvent::new("evt-1", RawEventTime::date("2024-03-05")).with_status("Cancelled");
        assert!(event.is_cancelled());
    }

    #[test]
    fn deserializes_events_api_items() {
        let json = r#"{
            "kind": "calendar#events",
            "items": [
                {
                    "id": "a1",
                    "status": "confirmed",
                    "summary": "Standup",
                    "start": {"dateTime": "2024-03-05T09:00:00-05:00", "timeZone": "America/New_York"},
                    "end": {"dateTime": "2024-03-05T09:15:00-05:00"}
                },
                {
                    "id": "b2",
                    "summary": "Dentist",
                    "start": {"date": "2024-03-05"}
                },
                {
                    "id": "c3"
                }
            ]
        }"#;

        let list: RawEventList = serde_json::from_str(json).unwrap();
        assert_eq!(list.items.len(), 3);

        let standup = &list.items[0];
        assert_eq!(standup.summary_text(), "Standup");
        let start = standup.start.as_ref().unwrap();
        assert_eq!(start.date_time_value(), Some("2024-03-05T09:00:00-05:00"));
        assert_eq!(start.time_zone.as_deref(), Some("America/New_York"));

        assert!(list.items[1].is_all_day());
        assert!(list.items[2].start.is_none());
    }
}
