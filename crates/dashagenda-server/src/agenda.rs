//! Building one agenda from the configured calendars.
//!
//! fetch every calendar -> normalize -> sort -> render under the line budget.
//! Each request runs the whole pipeline; nothing is cached between requests.

use std::sync::Arc;

use chrono::{Local, TimeZone};
use tracing::{debug, info};

use dashagenda_core::{AgendaRenderer, RenderOptions, agenda_order};
use dashagenda_protocol::AgendaPayload;
use dashagenda_providers::{CalendarProvider, FetchOptions, fetch_all, normalize_events_in};

use crate::config::AgendaSettings;

/// Runs the agenda pipeline against a provider.
#[derive(Clone)]
pub struct AgendaService {
    provider: Arc<dyn CalendarProvider>,
    settings: AgendaSettings,
}

impl std::fmt::Debug for AgendaService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgendaService")
            .field("provider", &self.provider.name())
            .field("settings", &self.settings)
            .finish()
    }
}

impl AgendaService {
    /// Creates a service reading from `provider`.
    pub fn new(provider: Arc<dyn CalendarProvider>, settings: AgendaSettings) -> Self {
        Self { provider, settings }
    }

    /// Returns the provider name.
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Returns the agenda settings.
    pub fn settings(&self) -> &AgendaSettings {
        &self.settings
    }

    /// Builds today's agenda in the local timezone.
    ///
    /// `max_lines` overrides the configured budget for this call.
    pub async fn build(&self, max_lines: Option<usize>) -> AgendaPayload {
        let options =
            FetchOptions::from_start_of_today().with_max_results(self.settings.max_results);
        self.build_with(options, max_lines, &Local).await
    }

    /// Builds an agenda with explicit fetch options, rendered in `tz`.
    pub async fn build_with<Tz: TimeZone>(
        &self,
        options: FetchOptions,
        max_lines: Option<usize>,
        tz: &Tz,
    ) -> AgendaPayload {
        let outcome = fetch_all(
            self.provider.as_ref(),
            &self.settings.calendar_ids,
            &options,
            self.settings.fetch_concurrency,
        )
        .await;

        let batch = normalize_events_in(&outcome.events, tz);
        let mut events = batch.accepted;
        agenda_order().sort(&mut events);

        let render_options = RenderOptions {
            max_lines: max_lines.unwrap_or(self.settings.max_lines),
            max_summary_length: self.settings.max_summary_length,
        };
        let rendered = AgendaRenderer::new(render_options).render_agenda(&events);

        let failed_calendars: Vec<String> = outcome
            .failures
            .into_iter()
            .map(|failure| failure.calendar_id)
            .collect();

        info!(
            fetched = outcome.events.len(),
            rendered = rendered.rendered_events,
            rejected = batch.rejected.len(),
            dropped = rendered.dropped_events,
            failed_calendars = failed_calendars.len(),
            "agenda built"
        );
        debug!(lines = rendered.lines, "agenda size");

        AgendaPayload {
            text: rendered.text,
            event_count: rendered.rendered_events,
            rejected_count: batch.rejected.len(),
            dropped_count: rendered.dropped_events,
            failed_calendars,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use dashagenda_providers::{RawEvent, RawEventTime, StaticProvider};

    fn est() -> FixedOffset {
        FixedOffset::west_opt(5 * 3600).unwrap()
    }

    fn timed(id: &str, summary: &str, start: &str) -> RawEvent {
        RawEvent::new(id, RawEventTime::date_time(start)).with_summary(summary)
    }

    fn all_day(id: &str, summary: &str, date: &str) -> RawEvent {
        RawEvent::new(id, RawEventTime::date(date)).with_summary(summary)
    }

    fn service(provider: StaticProvider, settings: AgendaSettings) -> AgendaService {
        AgendaService::new(Arc::new(provider), settings)
    }

    #[tokio::test]
    async fn merges_calendars_in_time_order() {
        let provider = StaticProvider::new()
            .with_calendar(
                "work",
                vec![
                    timed("w1", "Standup", "2024-03-05T14:00:00Z"),
                    timed("w2", "Retro", "2024-03-06T20:00:00Z"),
                ],
            )
            .with_calendar(
                "family",
                vec![
                    all_day("f1", "Dentist", "2024-03-05"),
                    timed("f2", "Soccer", "2024-03-05T22:30:00Z"),
                ],
            );
        let settings = AgendaSettings::default().with_calendar_ids(["work", "family"]);

        let agenda = service(provider, settings)
            .build_with(FetchOptions::new(), None, &est())
            .await;

        assert_eq!(
            agenda.text,
            "\nTuesday Mar 05\n All day: Dentist\n  9:00AM: Standup\n  5:30PM: Soccer\n\
             \nWednesday Mar 06\n  3:00PM: Retro\n"
        );
        assert_eq!(agenda.event_count, 4);
        assert_eq!(agenda.rejected_count, 0);
        assert_eq!(agenda.dropped_count, 0);
        assert!(agenda.failed_calendars.is_empty());
    }

    #[tokio::test]
    async fn rejected_records_are_counted_not_fatal() {
        let provider = StaticProvider::new().with_calendar(
            "primary",
            vec![
                timed("a", "Standup", "2024-03-05T14:00:00Z"),
                timed("b", "Broken", "tomorrow morning"),
            ],
        );

        let agenda = service(provider, AgendaSettings::default())
            .build_with(FetchOptions::new(), None, &est())
            .await;

        assert_eq!(agenda.text, "\nTuesday Mar 05\n  9:00AM: Standup\n");
        assert_eq!(agenda.rejected_count, 1);
    }

    #[tokio::test]
    async fn failed_calendar_is_reported() {
        let provider = StaticProvider::new()
            .with_calendar("primary", vec![timed("a", "Standup", "2024-03-05T14:00:00Z")]);
        let settings = AgendaSettings::default().with_calendar_ids(["primary", "gone"]);

        let agenda = service(provider, settings)
            .build_with(FetchOptions::new(), None, &est())
            .await;

        assert_eq!(agenda.event_count, 1);
        assert_eq!(agenda.failed_calendars, vec!["gone".to_string()]);
    }

    #[tokio::test]
    async fn request_budget_overrides_settings() {
        let events = (0..40)
            .map(|i| timed(&format!("e{i}"), &format!("Event {i:02}"), "2024-03-05T14:00:00Z"))
            .collect();
        let provider = StaticProvider::new().with_calendar("primary", events);
        let service = service(provider, AgendaSettings::default());
        let options = FetchOptions::new().with_max_results(40);

        let agenda = service.build_with(options.clone(), Some(10), &est()).await;
        assert_eq!(agenda.text.lines().count(), 10);
        assert_eq!(agenda.event_count, 8);
        assert_eq!(agenda.dropped_count, 32);

        let agenda = service.build_with(options, None, &est()).await;
        assert_eq!(agenda.text.lines().count(), 36);
        assert_eq!(agenda.event_count, 34);
    }

    #[tokio::test]
    async fn empty_calendars_render_empty_text() {
        let provider = StaticProvider::new().with_calendar("primary", vec![]);

        let agenda = service(provider, AgendaSettings::default())
            .build_with(FetchOptions::new(), None, &est())
            .await;

        assert_eq!(agenda, AgendaPayload::default());
    }

    #[tokio::test]
    async fn build_uses_local_time_without_panicking() {
        let provider = StaticProvider::new().with_calendar("primary", vec![]);
        let agenda = service(provider, AgendaSettings::default()).build(None).await;
        assert!(agenda.text.is_empty());
    }
}
