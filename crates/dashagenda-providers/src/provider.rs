//! CalendarProvider trait definition and local implementations.
//!
//! A provider answers one question: which raw records does calendar `id`
//! hold from `time_min` onwards? [`fetch_all`] asks it for every configured
//! calendar with bounded concurrency and concatenates the answers.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use chrono::{DateTime, Local, TimeZone, Utc};
use futures_util::stream::{self, StreamExt};
use tracing::{debug, warn};

use dashagenda_core::{local_midnight, start_of_local_day};

use crate::error::{ProviderError, ProviderResult};
use crate::normalize::{ParsedStart, parse_start};
use crate::raw_event::{RawEvent, RawEventList};

/// Default cap on records fetched per calendar.
pub const DEFAULT_MAX_RESULTS: usize = 20;

/// Default number of calendars fetched at once.
pub const DEFAULT_FETCH_CONCURRENCY: usize = 4;

/// A boxed future for async trait methods.
///
/// Using boxed futures keeps the trait object-safe so the server can hold an
/// `Arc<dyn CalendarProvider>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Options for fetching events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Drop records known to start before this instant.
    pub time_min: Option<DateTime<Utc>>,
    /// Maximum number of records to return per calendar.
    pub max_results: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            time_min: None,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl FetchOptions {
    /// Creates new fetch options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for today's agenda: everything from local midnight onwards.
    pub fn from_start_of_today() -> Self {
        Self::new().with_time_min(start_of_local_day(Utc::now(), &Local))
    }

    /// Builder method to set the lower bound.
    pub fn with_time_min(mut self, time_min: DateTime<Utc>) -> Self {
        self.time_min = Some(time_min);
        self
    }

    /// Builder method to set max results.
    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    /// Applies these options to the records of one calendar.
    ///
    /// Cancelled records and records known to start before `time_min` are
    /// dropped. Records whose start cannot be read are kept so the
    /// normalizer can reject and report them. The rest are ordered by start
    /// time and capped at `max_results`. Every kept record is tagged with
    /// `calendar_id`.
    pub fn apply(&self, calendar_id: &str, events: Vec<RawEvent>) -> Vec<RawEvent> {
        self.apply_in(calendar_id, events, &Local)
    }

    /// [`FetchOptions::apply`] with all-day starts anchored in `tz`.
    pub fn apply_in<Tz: TimeZone>(
        &self,
        calendar_id: &str,
        events: Vec<RawEvent>,
        tz: &Tz,
    ) -> Vec<RawEvent> {
        let mut keyed: Vec<_> = events
            .into_iter()
            .filter(|raw| !raw.is_cancelled())
            .map(|raw| {
                let start = start_instant(&raw, tz);
                (start, raw)
            })
            .filter(|(start, _)| match (start, self.time_min) {
                (Some(start), Some(time_min)) => *start >= time_min,
                _ => true,
            })
            .collect();

        // Unreadable starts go last.
        keyed.sort_by(|(a, _), (b, _)| match (a, b) {
            (Some(a), Some(b)) => a.cmp(b),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });

        keyed
            .into_iter()
            .take(self.max_results)
            .map(|(_, raw)| raw.with_calendar_id(calendar_id))
            .collect()
    }
}

/// The core abstraction for event sources.
///
/// # Implementation Notes
///
/// - Implementations must be `Send + Sync`; one provider serves every request
/// - Records are returned as the source holds them; normalization happens later
/// - An unknown calendar is an error, an empty calendar is not
pub trait CalendarProvider: Send + Sync {
    /// Returns the name/type of this provider (e.g., "json-file").
    fn name(&self) -> &str;

    /// Fetches the records of one calendar.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if the calendar cannot be read.
    fn fetch_events<'a>(
        &'a self,
        calendar_id: &'a str,
        options: FetchOptions,
    ) -> BoxFuture<'a, ProviderResult<Vec<RawEvent>>>;
}

/// A provider serving records held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    calendars: HashMap<String, Vec<RawEvent>>,
}

impl StaticProvider {
    /// Creates a provider with no calendars.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to add a calendar.
    pub fn with_calendar(mut self, calendar_id: impl Into<String>, events: Vec<RawEvent>) -> Self {
        self.calendars.insert(calendar_id.into(), events);
        self
    }
}

impl CalendarProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    fn fetch_events<'a>(
        &'a self,
        calendar_id: &'a str,
        options: FetchOptions,
    ) -> BoxFuture<'a, ProviderResult<Vec<RawEvent>>> {
        Box::pin(async move {
            let events = self.calendars.get(calendar_id).ok_or_else(|| {
                ProviderError::not_found("unknown calendar")
                    .with_provider(self.name())
                    .with_calendar_id(calendar_id)
            })?;
            Ok(options.apply(calendar_id, events.clone()))
        })
    }
}

/// A provider reading Events API exports from a directory.
///
/// Calendar `id` is read from `<dir>/<id>.json`, a document of the form
/// `{"items": [...]}`. Files are re-read on every fetch.
#[derive(Debug, Clone)]
pub struct JsonFileProvider {
    dir: PathBuf,
}

impl JsonFileProvider {
    /// Creates a provider reading from `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the directory events are read from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the file holding `calendar_id`.
    ///
    /// # Errors
    ///
    /// Rejects ids that would escape the events directory.
    pub fn calendar_path(&self, calendar_id: &str) -> ProviderResult<PathBuf> {
        if calendar_id.is_empty()
            || calendar_id.starts_with('.')
            || calendar_id.contains(['/', '\\'])
        {
            return Err(ProviderError::configuration("invalid calendar id")
                .with_provider(self.name())
                .with_calendar_id(calendar_id));
        }
        Ok(self.dir.join(format!("{calendar_id}.json")))
    }

    /// Reads and decodes one calendar file.
    pub async fn read_calendar(&self, calendar_id: &str) -> ProviderResult<Vec<RawEvent>> {
        let path = self.calendar_path(calendar_id)?;

        let contents = tokio::fs::read(&path).await.map_err(|e| {
            let err = if e.kind() == std::io::ErrorKind::NotFound {
                ProviderError::not_found(format!("no events file at {}", path.display()))
            } else {
                ProviderError::io(format!("failed to read {}", path.display()))
            };
            err.with_provider(self.name())
                .with_calendar_id(calendar_id)
                .with_source(e)
        })?;

        let list: RawEventList = serde_json::from_slice(&contents).map_err(|e| {
            ProviderError::invalid_response(format!("failed to decode {}", path.display()))
                .with_provider(self.name())
                .with_calendar_id(calendar_id)
                .with_source(e)
        })?;

        debug!(
            calendar_id,
            path = %path.display(),
            count = list.items.len(),
            "read events file"
        );
        Ok(list.items)
    }
}

impl CalendarProvider for JsonFileProvider {
    fn name(&self) -> &str {
        "json-file"
    }

    fn fetch_events<'a>(
        &'a self,
        calendar_id: &'a str,
        options: FetchOptions,
    ) -> BoxFuture<'a, ProviderResult<Vec<RawEvent>>> {
        Box::pin(async move {
            let events = self.read_calendar(calendar_id).await?;
            Ok(options.apply(calendar_id, events))
        })
    }
}

/// A calendar that could not be fetched.
#[derive(Debug)]
pub struct FetchFailure {
    /// The calendar that failed.
    pub calendar_id: String,
    /// What went wrong.
    pub error: ProviderError,
}

/// Records gathered from every requested calendar.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Records from all calendars that answered, in calendar order.
    pub events: Vec<RawEvent>,
    /// Calendars that failed. They contribute no records.
    pub failures: Vec<FetchFailure>,
}

/// The instant a record starts at, if its start can be read.
fn start_instant<Tz: TimeZone>(raw: &RawEvent, tz: &Tz) -> Option<DateTime<Utc>> {
    match parse_start(raw.start.as_ref()?).ok()? {
        ParsedStart::Date(date) => local_midnight(date, tz).map(|m| m.with_timezone(&Utc)),
        ParsedStart::Instant(instant) => Some(instant.with_timezone(&Utc)),
    }
}

/// Fetches every calendar in `calendar_ids`, at most `concurrency` at once.
///
/// Results are concatenated in the order of `calendar_ids` regardless of
/// completion order. A failing calendar is logged and skipped.
pub async fn fetch_all(
    provider: &dyn CalendarProvider,
    calendar_ids: &[String],
    options: &FetchOptions,
    concurrency: usize,
) -> FetchOutcome {
    let fetches: Vec<BoxFuture<'_, (String, ProviderResult<Vec<RawEvent>>)>> = calendar_ids
        .iter()
        .map(|calendar_id| {
            let calendar_id = calendar_id.clone();
            let options = options.clone();
            Box::pin(async move {
                let result = provider.fetch_events(&calendar_id, options).await;
                (calendar_id, result)
            }) as BoxFuture<'_, _>
        })
        .collect();

    let results: Vec<_> = stream::iter(fetches)
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut outcome = FetchOutcome::default();
    for (calendar_id, result) in results {
        match result {
            Ok(events) => {
                debug!(calendar_id = %calendar_id, count = events.len(), "fetched calendar");
                outcome.events.extend(events);
            }
            Err(error) => {
                warn!(
                    calendar_id = %calendar_id,
                    provider = provider.name(),
                    error = %error,
                    "failed to fetch calendar"
                );
                outcome.failures.push(FetchFailure { calendar_id, error });
            }
        }
    }
    outcome
}
