//! Raw calendar records and the path from them to agenda events.
//!
//! - [`CalendarProvider`] - The trait every event source implements
//! - [`RawEvent`] - Events API shaped record, as the source delivered it
//! - [`normalize_events`] - Two-pool conversion into [`AgendaEvent`]s
//! - [`fetch_all`] - Bounded fan-out across configured calendars
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   ┌──────────────────┐
//! │ JsonFileProvider │   │  StaticProvider  │
//! └────────┬─────────┘   └────────┬─────────┘
//!          │   CalendarProvider   │
//!          └──────────┬───────────┘
//!                     ▼ fetch_all()
//!              ┌─────────────┐
//!              │  RawEvent   │
//!              └──────┬──────┘
//!                     ▼ normalize_events()
//!     ┌──────────────────┐  ┌───────────────┐
//!     │ AgendaEvent pool │  │ RejectedEvent │
//!     └──────────────────┘  └───────────────┘
//! ```
//!
//! [`AgendaEvent`]: dashagenda_core::AgendaEvent

pub mod error;
pub mod normalize;
pub mod provider;
pub mod raw_event;

// Re-export main types at crate root
pub use error::{NormalizationError, ProviderError, ProviderErrorCode, ProviderResult};
pub use normalize::{
    NormalizedBatch, RejectedEvent, normalize_event, normalize_event_in, normalize_events,
    normalize_events_in,
};
pub use provider::{
    BoxFuture, CalendarProvider, DEFAULT_FETCH_CONCURRENCY, DEFAULT_MAX_RESULTS, FetchFailure,
    FetchOptions, FetchOutcome, JsonFileProvider, StaticProvider, fetch_all,
};
pub use raw_event::{RawEvent, RawEventList, RawEventTime, STATUS_CANCELLED};
