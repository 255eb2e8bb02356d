//! Core types: agenda events, local time, ordering, bounded rendering

pub mod event;
pub mod format;
pub mod sort;
pub mod time;
pub mod tracing;

pub use event::{ALL_DAY_LABEL, AgendaEvent};
pub use format::{
    AgendaRenderer, DEFAULT_MAX_LINES, RenderOptions, RenderedAgenda, ellipsis, render,
    single_line,
};
pub use sort::{LessFn, OrderedBy, agenda_order, by_instant, by_summary};
pub use time::{local_midnight, start_of_local_day, to_local};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
