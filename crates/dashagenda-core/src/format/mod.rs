//! Bounded agenda rendering.
//!
//! The renderer walks an already-sorted sequence of [`AgendaEvent`]s, groups
//! them by local calendar day and writes a plain-text digest that never
//! exceeds a fixed number of lines:
//!
//! ```text
//!
//! Tuesday Mar 05
//!  All day: Dentist
//!   9:00AM: Standup
//! ```
//!
//! Each day group starts with a blank line and a heading. Running out of
//! budget is not an error: rendering simply stops and the remaining events
//! are reported as dropped.
//!
//! # Example
//!
//! ```rust
//! use dashagenda_core::format::render;
//!
//! assert_eq!(render(&[], 36), "");
//! ```

use std::borrow::Cow;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::event::AgendaEvent;


/// Default line budget for one rendered agenda.
pub const DEFAULT_MAX_LINES: usize = 36;

/// Minimum width of the right-justified time column.
pub const TIME_COLUMN_WIDTH: usize = 8;

/// Lines needed to open a new day group: a blank line and the heading.
const DAY_HEADING_LINES: usize = 2;

/// Configuration options for agenda rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Hard cap on the number of output lines.
    pub max_lines: usize,
    /// Maximum summary length in characters (truncated with ellipsis).
    pub max_summary_length: Option<usize>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_lines: DEFAULT_MAX_LINES,
            max_summary_length: None,
        }
    }
}

impl RenderOptions {
    /// Creates options with the given line budget.
    pub fn with_max_lines(max_lines: usize) -> Self {
        Self {
            max_lines,
            ..Default::default()
        }
    }

    /// Builder method to cap summary length.
    #[must_use]
    pub fn with_max_summary_length(mut self, max: usize) -> Self {
        self.max_summary_length = Some(max);
        self
    }
}

/// The result of rendering an agenda.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedAgenda {
    /// The rendered text.
    pub text: String,
    /// Number of lines written, including blank separator lines.
    pub lines: usize,
    /// Number of events that made it into the text.
    pub rendered_events: usize,
    /// Number of events left out because the budget ran out.
    pub dropped_events: usize,
}

impl RenderedAgenda {
    /// Returns true if some events did not fit.
    pub fn is_truncated(&self) -> bool {
        self.dropped_events > 0
    }
}

/// Renders sorted agenda events under a line budget.
#[derive(Debug, Clone, Default)]
pub struct AgendaRenderer {
    options: RenderOptions,
}

impl AgendaRenderer {
    /// Creates a renderer with the given options.
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Creates a renderer with default options.
    pub fn with_defaults() -> Self {
        Self::new(RenderOptions::default())
    }

    /// Returns the renderer options.
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Renders `events` and returns only the text.
    pub fn render(&self, events: &[AgendaEvent]) -> String {
        self.render_agenda(events).text
    }

    /// Renders `events`, which must already be in presentation order.
    ///
    /// A new day group is only opened while its heading and at least one
    /// event still fit; inside a group events are written until the budget
    /// is exhausted.
    pub fn render_agenda(&self, events: &[AgendaEvent]) -> RenderedAgenda {
        let max_lines = self.options.max_lines;
        let mut output = String::new();
        let mut lines = 0usize;
        let mut current_day: Option<NaiveDate> = None;
        let mut rendered = 0usize;

        for event in events {
            let day = event.day();

            if current_day != Some(day) {
                if lines >= max_lines.saturating_sub(DAY_HEADING_LINES) {
                    break;
                }
                output.push('\n');
                output.push_str(&event.day_heading());
                output.push('\n');
                lines += DAY_HEADING_LINES;
                current_day = Some(day);
            }

            if lines >= max_lines {
                break;
            }

            output.push_str(&self.format_line(event));
            lines += 1;
            rendered += 1;
        }

        let dropped = events.len() - rendered;
        if dropped > 0 {
            debug!(lines, dropped, "no more room in the agenda, ignoring the rest");
        }

        RenderedAgenda {
            text: output,
            lines,
            rendered_events: rendered,
            dropped_events: dropped,
        }
    }

    /// Formats one event line, including the trailing newline.
    fn format_line(&self, event: &AgendaEvent) -> String {
        let summary = single_line(&event.summary);
        let summary = match self.options.max_summary_length {
            Some(max) => Cow::Owned(ellipsis(&summary, max).into_owned()),
            None => summary,
        };
        format!(
            "{:>width$}: {}\n",
            event.time_label(),
            summary,
            width = TIME_COLUMN_WIDTH
        )
    }
}

/// Renders `events` with a line budget of `max_lines`.
pub fn render(events: &[AgendaEvent], max_lines: usize) -> String {
    AgendaRenderer::new(RenderOptions::with_max_lines(max_lines)).render(events)
}

/// Replaces line breaks so a summary always occupies one output line.
pub fn single_line(s: &str) -> Cow<'_, str> {
    if s.contains(['\n', '\r']) {
        Cow::Owned(s.replace("\r\n", " ").replace(['\n', '\r'], " "))
    } else {
        Cow::Borrowed(s)
    }
}

/// Truncates a string with ellipsis if it exceeds the given length.
pub fn ellipsis(s: &str, max_len: usize) -> Cow<'_, str> {
    if max_len == 0 {
        return Cow::Borrowed("");
    }

    let char_count = s.chars().count();

    if char_count <= max_len {
        return Cow::Borrowed(s);
    }

    if max_len <= 3 {
        return Cow::Owned(s.chars().take(max_len).collect());
    }

    let truncated: String = s.chars().take(max_len - 3).collect();
    Cow::Owned(format!("{}...", truncated))
}
