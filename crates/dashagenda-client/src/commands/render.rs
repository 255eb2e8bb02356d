//! Render command: the agenda pipeline over one events file, no server.

use std::path::Path;

use chrono::{Local, TimeZone};
use tracing::{debug, info};

use dashagenda_core::{AgendaRenderer, RenderOptions, RenderedAgenda, agenda_order};
use dashagenda_providers::{RawEvent, RawEventList, normalize_events_in};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Renders `file` to stdout in the local timezone.
pub async fn run(file: &Path, max_lines: Option<usize>, config: &ClientConfig) -> ClientResult<()> {
    let list = read_events(file).await?;
    let rendered = render_events_in(&list.items, render_options(config, max_lines), &Local);
    print!("{}", rendered.text);
    Ok(())
}

/// Reads an events file shaped like `{"items": [...]}`.
pub async fn read_events(path: &Path) -> ClientResult<RawEventList> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ClientError::events_file(path, e))?;
    let list: RawEventList =
        serde_json::from_str(&content).map_err(|e| ClientError::events_file(path, e))?;
    debug!(path = %path.display(), items = list.items.len(), "read events file");
    Ok(list)
}

/// Builds render options from config and an optional per-call budget.
pub fn render_options(config: &ClientConfig, max_lines: Option<usize>) -> RenderOptions {
    RenderOptions {
        max_lines: max_lines.unwrap_or(config.agenda.max_lines),
        max_summary_length: config.agenda.max_summary_length,
    }
}

/// Normalizes, sorts and renders `events` as seen from `tz`.
pub fn render_events_in<Tz: TimeZone>(
    events: &[RawEvent],
    options: RenderOptions,
    tz: &Tz,
) -> RenderedAgenda {
    let batch = normalize_events_in(events, tz);
    let mut accepted = batch.accepted;
    agenda_order().sort(&mut accepted);

    let rendered = AgendaRenderer::new(options).render_agenda(&accepted);
    info!(
        rendered = rendered.rendered_events,
        rejected = batch.rejected.len(),
        cancelled = batch.cancelled,
        dropped = rendered.dropped_events,
        "rendered events file"
    );
    rendered
}
