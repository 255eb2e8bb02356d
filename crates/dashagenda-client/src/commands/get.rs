//! Commands that talk to a running server.

use std::io::Write;

use dashagenda_protocol::{AgendaPayload, StatusInfo};

use crate::error::ClientResult;
use crate::socket::SocketClient;

/// Fetches an agenda and prints it.
pub async fn run(client: &SocketClient, max_lines: Option<usize>) -> ClientResult<()> {
    let agenda = client.get_agenda(max_lines).await?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(agenda.text.as_bytes())?;
    stdout.flush()?;

    if let Some(note) = failure_note(&agenda) {
        eprintln!("{note}");
    }
    Ok(())
}

/// Prints the server status.
pub async fn status(client: &SocketClient) -> ClientResult<()> {
    let info = client.status().await?;
    print!("{}", format_status(&info));
    Ok(())
}

/// Describes calendars that could not be fetched, if any.
pub fn failure_note(agenda: &AgendaPayload) -> Option<String> {
    if agenda.failed_calendars.is_empty() {
        return None;
    }
    Some(format!(
        "warning: could not fetch {}",
        agenda.failed_calendars.join(", ")
    ))
}

/// Formats status information, one `key: value` per line.
pub fn format_status(info: &StatusInfo) -> String {
    let last = info
        .last_agenda_at
        .map(|at| at.to_rfc3339())
        .unwrap_or_else(|| "never".to_string());
    format!(
        "uptime: {}s\nprovider: {}\ncalendars: {}\nmax_lines: {}\nagendas_served: {}\nlast_agenda_at: {}\n",
        info.uptime_seconds,
        info.provider,
        info.calendars.join(", "),
        info.max_lines,
        info.agendas_served,
        last
    )
}
