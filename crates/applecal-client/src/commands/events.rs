//! `events` command: one item per calendar id.

use applecal_core::{CalendarEvent, OutputFormat, TimeRange};
use applecal_providers::{AppleCalendarProvider, CalDavTransport};
use serde::Serialize;
use tracing::{info, warn};

use super::print_json;
use crate::cli::EventsArgs;
use crate::error::ClientResult;

/// One element of the `events` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BatchEntry {
    Event(CalendarEvent),
    /// A calendar that failed while `continue_on_fail` was set.
    Failure { error: String, item: usize },
}

/// Fetches the events of every calendar in order.
///
/// Without `continue_on_fail` the first failing calendar aborts the batch.
pub async fn collect<T: CalDavTransport>(
    provider: &AppleCalendarProvider<T>,
    calendars: &[String],
    range: &TimeRange,
    format: OutputFormat,
    continue_on_fail: bool,
) -> ClientResult<Vec<BatchEntry>> {
    let mut entries = Vec::new();
    for (item, calendar) in calendars.iter().enumerate() {
        match provider.get_events_projected(calendar, range, format).await {
            Ok(events) => entries.extend(events.into_iter().map(BatchEntry::Event)),
            Err(err) if continue_on_fail => {
                warn!(item, calendar = %calendar, error = %err, "Calendar failed, continuing");
                entries.push(BatchEntry::Failure {
                    error: err.to_string(),
                    item,
                });
            }
            Err(err) => return Err(err.into()),
        }
    }
    info!(items = calendars.len(), entries = entries.len(), "Events batch done");
    Ok(entries)
}

/// Runs the `events` command and prints one JSON array.
pub async fn run<T: CalDavTransport>(
    provider: &AppleCalendarProvider<T>,
    args: &EventsArgs,
    default_format: OutputFormat,
    pretty: bool,
) -> ClientResult<()> {
    let range = TimeRange::from_iso(&args.start, &args.end)?;
    let format = args.format.unwrap_or(default_format);
    let entries = collect(
        provider,
        &args.calendars,
        &range,
        format,
        args.continue_on_fail,
    )
    .await?;
    print_json(&entries, pretty)
}
