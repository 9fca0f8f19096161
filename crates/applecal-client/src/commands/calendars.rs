//! `calendars` command.

use applecal_providers::{AppleCalendarProvider, CalDavTransport};

use super::print_json;
use crate::error::ClientResult;

/// Prints the calendar collections as a JSON array.
pub async fn run<T: CalDavTransport>(
    provider: &AppleCalendarProvider<T>,
    pretty: bool,
) -> ClientResult<()> {
    let calendars = provider.list_calendars().await?;
    print_json(&calendars, pretty)
}
