//! Apple calendar provider: principal, collections, then events.

use std::borrow::Cow;

use applecal_core::{CalendarCollection, CalendarEvent, OutputFormat, TimeRange};
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};
use crate::transport::{CalDavRequest, CalDavTransport};

use super::config::CalDavConfig;
use super::events::{events_from_report, project_events};
use super::principal::resolve_principal;
use super::xml::{
    calendar_query_body, parse_calendars, propfind_calendars_body, propfind_principal_body,
};

/// Calendar provider for iCloud and compatible CalDAV servers.
///
/// Each operation discovers the principal again; nothing is cached between
/// calls.
pub struct AppleCalendarProvider<T> {
    transport: T,
    config: CalDavConfig,
}

#[cfg(feature = "http")]
impl AppleCalendarProvider<super::client::HttpTransport> {
    /// Creates a provider that talks HTTP using the configured credentials.
    pub fn connect(config: CalDavConfig) -> ProviderResult<Self> {
        let transport = super::client::HttpTransport::new(&config)?;
        Ok(Self::new(transport, config))
    }
}

impl<T: CalDavTransport> AppleCalendarProvider<T> {
    pub fn new(transport: T, config: CalDavConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &CalDavConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Resolves the principal id of the authenticated user.
    pub async fn get_principal(&self) -> ProviderResult<String> {
        let url = self.config.url_str();
        debug!(url = %url, "Discovering principal via PROPFIND");

        let request = CalDavRequest::propfind(url, 0, propfind_principal_body()?);
        let response = self.transport.send(request).await?;
        resolve_principal(&response, &self.config.principal_matcher)
    }

    /// Lists the calendar collections of `principal`.
    pub async fn get_calendars(&self, principal: &str) -> ProviderResult<Vec<CalendarCollection>> {
        let url = self.config.calendars_url(principal)?;
        debug!(url = %url, "Listing calendars via PROPFIND");

        let request = CalDavRequest::propfind(url.as_str(), 1, propfind_calendars_body()?);
        let response = self.transport.send(request).await?;
        let calendars = parse_calendars(&response, principal)?;

        info!(count = calendars.len(), "Discovered calendars");
        Ok(calendars)
    }

    /// Resolves the principal, then lists its calendars.
    pub async fn list_calendars(&self) -> ProviderResult<Vec<CalendarCollection>> {
        let principal = self.get_principal().await?;
        self.get_calendars(&principal).await
    }

    /// Fetches the events of one calendar within `range`, in server order.
    ///
    /// `calendar_id` may be percent-encoded, as found in collection hrefs.
    pub async fn get_events(
        &self,
        calendar_id: &str,
        range: &TimeRange,
    ) -> ProviderResult<Vec<CalendarEvent>> {
        let calendar_id = decode_calendar_id(calendar_id)?;
        let principal = self.get_principal().await?;
        let url = self.config.calendar_url(&principal, &calendar_id)?;

        debug!(
            calendar = %calendar_id,
            start = %range.start,
            end = %range.end,
            "Fetching events with REPORT"
        );

        let body = calendar_query_body(&range.start, &range.end)?;
        let response = self
            .transport
            .send(CalDavRequest::report(url.as_str(), body))
            .await?;
        let events = events_from_report(&response)?;

        info!(calendar = %calendar_id, count = events.len(), "Fetched events");
        Ok(events)
    }

    /// Same as [`get_events`](Self::get_events), projected to `format`.
    pub async fn get_events_projected(
        &self,
        calendar_id: &str,
        range: &TimeRange,
        format: OutputFormat,
    ) -> ProviderResult<Vec<CalendarEvent>> {
        let events = self.get_events(calendar_id, range).await?;
        Ok(project_events(events, format))
    }
}

fn decode_calendar_id(calendar_id: &str) -> ProviderResult<Cow<'_, str>> {
    let decoded = urlencoding::decode(calendar_id.trim_matches('/')).map_err(|e| {
        ProviderError::configuration(format!("calendar id {calendar_id:?} is not valid UTF-8"))
            .with_source(e)
    })?;
    if decoded.is_empty() {
        return Err(ProviderError::configuration("calendar id is empty"));
    }
    Ok(decoded)
}
