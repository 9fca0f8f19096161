//! CalDAV decoding for iCloud calendars.
//!
//! - [`caldav::find_xml_values`] - schema-less path lookup over XML
//! - [`caldav::parse_calendars`] / [`caldav::parse_calendar_data`] - multistatus decoding
//! - [`caldav::IcsDocument`] - iCalendar text parsing
//! - [`caldav::resolve_principal`] - principal discovery
//! - [`caldav::events_from_report`] - REPORT body to ordered events
//! - [`CalDavTransport`] - the seam where hosts plug in authenticated HTTP
//! - [`caldav::AppleCalendarProvider`] - principal, collections and events over a transport

pub mod caldav;
pub mod error;
pub mod transport;

pub use caldav::{AppleCalendarProvider, CalDavConfig, PrincipalMatcher};
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use transport::{BoxFuture, CalDavRequest, CalDavTransport, DavMethod, XML_CONTENT_TYPE};
