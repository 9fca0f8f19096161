//! CalDAV decoding and the Apple calendar provider.
//!
//! The decoding functions are pure and synchronous. They take response
//! bodies that a [`CalDavTransport`](crate::CalDavTransport) already fetched:
//!
//! ```text
//! PROPFIND body ──► resolve_principal ──► principal id
//! PROPFIND body ──► parse_calendars   ──► Vec<CalendarCollection>
//! REPORT body   ──► parse_calendar_data ──► ICS text ──► IcsDocument
//!                                                          │
//!                                  events_from_report ◄────┘ VEVENT blocks
//! ```
//!
//! # Example
//!
//! ```ignore
//! use applecal_providers::caldav::{AppleCalendarProvider, CalDavConfig};
//! use applecal_core::{OutputFormat, TimeRange};
//!
//! let config = CalDavConfig::icloud()?.with_credentials("me@icloud.com", "app-password");
//! let provider = AppleCalendarProvider::connect(config)?;
//! let range = TimeRange::from_iso("2025-02-01", "2025-02-08")?;
//! let events = provider
//!     .get_events_projected("home", &range, OutputFormat::Basic)
//!     .await?;
//! ```

mod auth;
#[cfg(feature = "http")]
mod client;
mod config;
pub mod events;
pub mod ics;
mod principal;
mod provider;
pub mod tree;
pub mod xml;

pub use auth::Credentials;
#[cfg(feature = "http")]
pub use auth::basic_auth;
#[cfg(feature = "http")]
pub use client::HttpTransport;
pub use config::CalDavConfig;
pub use events::{RAW_TYPE_KEY, event_from_block, event_key, events_from_report, project_events};
pub use ics::{IcsBlock, IcsDocument};
pub use principal::{ICLOUD_PRINCIPAL_PATTERN, PrincipalMatcher, resolve_principal};
pub use provider::AppleCalendarProvider;
pub use tree::{XmlDocument, XmlElement, XmlNode, find_xml_values};
pub use xml::{
    CalendarObject, calendar_query_body, collection_id, parse_calendar_data, parse_calendars,
    propfind_calendars_body, propfind_principal_body,
};
