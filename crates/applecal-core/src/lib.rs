//! Core types: calendar collections, events, output projection, time, tracing

pub mod event;
pub mod time;
pub mod tracing;

pub use event::{BASIC_KEYS, CalendarCollection, CalendarEvent, OutputFormat, TYPE_KEY};
pub use time::{TimeError, TimeRange, iso_to_caldav, to_caldav_datetime};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
