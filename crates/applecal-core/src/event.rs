//! Caller-facing calendar types.
//!
//! - [`CalendarCollection`]: a calendar discovered on the server
//! - [`CalendarEvent`]: one decoded VEVENT as a flat property mapping
//! - [`OutputFormat`]: whether events are returned in full or reduced to
//!   [`BASIC_KEYS`]

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Property keys kept by [`OutputFormat::Basic`].
pub const BASIC_KEYS: [&str; 8] = [
    "uid",
    "summary",
    "description",
    "start",
    "end",
    "location",
    "created",
    "lastmodified",
];

/// Key under which the component type (`VEVENT`) is stored.
pub const TYPE_KEY: &str = "type";

/// A calendar collection on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarCollection {
    /// Identifier derived from the collection href.
    pub id: String,
    /// The href as reported by the server.
    pub href: String,
    /// Human-readable name (never empty).
    #[serde(rename = "displayName")]
    pub display_name: String,
}

impl CalendarCollection {
    /// Creates a new collection.
    pub fn new(
        id: impl Into<String>,
        href: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            href: href.into(),
            display_name: display_name.into(),
        }
    }
}

/// A decoded calendar event.
///
/// Keys are lowercase property names. Date-time values are kept in the
/// textual form the server sent (`20240101T090000Z`, `20240101`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalendarEvent {
    properties: BTreeMap<String, String>,
}

impl CalendarEvent {
    /// Creates an event for the given component type with no other properties.
    pub fn new(component_type: impl Into<String>) -> Self {
        let mut properties = BTreeMap::new();
        properties.insert(TYPE_KEY.to_string(), component_type.into());
        Self { properties }
    }

    /// Sets a property, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Builder form of [`CalendarEvent::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Returns the value of a property.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Returns `true` if the property is present.
    pub fn contains(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// The component type, `VEVENT` for everything the assembler emits.
    pub fn component_type(&self) -> Option<&str> {
        self.get(TYPE_KEY)
    }

    pub fn uid(&self) -> Option<&str> {
        self.get("uid")
    }

    pub fn summary(&self) -> Option<&str> {
        self.get("summary")
    }

    pub fn start(&self) -> Option<&str> {
        self.get("start")
    }

    pub fn end(&self) -> Option<&str> {
        self.get("end")
    }

    /// Iterates over keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Number of properties, including `type`.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Returns the underlying mapping.
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// Projects the event for output.
    ///
    /// [`OutputFormat::Full`] returns the event unchanged. [`OutputFormat::Basic`]
    /// keeps only the keys in [`BASIC_KEYS`] that are present.
    #[must_use]
    pub fn project(self, format: OutputFormat) -> Self {
        match format {
            OutputFormat::Full => self,
            OutputFormat::Basic => Self {
                properties: self
                    .properties
                    .into_iter()
                    .filter(|(key, _)| BASIC_KEYS.contains(&key.as_str()))
                    .collect(),
            },
        }
    }
}

/// How much of each event is returned to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Only [`BASIC_KEYS`].
    #[default]
    Basic,
    /// Every decoded property.
    #[serde(alias = "raw")]
    Full,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Full => "full",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "full" | "raw" => Ok(Self::Full),
            other => Err(format!(
                "unknown output format {other:?} (expected \"basic\" or \"full\")"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> CalendarEvent {
        CalendarEvent::new("VEVENT")
            .with("uid", "abc")
            .with("summary", "Meeting")
            .with("start", "20240101T090000Z")
            .with("end", "20240101T100000Z")
            .with("dtstamp", "20231220T120000Z")
            .with("x-apple-travel-advisory-behavior", "AUTOMATIC")
    }

    #[test]
    fn accessors() {
        let event = sample_event();
        assert_eq!(event.component_type(), Some("VEVENT"));
        assert_eq!(event.uid(), Some("abc"));
        assert_eq!(event.summary(), Some("Meeting"));
        assert_eq!(event.start(), Some("20240101T090000Z"));
        assert_eq!(event.end(), Some("20240101T100000Z"));
        assert!(event.get("location").is_none());
        assert_eq!(event.len(), 7);
    }

    #[test]
    fn full_projection_is_identity() {
        let event = sample_event();
        assert_eq!(event.clone().project(OutputFormat::Full), event);
    }

    #[test]
    fn basic_projection_drops_everything_else() {
        let projected = sample_event().project(OutputFormat::Basic);
        let keys: Vec<_> = projected.keys().collect();
        assert_eq!(keys, vec!["end", "start", "summary", "uid"]);
        assert!(!projected.contains(TYPE_KEY));
        assert!(!projected.contains("dtstamp"));
    }

    #[test]
    fn basic_projection_snapshot() {
        insta::assert_json_snapshot!(sample_event().project(OutputFormat::Basic), @r#"
        {
          "end": "20240101T100000Z",
          "start": "20240101T090000Z",
          "summary": "Meeting",
          "uid": "abc"
        }
        "#);
    }

    #[test]
    fn event_serializes_as_flat_map() {
        let event = CalendarEvent::new("VEVENT").with("uid", "abc");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json, serde_json::json!({"type": "VEVENT", "uid": "abc"}));
    }

    #[test]
    fn collection_uses_camel_case_display_name() {
        let collection = CalendarCollection::new("home", "/123/calendars/home/", "Home");
        let json = serde_json::to_value(&collection).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "home", "href": "/123/calendars/home/", "displayName": "Home"})
        );
    }

    #[test]
    fn output_format_parsing() {
        assert_eq!("basic".parse::<OutputFormat>(), Ok(OutputFormat::Basic));
        assert_eq!("FULL".parse::<OutputFormat>(), Ok(OutputFormat::Full));
        assert_eq!("raw".parse::<OutputFormat>(), Ok(OutputFormat::Full));
        assert!("compact".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::default(), OutputFormat::Basic);
        assert_eq!(OutputFormat::Full.to_string(), "full");
    }

    #[test]
    fn output_format_serde_accepts_raw_alias() {
        let format: OutputFormat = serde_json::from_str("\"raw\"").unwrap();
        assert_eq!(format, OutputFormat::Full);
        assert_eq!(serde_json::to_string(&OutputFormat::Basic).unwrap(), "\"basic\"");
    }
}
