//! Turns calendar-query REPORT responses into [`CalendarEvent`]s.

use applecal_core::{CalendarEvent, OutputFormat, TYPE_KEY};
use tracing::{debug, trace};

use super::ics::{IcsBlock, IcsDocument};
use super::xml::parse_calendar_data;
use crate::error::ProviderResult;

/// ICS property names that are exposed under a shorter key.
const RENAMES: [(&str, &str); 3] = [
    ("dtstart", "start"),
    ("dtend", "end"),
    ("last-modified", "lastmodified"),
];

/// Output key for an ICS property name.
pub fn event_key(ics_name: &str) -> &str {
    RENAMES
        .iter()
        .find(|(from, _)| *from == ics_name)
        .map_or(ics_name, |(_, to)| *to)
}

/// Key holding a raw `TYPE` property, since `type` carries the component.
pub const RAW_TYPE_KEY: &str = "x-type";

/// Builds an event from a parsed component block.
///
/// Renamed keys are written last, so a vendor property such as `START`
/// never shadows `DTSTART`.
pub fn event_from_block(block: &IcsBlock) -> CalendarEvent {
    let mut event = CalendarEvent::new(block.kind());
    let mut renamed = Vec::new();
    for (name, value) in block.properties() {
        let key = event_key(name);
        if key != name.as_str() {
            renamed.push((key, value));
        } else if name == TYPE_KEY {
            event.insert(RAW_TYPE_KEY, value.as_str());
        } else {
            event.insert(key, value.as_str());
        }
    }
    for (key, value) in renamed {
        event.insert(key, value.as_str());
    }
    event
}

/// Decodes every VEVENT from a REPORT multistatus body.
///
/// Events come out in response order, and in document order within one
/// calendar object. A body without `multistatus/response` yields no
/// events.
///
/// # Errors
///
/// Returns a parse error if `xml` is not well-formed.
pub fn events_from_report(xml: &str) -> ProviderResult<Vec<CalendarEvent>> {
    let objects = parse_calendar_data(xml)?;

    let mut events = Vec::new();
    for object in &objects {
        let document = IcsDocument::parse(&object.data);
        let before = events.len();
        events.extend(document.events().map(event_from_block));
        trace!(
            href = ?object.href,
            blocks = document.len(),
            events = events.len() - before,
            "Decoded calendar object"
        );
    }

    debug!(
        objects = objects.len(),
        events = events.len(),
        "Assembled events from REPORT"
    );
    Ok(events)
}

/// Applies the output projection to every event.
pub fn project_events(events: Vec<CalendarEvent>, format: OutputFormat) -> Vec<CalendarEvent> {
    events
        .into_iter()
        .map(|event| event.project(format))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(payloads: &[&str]) -> String {
        let responses: String = payloads
            .iter()
            .enumerate()
            .map(|(idx, ics)| {
                format!(
                    r#"<d:response>
    <d:href>/1234567890/calendars/home/event-{idx}.ics</d:href>
    <d:propstat>
      <d:prop>
        <d:getetag>"etag-{idx}"</d:getetag>
        <cal:calendar-data><![CDATA[{ics}]]></cal:calendar-data>
      </d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>"#
                )
            })
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<d:multistatus xmlns:d="DAV:" xmlns:cal="urn:ietf:params:xml:ns:caldav">
  {responses}
</d:multistatus>"#
        )
    }

    fn vevent(uid: &str, summary: &str) -> String {
        format!(
            "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nBEGIN:VEVENT\r\nUID:{uid}\r\nSUMMARY:{summary}\r\n\
             DTSTART:20240101T090000Z\r\nDTEND:20240101T100000Z\r\n\
             DTSTAMP:20231220T120000Z\r\nLAST-MODIFIED:20231220T120000Z\r\n\
             END:VEVENT\r\nEND:VCALENDAR\r\n"
        )
    }

    #[test]
    fn renames_date_keys() {
        let xml = report(&[&vevent("abc", "Meeting")]);
        let events = events_from_report(&xml).unwrap();
        assert_eq!(events.len(), 1);

        let event = &events[0];
        assert_eq!(event.component_type(), Some("VEVENT"));
        assert_eq!(event.uid(), Some("abc"));
        assert_eq!(event.start(), Some("20240101T090000Z"));
        assert_eq!(event.end(), Some("20240101T100000Z"));
        assert_eq!(event.get("lastmodified"), Some("20231220T120000Z"));
        assert_eq!(event.get("dtstamp"), Some("20231220T120000Z"));
        assert!(!event.contains("dtstart"));
        assert!(!event.contains("last-modified"));
    }

    #[test]
    fn preserves_response_order() {
        let first = vevent("b-second-alphabetically", "First");
        let second = vevent("a-first-alphabetically", "Second");
        let third = vevent("c", "Third");
        let xml = report(&[&first, &second, &third]);

        let summaries: Vec<_> = events_from_report(&xml)
            .unwrap()
            .iter()
            .filter_map(|e| e.summary().map(str::to_string))
            .collect();
        assert_eq!(summaries, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn only_vevents_are_returned() {
        let todo = "BEGIN:VCALENDAR\r\nBEGIN:VTODO\r\nUID:task\r\nEND:VTODO\r\nEND:VCALENDAR\r\n";
        let event = vevent("abc", "Meeting");
        let xml = report(&[todo, &event]);
        let events = events_from_report(&xml).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].uid(), Some("abc"));
    }

    #[test]
    fn absent_multistatus_is_empty() {
        let xml = r#"<?xml version="1.0"?><error xmlns="DAV:"><note>nothing here</note></error>"#;
        assert!(events_from_report(xml).unwrap().is_empty());
        assert!(events_from_report("").unwrap().is_empty());
    }

    #[test]
    fn response_without_calendar_data_is_skipped() {
        let xml = r#"<d:multistatus xmlns:d="DAV:">
  <d:response>
    <d:href>/1234567890/calendars/home/gone.ics</d:href>
    <d:propstat><d:prop><d:getetag>"1"</d:getetag></d:prop></d:propstat>
  </d:response>
</d:multistatus>"#;
        assert!(events_from_report(xml).unwrap().is_empty());
    }

    #[test]
    fn malformed_report_is_an_error() {
        assert!(events_from_report("<d:multistatus><d:response></d:multistatus>").is_err());
    }

    #[test]
    fn basic_and_full_projection() {
        let ics = "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nUID:abc\r\nSUMMARY:Meeting\r\n\
                   DTSTART:20240101T090000Z\r\nDTEND:20240101T100000Z\r\n\
                   X-APPLE-STRUCTURED-LOCATION;VALUE=URI:geo:1,2\r\nSEQUENCE:3\r\n\
                   END:VEVENT\r\nEND:VCALENDAR\r\n";
        let events = events_from_report(&report(&[ics])).unwrap();

        let full = project_events(events.clone(), OutputFormat::Full);
        assert!(full[0].contains("sequence"));
        assert!(full[0].contains("x-apple-structured-location"));
        assert_eq!(full[0].component_type(), Some("VEVENT"));

        let basic = project_events(events, OutputFormat::Basic);
        let keys: Vec<_> = basic[0].keys().collect();
        assert_eq!(keys, vec!["end", "start", "summary", "uid"]);
    }

    #[test]
    fn renamed_keys_win_over_raw_properties() {
        let ics = "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nUID:a\r\nTYPE:meeting\r\n\
                   START:x\r\nDTSTART:20240101T000000Z\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
        let events = events_from_report(&report(&[ics])).unwrap();
        assert_eq!(events.len(), 1);

        let event = &events[0];
        assert_eq!(event.start(), Some("20240101T000000Z"));
        assert_eq!(event.component_type(), Some("VEVENT"));
        assert_eq!(event.get(RAW_TYPE_KEY), Some("meeting"));
        assert_eq!(event.uid(), Some("a"));
    }

    #[test]
    fn event_key_mapping() {
        assert_eq!(event_key("dtstart"), "start");
        assert_eq!(event_key("dtend"), "end");
        assert_eq!(event_key("last-modified"), "lastmodified");
        assert_eq!(event_key("summary"), "summary");
    }
}
