//! WebDAV request bodies and multistatus decoding.
//!
//! Request bodies are written with quick-xml. Responses are decoded through
//! the schema-less [`XmlDocument`] so that singular and repeated `response`
//! and `propstat` elements are handled the same way.

use std::io::Cursor;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use tracing::{debug, trace};

use applecal_core::CalendarCollection;

use super::tree::{XmlDocument, XmlNode};
use crate::error::{ProviderError, ProviderResult};

/// DAV namespace
pub const DAV_NS: &str = "DAV:";
/// CalDAV namespace
pub const CALDAV_NS: &str = "urn:ietf:params:xml:ns:caldav";

/// Path segment that is never a calendar id.
const CALENDARS_SEGMENT: &str = "calendars";

type XmlWriter = Writer<Cursor<Vec<u8>>>;

/// Runs `write` against a fresh writer that already holds the XML
/// declaration, and returns the finished document.
fn build_body(
    write: impl FnOnce(&mut XmlWriter) -> ProviderResult<()>,
) -> ProviderResult<String> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    emit(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)),
    )?;
    write(&mut writer)?;

    String::from_utf8(writer.into_inner().into_inner())
        .map_err(|e| ProviderError::internal(format!("request body is not UTF-8: {e}")))
}

fn emit(writer: &mut XmlWriter, event: Event<'_>) -> ProviderResult<()> {
    writer
        .write_event(event)
        .map_err(|e| ProviderError::internal(format!("failed to write request body: {e}")))
}

fn start(writer: &mut XmlWriter, element: BytesStart<'_>) -> ProviderResult<()> {
    emit(writer, Event::Start(element))
}

fn end(writer: &mut XmlWriter, name: &str) -> ProviderResult<()> {
    emit(writer, Event::End(BytesEnd::new(name)))
}

fn empty(writer: &mut XmlWriter, element: BytesStart<'_>) -> ProviderResult<()> {
    emit(writer, Event::Empty(element))
}

/// PROPFIND body asking for the authenticated user's principal.
pub fn propfind_principal_body() -> ProviderResult<String> {
    build_body(|w| {
        start(w, BytesStart::new("d:propfind").with_attributes([("xmlns:d", DAV_NS)]))?;
        start(w, BytesStart::new("d:prop"))?;
        empty(w, BytesStart::new("d:current-user-principal"))?;
        end(w, "d:prop")?;
        end(w, "d:propfind")
    })
}

/// PROPFIND body listing the calendar collections under a principal.
pub fn propfind_calendars_body() -> ProviderResult<String> {
    build_body(|w| {
        start(
            w,
            BytesStart::new("d:propfind")
                .with_attributes([("xmlns:d", DAV_NS), ("xmlns:cal", CALDAV_NS)]),
        )?;
        start(w, BytesStart::new("d:prop"))?;
        empty(w, BytesStart::new("d:displayname"))?;
        empty(w, BytesStart::new("cal:calendar-description"))?;
        empty(w, BytesStart::new("cal:supported-calendar-component-set"))?;
        end(w, "d:prop")?;
        end(w, "d:propfind")
    })
}

/// calendar-query REPORT body for VEVENTs overlapping `[start, end]`.
///
/// Both bounds must already be in CalDAV wire form (`20250201T000000Z`).
pub fn calendar_query_body(start_bound: &str, end_bound: &str) -> ProviderResult<String> {
    build_body(|w| {
        start(
            w,
            BytesStart::new("c:calendar-query")
                .with_attributes([("xmlns:d", DAV_NS), ("xmlns:c", CALDAV_NS)]),
        )?;

        start(w, BytesStart::new("d:prop"))?;
        empty(w, BytesStart::new("d:getetag"))?;
        empty(w, BytesStart::new("c:calendar-data"))?;
        end(w, "d:prop")?;

        start(w, BytesStart::new("c:filter"))?;
        start(
            w,
            BytesStart::new("c:comp-filter").with_attributes([("name", "VCALENDAR")]),
        )?;
        start(
            w,
            BytesStart::new("c:comp-filter").with_attributes([("name", "VEVENT")]),
        )?;
        empty(
            w,
            BytesStart::new("c:time-range")
                .with_attributes([("start", start_bound), ("end", end_bound)]),
        )?;
        end(w, "c:comp-filter")?;
        end(w, "c:comp-filter")?;
        end(w, "c:filter")?;

        end(w, "c:calendar-query")
    })
}

/// One calendar object resource from a REPORT response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarObject {
    /// The resource href, if the server sent one.
    pub href: Option<String>,
    /// The ETag without surrounding quotes.
    pub etag: Option<String>,
    /// The iCalendar text.
    pub data: String,
}

/// All `multistatus/response` nodes. Absent means none.
fn responses(document: &XmlDocument) -> Vec<&XmlNode> {
    document.select(&["multistatus", "response"])
}

/// All `propstat/prop` nodes of a response, in order.
fn props(response: &XmlNode) -> impl Iterator<Item = &XmlNode> {
    response
        .children("propstat")
        .filter_map(|propstat| propstat.child("prop"))
}

/// First non-empty text of a property across all propstats.
fn first_prop_text<'a>(response: &'a XmlNode, name: &str) -> Option<&'a str> {
    props(response)
        .filter_map(|prop| prop.child(name))
        .map(XmlNode::text_content)
        .find(|text| !text.is_empty())
}

/// Derives a collection id from its href.
///
/// The id is the last non-empty path segment that is neither the principal
/// id nor `calendars`.
pub fn collection_id(href: &str, principal: &str) -> Option<String> {
    href.split('/')
        .rev()
        .find(|segment| !segment.is_empty() && *segment != principal && *segment != CALENDARS_SEGMENT)
        .map(str::to_string)
}

/// Decodes the calendar collections from a PROPFIND multistatus.
///
/// Responses without a usable id or display name are dropped.
///
/// # Errors
///
/// Returns a parse error if `xml` is not well-formed.
pub fn parse_calendars(xml: &str, principal: &str) -> ProviderResult<Vec<CalendarCollection>> {
    let document = XmlDocument::parse(xml)?;
    let responses = responses(&document);

    let calendars: Vec<CalendarCollection> = responses
        .iter()
        .filter_map(|response| {
            let href = response
                .child("href")
                .map(XmlNode::text_content)
                .unwrap_or_default();
            let Some(display_name) = first_prop_text(response, "displayname") else {
                trace!(href = %href, "Skipping response without displayname");
                return None;
            };
            let Some(id) = collection_id(href, principal) else {
                trace!(href = %href, "Skipping response without collection id");
                return None;
            };
            Some(CalendarCollection::new(id, href, display_name))
        })
        .collect();

    debug!(
        responses = responses.len(),
        calendars = calendars.len(),
        "Decoded calendar collections"
    );
    Ok(calendars)
}

/// Decodes the calendar-data payloads from a REPORT multistatus.
///
/// `calendar-data` may be plain text or an element with mixed content; both
/// yield their text. Responses without calendar-data (for instance ones that
/// only carry an etag) are skipped.
///
/// # Errors
///
/// Returns a parse error if `xml` is not well-formed.
pub fn parse_calendar_data(xml: &str) -> ProviderResult<Vec<CalendarObject>> {
    let document = XmlDocument::parse(xml)?;
    let responses = responses(&document);

    let objects: Vec<CalendarObject> = responses
        .iter()
        .filter_map(|response| {
            let href = response
                .child("href")
                .map(|node| node.text_content().to_string());
            let Some(data) = first_prop_text(response, "calendar-data") else {
                trace!(href = ?href, "Skipping response without calendar-data");
                return None;
            };
            let etag = first_prop_text(response, "getetag")
                .map(|etag| etag.trim_matches('"').to_string());
            Some(CalendarObject {
                href,
                etag,
                data: data.to_string(),
            })
        })
        .collect();

    debug!(
        responses = responses.len(),
        objects = objects.len(),
        "Decoded calendar-data payloads"
    );
    Ok(objects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;

    #[test]
    fn principal_body_generation() {
        let body = propfind_principal_body().unwrap();
        assert!(body.starts_with(r#"<?xml version="1.0" encoding="utf-8"?>"#));
        assert!(body.contains(r#"<d:propfind xmlns:d="DAV:">"#));
        assert!(body.contains("<d:current-user-principal/>"));
    }

    #[test]
    fn calendars_body_generation() {
        let body = propfind_calendars_body().unwrap();
        assert!(body.contains(r#"xmlns:cal="urn:ietf:params:xml:ns:caldav""#));
        assert!(body.contains("<d:displayname/>"));
        assert!(body.contains("<cal:calendar-description/>"));
        assert!(body.contains("<cal:supported-calendar-component-set/>"));
    }

    #[test]
    fn calendar_query_body_generation() {
        let body = calendar_query_body("20250201T000000Z", "20250228T235959Z").unwrap();
        assert!(body.contains("<c:calendar-query"));
        assert!(body.contains("<d:getetag/>"));
        assert!(body.contains("<c:calendar-data/>"));
        assert!(body.contains(r#"<c:comp-filter name="VCALENDAR">"#));
        assert!(body.contains(r#"<c:comp-filter name="VEVENT">"#));
        assert!(body.contains(r#"<c:time-range start="20250201T000000Z" end="20250228T235959Z"/>"#));
    }

    #[test]
    fn request_bodies_are_well_formed() {
        for body in [
            propfind_principal_body().unwrap(),
            propfind_calendars_body().unwrap(),
            calendar_query_body("20250201T000000Z", "20250202T000000Z").unwrap(),
        ] {
            XmlDocument::parse(&body).unwrap();
        }
    }

    #[test]
    fn collection_id_rules() {
        assert_eq!(
            collection_id("/1234567890/calendars/home/", "1234567890").as_deref(),
            Some("home")
        );
        assert_eq!(
            collection_id(
                "https://p42-caldav.icloud.com/1234567890/calendars/work/",
                "1234567890"
            )
            .as_deref(),
            Some("work")
        );
        assert_eq!(collection_id("/1234567890/calendars/", "1234567890"), None);
        assert_eq!(collection_id("", "1234567890"), None);
    }

    const CALENDARS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<multistatus xmlns="DAV:">
  <response>
    <href>/1234567890/calendars/</href>
    <propstat>
      <prop><displayname>Home set</displayname></prop>
      <status>HTTP/1.1 200 OK</status>
    </propstat>
  </response>
  <response>
    <href>/1234567890/calendars/home/</href>
    <propstat>
      <prop><calendar-description xmlns="urn:ietf:params:xml:ns:caldav"/></prop>
      <status>HTTP/1.1 404 Not Found</status>
    </propstat>
    <propstat>
      <prop><displayname>Home</displayname></prop>
      <status>HTTP/1.1 200 OK</status>
    </propstat>
  </response>
  <response>
    <href>/1234567890/calendars/tasks/</href>
    <propstat>
      <prop><displayname/></prop>
      <status>HTTP/1.1 200 OK</status>
    </propstat>
  </response>
  <response>
    <href>/1234567890/calendars/work/</href>
    <propstat>
      <prop><displayname>Work</displayname></prop>
      <status>HTTP/1.1 200 OK</status>
    </propstat>
  </response>
</multistatus>"#;

    #[test]
    fn parse_calendar_collections() {
        let calendars = parse_calendars(CALENDARS_XML, "1234567890").unwrap();
        assert_eq!(
            calendars,
            vec![
                CalendarCollection::new("home", "/1234567890/calendars/home/", "Home"),
                CalendarCollection::new("work", "/1234567890/calendars/work/", "Work"),
            ]
        );
    }

    #[test]
    fn collection_without_displayname_is_dropped() {
        let xml = r#"<multistatus>
  <response>
    <href>/1234567890/calendars/home/</href>
    <propstat><prop><displayname>Home</displayname></prop></propstat>
  </response>
  <response>
    <href>/1234567890/calendars/inbox/</href>
    <propstat><prop><resourcetype><collection/></resourcetype></prop></propstat>
  </response>
</multistatus>"#;
        let calendars = parse_calendars(xml, "1234567890").unwrap();
        assert_eq!(calendars.len(), 1);
        assert_eq!(calendars[0].id, "home");
    }

    #[test]
    fn single_response_is_handled_like_many() {
        let xml = r#"<multistatus><response>
  <href>/1234567890/calendars/solo/</href>
  <propstat><prop><displayname>Solo</displayname></prop></propstat>
</response></multistatus>"#;
        let calendars = parse_calendars(xml, "1234567890").unwrap();
        assert_eq!(calendars.len(), 1);
        assert_eq!(calendars[0].display_name, "Solo");
    }

    #[test]
    fn missing_multistatus_yields_nothing() {
        assert!(parse_calendars("<error/>", "1").unwrap().is_empty());
        assert!(parse_calendar_data("").unwrap().is_empty());
        assert!(parse_calendar_data("<multistatus/>").unwrap().is_empty());
    }

    #[test]
    fn malformed_xml_is_a_parse_error() {
        let err = parse_calendars("<multistatus><response></multistatus>", "1").unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ParseError);
        let err = parse_calendar_data("<multistatus>").unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ParseError);
    }

    #[test]
    fn parse_report_calendar_data() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<multistatus xmlns="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
  <response>
    <href>/1234567890/calendars/work/event1.ics</href>
    <propstat>
      <prop>
        <getetag>"abc123"</getetag>
        <C:calendar-data>BEGIN:VCALENDAR
VERSION:2.0
BEGIN:VEVENT
UID:event1@example.com
SUMMARY:Team Meeting
END:VEVENT
END:VCALENDAR
</C:calendar-data>
      </prop>
      <status>HTTP/1.1 200 OK</status>
    </propstat>
  </response>
  <response>
    <href>/1234567890/calendars/work/event2.ics</href>
    <propstat>
      <prop><getetag>"def456"</getetag></prop>
      <status>HTTP/1.1 200 OK</status>
    </propstat>
  </response>
</multistatus>"#;

        let objects = parse_calendar_data(xml).unwrap();
        assert_eq!(objects.len(), 1);
        let object = &objects[0];
        assert_eq!(
            object.href.as_deref(),
            Some("/1234567890/calendars/work/event1.ics")
        );
        assert_eq!(object.etag.as_deref(), Some("abc123"));
        assert!(object.data.starts_with("BEGIN:VCALENDAR\nVERSION:2.0"));
        assert!(object.data.ends_with("END:VCALENDAR"));
    }

    #[test]
    fn calendar_data_with_mixed_content() {
        let xml = r#"<multistatus><response><propstat><prop>
<calendar-data><![CDATA[BEGIN:VCALENDAR
END:VCALENDAR]]><x-note>ignored</x-note></calendar-data>
</prop></propstat></response></multistatus>"#;
        let objects = parse_calendar_data(xml).unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].data, "BEGIN:VCALENDAR\nEND:VCALENDAR");
        assert!(objects[0].href.is_none());
    }
}
