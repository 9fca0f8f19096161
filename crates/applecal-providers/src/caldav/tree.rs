//! Schema-less XML tree and path lookup.
//!
//! WebDAV servers disagree on which elements repeat, so the tree makes no
//! distinction between a single child and a list of same-named children:
//! [`XmlElement::children`] always yields a sequence of zero, one or many
//! nodes. Element names are stored without their namespace prefix
//! (`d:href` and `href` are the same key) and attributes are dropped.

use quick_xml::Reader;
use quick_xml::events::Event;
use serde_json::{Map, Value};
use tracing::trace;

use crate::error::{ProviderError, ProviderResult};

/// Key used for an element's own text when it also has child elements.
const TEXT_KEY: &str = "#text";

/// A node in the parsed tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    /// An element with no child elements, reduced to its trimmed text.
    Text(String),
    /// An element with child elements.
    Element(XmlElement),
}

/// An element that has child elements, possibly mixed with text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    children: Vec<(String, XmlNode)>,
    text: String,
}

impl XmlElement {
    /// All children with the given local name, in document order.
    pub fn children<'a, 'n>(&'a self, name: &'n str) -> impl Iterator<Item = &'a XmlNode> {
        self.children
            .iter()
            .filter(move |(key, _)| key == name)
            .map(|(_, node)| node)
    }

    /// The first child with the given local name.
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, node)| node)
    }

    /// Text directly inside this element, trimmed.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Serializes the subtree as JSON.
    ///
    /// Repeated names become arrays; mixed text is kept under `#text`.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (name, node) in &self.children {
            let value = node.to_json();
            match map.get_mut(name) {
                None => {
                    map.insert(name.clone(), value);
                }
                Some(Value::Array(items)) => items.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
            }
        }
        if !self.text.is_empty() {
            map.insert(TEXT_KEY.to_string(), Value::String(self.text.clone()));
        }
        Value::Object(map)
    }
}

impl XmlNode {
    /// Children of this node with the given name; empty for text nodes.
    pub fn children<'a, 'n>(&'a self, name: &'n str) -> impl Iterator<Item = &'a XmlNode> {
        self.as_element()
            .into_iter()
            .flat_map(move |element| element.children(name))
    }

    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.as_element().and_then(|element| element.child(name))
    }

    /// Text payload of the node, whichever shape it has.
    pub fn text_content(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Element(element) => element.text(),
        }
    }

    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            Self::Element(element) => Some(element),
            Self::Text(_) => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::Element(element) => element.to_json(),
        }
    }

    /// Leaf text as-is, anything else as serialized JSON.
    pub fn render(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Element(element) => element.to_json().to_string(),
        }
    }
}

/// A parsed XML document.
///
/// The root is a synthetic element whose children are the document's
/// top-level elements, so paths start with the document element name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlDocument {
    root: XmlElement,
}

/// An element that is still open while scanning.
struct OpenElement {
    name: String,
    element: XmlElement,
    has_children: bool,
}

impl OpenElement {
    fn new(name: String) -> Self {
        Self {
            name,
            element: XmlElement::default(),
            has_children: false,
        }
    }

    fn push_child(&mut self, name: String, node: XmlNode) {
        self.has_children = true;
        self.element.children.push((name, node));
    }

    fn close(mut self) -> (String, XmlNode) {
        let text = self.element.text.trim().to_string();
        let node = if self.has_children {
            self.element.text = text;
            XmlNode::Element(self.element)
        } else {
            XmlNode::Text(text)
        };
        (self.name, node)
    }
}

impl XmlDocument {
    /// Parses a document.
    ///
    /// An empty or whitespace-only input yields an empty document.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`](crate::ProviderErrorCode::ParseError) for
    /// malformed markup, mismatched or unclosed tags, bad entities, or
    /// text outside the document element.
    pub fn parse(xml: &str) -> ProviderResult<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().check_end_names = true;

        let mut stack: Vec<OpenElement> = vec![OpenElement::new(String::new())];

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    stack.push(OpenElement::new(name));
                }
                Event::Empty(e) => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    current(&mut stack)?.push_child(name, XmlNode::Text(String::new()));
                }
                Event::End(_) => {
                    if stack.len() < 2 {
                        return Err(ProviderError::parse(format!(
                            "unmatched end tag at byte {}",
                            reader.buffer_position()
                        )));
                    }
                    let open = stack.pop().ok_or_else(|| ProviderError::internal("empty stack"))?;
                    let (name, node) = open.close();
                    current(&mut stack)?.push_child(name, node);
                }
                Event::Text(e) => {
                    let text = e.unescape()?;
                    push_text(&mut stack, &text, reader.buffer_position())?;
                }
                Event::CData(e) => {
                    let text = String::from_utf8_lossy(&e).into_owned();
                    push_text(&mut stack, &text, reader.buffer_position())?;
                }
                Event::Eof => break,
                // Declarations, comments, processing instructions, doctype
                _ => {}
            }
        }

        if stack.len() > 1 {
            let open: Vec<_> = stack.iter().skip(1).map(|o| o.name.as_str()).collect();
            return Err(ProviderError::parse(format!(
                "unexpected end of document, unclosed elements: {}",
                open.join(" > ")
            )));
        }

        let root = stack
            .pop()
            .map(|open| open.element)
            .ok_or_else(|| ProviderError::internal("empty stack"))?;
        trace!(top_level = root.children.len(), "Parsed XML document");
        Ok(Self { root })
    }

    /// Resolves a path of element names from the root.
    ///
    /// At every step the working set is replaced by the union of the named
    /// children of all nodes in it. An empty working set ends the walk early
    /// with an empty result.
    pub fn select<'a>(&'a self, path: &[&str]) -> Vec<&'a XmlNode> {
        let Some((first, rest)) = path.split_first() else {
            return Vec::new();
        };
        let mut nodes: Vec<&XmlNode> = self.root.children(first).collect();
        for key in rest {
            if nodes.is_empty() {
                break;
            }
            nodes = nodes
                .into_iter()
                .flat_map(|node| node.children(key))
                .collect();
        }
        nodes
    }
}

fn current(stack: &mut [OpenElement]) -> ProviderResult<&mut OpenElement> {
    stack
        .last_mut()
        .ok_or_else(|| ProviderError::internal("XML element stack is empty"))
}

fn push_text(
    stack: &mut [OpenElement],
    text: &str,
    position: impl std::fmt::Display,
) -> ProviderResult<()> {
    if stack.len() < 2 {
        if text.trim().is_empty() {
            return Ok(());
        }
        return Err(ProviderError::parse(format!(
            "text outside of document element at byte {position}"
        )));
    }
    current(stack)?.element.text.push_str(text);
    Ok(())
}

/// Returns the values found at `path` in an XML document.
///
/// Leaf elements yield their text; elements with children yield their
/// subtree serialized as JSON. A path that does not exist yields an empty
/// vector.
///
/// # Errors
///
/// Returns a parse error if `xml` is not well-formed.
pub fn find_xml_values(xml: &str, path: &[&str]) -> ProviderResult<Vec<String>> {
    let document = XmlDocument::parse(xml)?;
    let values: Vec<String> = document
        .select(path)
        .into_iter()
        .map(XmlNode::render)
        .collect();
    trace!(path = %path.join("/"), count = values.len(), "Resolved XML path");
    Ok(values)
}
