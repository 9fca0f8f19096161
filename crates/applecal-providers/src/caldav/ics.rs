//! iCalendar (RFC 5545) text decoding.
//!
//! This is a deliberately flat reading of iCalendar: every `BEGIN:`/`END:`
//! pair becomes an [`IcsBlock`] holding a `lowercase name -> value` mapping.
//! Parameters are recorded separately and never leak into the property name.
//! Values are unescaped but otherwise kept verbatim; date-times stay in
//! their textual form.

use std::collections::BTreeMap;

use tracing::{trace, warn};

/// Component type of calendar events.
pub const VEVENT: &str = "VEVENT";

/// One parsed content line: `NAME;PARAM=VALUE:value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLine {
    /// Lowercased property name.
    pub name: String,
    /// Parameters in order, names uppercased, quotes removed.
    pub params: Vec<(String, String)>,
    /// Unescaped value.
    pub value: String,
}

/// A component block such as `VEVENT` or `VALARM`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcsBlock {
    key: usize,
    kind: String,
    parent: Option<usize>,
    properties: BTreeMap<String, String>,
    parameters: BTreeMap<String, Vec<(String, String)>>,
    closed: bool,
}

impl IcsBlock {
    fn new(key: usize, kind: String, parent: Option<usize>) -> Self {
        Self {
            key,
            kind,
            parent,
            properties: BTreeMap::new(),
            parameters: BTreeMap::new(),
            closed: false,
        }
    }

    /// Synthetic key, unique within the document (opening order).
    pub fn key(&self) -> usize {
        self.key
    }

    /// Component type, uppercased (`VEVENT`, `VTODO`, ...).
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Key of the enclosing block, if any.
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// Whether a matching `END:` line was seen.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Properties keyed by lowercase name. A repeated property keeps its
    /// last value.
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// Parameters of a property (`TZID`, `VALUE`, ...).
    pub fn parameters(&self, name: &str) -> &[(String, String)] {
        self.parameters.get(name).map_or(&[], Vec::as_slice)
    }

    /// Returns the value of one parameter of a property.
    pub fn parameter(&self, name: &str, param: &str) -> Option<&str> {
        self.parameters(name)
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(param))
            .map(|(_, value)| value.as_str())
    }

    fn set(&mut self, line: ContentLine) {
        if line.params.is_empty() {
            self.parameters.remove(&line.name);
        } else {
            self.parameters.insert(line.name.clone(), line.params);
        }
        self.properties.insert(line.name, line.value);
    }
}

/// A decoded iCalendar document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IcsDocument {
    blocks: Vec<IcsBlock>,
}

impl IcsDocument {
    /// Parses iCalendar text. Never fails: lines that cannot be read are
    /// skipped and unclosed blocks are kept as they are at end of input.
    pub fn parse(text: &str) -> Self {
        Self::from_logical_lines(unfold_lines(text))
    }

    /// Builds a document from lines that are already unfolded.
    pub fn from_logical_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut blocks: Vec<IcsBlock> = Vec::new();
        let mut open: Vec<usize> = Vec::new();

        for line in lines {
            let line = line.as_ref();
            if line.trim().is_empty() {
                continue;
            }
            let Some(content) = parse_content_line(line) else {
                let name: String = line
                    .chars()
                    .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
                    .collect();
                warn!(name = %name, len = line.len(), "Skipping iCalendar line without a value");
                trace!(line = %line, "Skipped line");
                continue;
            };

            match content.name.as_str() {
                "begin" => {
                    let key = blocks.len();
                    let kind = content.value.trim().to_ascii_uppercase();
                    blocks.push(IcsBlock::new(key, kind, open.last().copied()));
                    open.push(key);
                }
                "end" => {
                    let kind = content.value.trim();
                    match open.iter().rposition(|&key| blocks[key].kind.eq_ignore_ascii_case(kind)) {
                        Some(depth) => {
                            for key in open.drain(depth..) {
                                if let Some(block) = blocks.get_mut(key) {
                                    block.closed = true;
                                }
                            }
                        }
                        None => warn!(kind = %kind, "Ignoring END without matching BEGIN"),
                    }
                }
                _ => match open.last().and_then(|&key| blocks.get_mut(key)) {
                    Some(block) => block.set(content),
                    None => trace!(name = %content.name, "Ignoring property outside of any block"),
                },
            }
        }

        if !open.is_empty() {
            trace!(unclosed = open.len(), "iCalendar input ended with open blocks");
        }

        Self { blocks }
    }

    /// All blocks in opening order.
    pub fn blocks(&self) -> &[IcsBlock] {
        &self.blocks
    }

    pub fn block(&self, key: usize) -> Option<&IcsBlock> {
        self.blocks.get(key)
    }

    /// Blocks of the given component type, in order.
    pub fn blocks_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a IcsBlock> {
        self.blocks
            .iter()
            .filter(move |block| block.kind.eq_ignore_ascii_case(kind))
    }

    /// The `VEVENT` blocks, in order.
    pub fn events(&self) -> impl Iterator<Item = &IcsBlock> {
        self.blocks_of(VEVENT)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Joins folded lines.
///
/// A physical line starting with a space or tab continues the previous
/// logical line; the leading whitespace character is dropped and nothing is
/// inserted in its place. CRLF and LF line endings are both accepted.
pub fn unfold_lines(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in text.split('\n') {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        match (raw.strip_prefix([' ', '\t']), lines.last_mut()) {
            (Some(rest), Some(previous)) => previous.push_str(rest),
            (Some(rest), None) => lines.push(rest.to_string()),
            (None, _) => lines.push(raw.to_string()),
        }
    }
    lines
}

/// Splits a logical line into name, parameters and value.
///
/// Returns `None` if the line has no name or no `:` at all. A `:` inside
/// quoted parameter values is skipped unless the quotes never close.
pub fn parse_content_line(line: &str) -> Option<ContentLine> {
    let mut in_quotes = false;
    let mut colon = None;
    for (idx, ch) in line.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ':' if !in_quotes => {
                colon = Some(idx);
                break;
            }
            _ => {}
        }
    }
    // An unbalanced quote hides every colon; fall back to the first one.
    let colon = colon.or_else(|| line.find(':'))?;
    let head = &line[..colon];
    let value = &line[colon + 1..];

    let mut parts = split_unquoted(head, ';').into_iter();
    let name = parts.next()?.trim();
    if name.is_empty() {
        return None;
    }

    let params = parts
        .filter_map(|param| {
            let (key, value) = param.split_once('=')?;
            Some((
                key.trim().to_ascii_uppercase(),
                value.trim().trim_matches('"').to_string(),
            ))
        })
        .collect();

    Some(ContentLine {
        name: name.to_ascii_lowercase(),
        params,
        value: unescape_text(value),
    })
}

fn split_unquoted(s: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (idx, ch) in s.char_indices() {
        if ch == '"' {
            in_quotes = !in_quotes;
        } else if ch == separator && !in_quotes {
            parts.push(&s[start..idx]);
            start = idx + ch.len_utf8();
        }
    }
    parts.push(&s[start..]);
    parts
}

/// Resolves iCalendar text escapes: `\n`/`\N`, `\,`, `\;` and `\\`.
///
/// Unknown escapes are kept as written.
pub fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => out.push('\n'),
            Some(c @ (',' | ';' | '\\')) => out.push(c),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
