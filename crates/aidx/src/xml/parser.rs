//! XML parser implementation

use indexmap::IndexMap;

use crate::error::{Error, ErrorKind, Pos, Result, Span};
use crate::xml::cursor::Cursor;
use crate::xml::model::{Content, Document, Element};

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Default element nesting limit; deep enough for AIDX, shallow enough for a 2 MiB stack
pub const DEFAULT_MAX_DEPTH: u16 = 256;

/// Configuration for the XML parser
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Maximum element nesting depth (0 means unlimited)
    pub max_depth: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Config {
    /// Create a config with unlimited depth
    pub const fn unlimited() -> Self {
        Self { max_depth: 0 }
    }

    pub const fn new(max_depth: u16) -> Self {
        Self { max_depth }
    }
}

/// Attribute as written in the start tag, before namespace resolution
#[derive(Debug)]
struct RawAttribute {
    name: String,
    value: String,
    pos: Pos,
}

/// Namespace-aware XML parser
///
/// Element and attribute names come out in Clark notation once their prefix (or the
/// default namespace) has been resolved against the in-scope `xmlns` declarations.
#[derive(Debug)]
pub struct Parser<'a> {
    cursor: Cursor<'a>,
    config: Config,
    depth: u16,
    /// In-scope (prefix, uri) bindings; the empty prefix is the default namespace
    bindings: Vec<(String, String)>,
}

impl<'a> Parser<'a> {
    /// Create a new XML parser with default configuration
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_config(input, Config::default())
    }

    /// Create a new XML parser with custom configuration
    pub fn with_config(input: &'a [u8], config: Config) -> Self {
        let input = input.strip_prefix(UTF8_BOM).unwrap_or(input);
        Self {
            cursor: Cursor::new(input),
            config,
            depth: 0,
            bindings: vec![("xml".to_string(), XML_NAMESPACE.to_string())],
        }
    }

    /// Parse an XML document
    pub fn parse(&mut self) -> Result<Document> {
        self.skip_misc(true)?;
        if self.cursor.is_eof() {
            return Err(self.error_here("no element found"));
        }

        let root = self.parse_element()?;

        self.skip_misc(false)?;
        if !self.cursor.is_eof() {
            return Err(self.error_here("junk after document element"));
        }

        Ok(Document { root })
    }

    /// Skip whitespace, comments and processing instructions around the root element
    fn skip_misc(&mut self, prolog: bool) -> Result<()> {
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.starts_with(b"<?") {
                self.cursor.advance_by(2);
                self.skip_until(b"?>")?;
            } else if self.cursor.starts_with(b"<!--") {
                self.cursor.advance_by(4);
                self.skip_until(b"-->")?;
            } else if prolog && self.cursor.starts_with(b"<!DOCTYPE") {
                self.skip_doctype()?;
            } else {
                return Ok(());
            }
        }
    }

    fn parse_element(&mut self) -> Result<Element> {
        let start = self.cursor.position();
        self.expect_byte(b'<')?;

        self.depth = self.depth.saturating_add(1);
        if self.config.max_depth != 0 && self.depth > self.config.max_depth {
            return Err(Error::with_message(
                ErrorKind::MaxDepthExceeded {
                    max: self.config.max_depth,
                },
                Span::at(start),
                format!("max depth exceeded: {}", self.config.max_depth),
            ));
        }

        let raw_name = self.parse_name()?;
        let raw_attributes = self.parse_attributes()?;

        let scope_mark = self.bindings.len();
        let attributes = self.bind_attributes(raw_attributes)?;
        let name = self.resolve_name(&raw_name, true, start)?;

        let mut element = Element {
            name,
            attributes,
            children: Vec::new(),
        };

        if self.cursor.consume(b'/') {
            self.expect_byte(b'>')?;
        } else {
            self.expect_byte(b'>')?;
            self.parse_content(&raw_name, &mut element.children)?;
        }

        self.bindings.truncate(scope_mark);
        self.depth = self.depth.saturating_sub(1);
        Ok(element)
    }

    fn parse_content(&mut self, open_name: &str, children: &mut Vec<Content>) -> Result<()> {
        loop {
            if self.cursor.starts_with(b"</") {
                let pos = self.cursor.position();
                self.cursor.advance_by(2);
                let close_name = self.parse_name()?;
                if close_name != open_name {
                    return Err(Error::syntax_at(
                        pos,
                        format!("mismatched tag: expected </{open_name}>, found </{close_name}>"),
                    ));
                }
                self.cursor.skip_whitespace();
                return self.expect_byte(b'>');
            }

            if self.cursor.starts_with(b"<!--") {
                self.cursor.advance_by(4);
                self.skip_until(b"-->")?;
                continue;
            }

            if self.cursor.starts_with(b"<![CDATA[") {
                self.cursor.advance_by(9);
                let start = self.cursor.pos();
                self.skip_until(b"]]>")?;
                let raw = self.cursor.slice_from(start);
                let raw = raw.get(..raw.len().saturating_sub(3)).unwrap_or_default();
                push_text(children, &bytes_to_string(raw, self.cursor.position())?);
                continue;
            }

            if self.cursor.starts_with(b"<?") {
                self.cursor.advance_by(2);
                self.skip_until(b"?>")?;
                continue;
            }

            if self.cursor.starts_with(b"<!") {
                return Err(self.error_here("unexpected markup declaration in content"));
            }

            if self.cursor.current() == Some(b'<') {
                let child = self.parse_element()?;
                children.push(Content::Element(child));
                continue;
            }

            if self.cursor.is_eof() {
                return Err(self.error_here(&format!("unclosed element <{open_name}>")));
            }

            let text = self.parse_text()?;
            push_text(children, &text);
        }
    }

    fn parse_attributes(&mut self) -> Result<Vec<RawAttribute>> {
        let mut attrs: Vec<RawAttribute> = Vec::new();

        loop {
            let had_space = matches!(self.cursor.current(), Some(b' ' | b'\t' | b'\r' | b'\n'));
            self.cursor.skip_whitespace();
            match self.cursor.current() {
                Some(b'/' | b'>') => break,
                Some(_) if !had_space => {
                    return Err(self.error_here("expected whitespace before attribute"));
                }
                Some(_) => {}
                None => return Err(self.error_here("unexpected end of input")),
            }

            let pos = self.cursor.position();
            let name = self.parse_name()?;
            self.cursor.skip_whitespace();
            self.expect_byte(b'=')?;
            self.cursor.skip_whitespace();
            let value = self.parse_attribute_value()?;

            if attrs.iter().any(|attr| attr.name == name) {
                return Err(Error::syntax_at(pos, format!("duplicate attribute: {name}")));
            }
            attrs.push(RawAttribute { name, value, pos });
        }

        Ok(attrs)
    }

    /// Register `xmlns` declarations, then resolve the remaining attribute names
    fn bind_attributes(&mut self, raw: Vec<RawAttribute>) -> Result<IndexMap<String, String>> {
        let mut plain = Vec::with_capacity(raw.len());
        for attr in raw {
            if attr.name == "xmlns" {
                self.bindings.push((String::new(), attr.value));
            } else if let Some(prefix) = attr.name.strip_prefix("xmlns:") {
                if prefix.is_empty() {
                    return Err(Error::syntax_at(
                        attr.pos,
                        "invalid namespace declaration: xmlns:",
                    ));
                }
                if attr.value.is_empty() {
                    return Err(Error::syntax_at(
                        attr.pos,
                        format!("cannot undeclare namespace prefix: {prefix}"),
                    ));
                }
                self.bindings.push((prefix.to_string(), attr.value));
            } else {
                plain.push(attr);
            }
        }

        let mut attributes = IndexMap::with_capacity(plain.len());
        for attr in plain {
            let name = self.resolve_name(&attr.name, false, attr.pos)?;
            if attributes.contains_key(&name) {
                return Err(Error::syntax_at(
                    attr.pos,
                    format!("duplicate attribute: {name}"),
                ));
            }
            attributes.insert(name, attr.value);
        }
        Ok(attributes)
    }

    /// Turn a qualified name into Clark notation.
    ///
    /// Unprefixed attributes never take the default namespace.
    fn resolve_name(&self, qname: &str, is_element: bool, pos: Pos) -> Result<String> {
        let (prefix, local) = match qname.split_once(':') {
            Some((prefix, local)) => {
                if prefix.is_empty() || local.is_empty() || local.contains(':') {
                    return Err(Error::syntax_at(pos, format!("invalid qualified name: {qname}")));
                }
                (prefix, local)
            }
            None if is_element => ("", qname),
            None => return Ok(qname.to_string()),
        };

        match self.lookup(prefix) {
            Some(uri) if !uri.is_empty() => Ok(format!("{{{uri}}}{local}")),
            Some(_) | None if prefix.is_empty() => Ok(local.to_string()),
            _ => Err(Error::syntax_at(pos, format!("unbound prefix: {prefix}"))),
        }
    }

    fn lookup(&self, prefix: &str) -> Option<&str> {
        self.bindings
            .iter()
            .rev()
            .find(|(bound, _)| bound == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    fn parse_attribute_value(&mut self) -> Result<String> {
        let quote = match self.cursor.current() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => return Err(self.error_here("expected quoted attribute value")),
        };
        self.cursor.advance();

        let start_pos = self.cursor.position();
        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == quote {
                let raw = self.cursor.slice_from(start);
                self.cursor.advance();
                let text = bytes_to_string(raw, start_pos)?;
                let normalized: String = text
                    .chars()
                    .map(|ch| if matches!(ch, '\t' | '\n' | '\r') { ' ' } else { ch })
                    .collect();
                return decode_entities(&normalized, start_pos);
            }
            if b == b'<' {
                return Err(self.error_here("'<' not allowed in attribute value"));
            }
            self.cursor.advance();
        }

        Err(self.error_here("unterminated attribute value"))
    }

    fn parse_text(&mut self) -> Result<String> {
        let start_pos = self.cursor.position();
        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == b'<' {
                break;
            }
            self.cursor.advance();
        }

        let raw = self.cursor.slice_from(start);
        if raw.windows(3).any(|w| w == b"]]>") {
            return Err(Error::syntax_at(start_pos, "']]>' not allowed in character data"));
        }
        let text = bytes_to_string(raw, start_pos)?;
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        decode_entities(&text, start_pos)
    }

    fn parse_name(&mut self) -> Result<String> {
        let start_pos = self.cursor.position();
        let start = self.cursor.pos();

        match self.cursor.current() {
            Some(first) if is_name_start(first) => self.cursor.advance(),
            Some(_) => return Err(Error::syntax_at(start_pos, "not well-formed (invalid token)")),
            None => return Err(self.error_here("expected name")),
        }

        while let Some(b) = self.cursor.current() {
            if is_name_char(b) {
                self.cursor.advance();
            } else {
                break;
            }
        }

        bytes_to_string(self.cursor.slice_from(start), start_pos)
    }

    fn skip_doctype(&mut self) -> Result<()> {
        // internal subset may itself contain '>' inside brackets; literals may hold anything
        let mut in_subset = false;
        let mut quote = None;
        while let Some(b) = self.cursor.current() {
            if let Some(q) = quote {
                self.cursor.advance();
                if b == q {
                    quote = None;
                }
                continue;
            }
            if in_subset && self.cursor.starts_with(b"<!--") {
                self.cursor.advance_by(4);
                self.skip_until(b"-->")?;
                continue;
            }
            if in_subset && self.cursor.starts_with(b"<?") {
                self.cursor.advance_by(2);
                self.skip_until(b"?>")?;
                continue;
            }
            self.cursor.advance();
            match b {
                b'"' | b'\'' => quote = Some(b),
                b'[' => in_subset = true,
                b']' => in_subset = false,
                b'>' if !in_subset => return Ok(()),
                _ => {}
            }
        }
        Err(self.error_here("unterminated doctype"))
    }

    fn skip_until(&mut self, pattern: &[u8]) -> Result<()> {
        while !self.cursor.is_eof() {
            if self.cursor.starts_with(pattern) {
                self.cursor.advance_by(pattern.len());
                return Ok(());
            }
            self.cursor.advance();
        }
        Err(self.error_here("unclosed token"))
    }

    fn expect_byte(&mut self, expected: u8) -> Result<()> {
        if self.cursor.consume(expected) {
            Ok(())
        } else if self.cursor.is_eof() {
            Err(self.error_here("unexpected end of input"))
        } else {
            Err(self.error_here("not well-formed (invalid token)"))
        }
    }

    fn error_here(&self, message: &str) -> Error {
        Error::syntax_at(self.cursor.position(), message)
    }
}

/// Append text, joining it with a directly preceding text run
fn push_text(children: &mut Vec<Content>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Content::Text(last)) = children.last_mut() {
        last.push_str(text);
    } else {
        children.push(Content::Text(text.to_string()));
    }
}

fn bytes_to_string(bytes: &[u8], pos: Pos) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| Error::syntax_at(pos, "invalid utf-8"))
}

fn is_name_start(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

fn is_name_char(b: u8) -> bool {
    is_name_start(b) || matches!(b, b'0'..=b'9' | b'-' | b'.')
}

fn decode_entities(input: &str, pos: Pos) -> Result<String> {
    if !input.contains('&') {
        return Ok(input.to_string());
    }

    let mut result = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        result.push_str(rest.get(..amp).unwrap_or_default());
        let after = rest.get(amp + 1..).unwrap_or_default();
        let Some(semi) = after.find(';') else {
            return Err(Error::syntax_at(pos, "unterminated entity reference"));
        };
        let entity = after.get(..semi).unwrap_or_default();

        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => decode_numeric_entity(entity),
        };

        match decoded {
            Some(ch) => result.push(ch),
            None => {
                return Err(Error::syntax_at(
                    pos,
                    format!("undefined entity: &{entity};"),
                ));
            }
        }
        rest = after.get(semi + 1..).unwrap_or_default();
    }
    result.push_str(rest);

    Ok(result)
}

fn decode_numeric_entity(entity: &str) -> Option<char> {
    let code = if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok()?
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok()?
    } else {
        return None;
    };
    char::from_u32(code).filter(|&ch| is_xml_char(ch))
}

/// The `Char` production: no C0 controls besides tab, LF and CR, and no U+FFFE/U+FFFF
fn is_xml_char(ch: char) -> bool {
    matches!(ch, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}')
        || ch >= '\u{10000}'
}
