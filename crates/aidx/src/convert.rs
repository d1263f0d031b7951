//! XML tree to canonical value conversion

use std::path::Path;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::config::Config;
use crate::error::{Error, ErrorKind, Result, Span};
use crate::input::read_document;
use crate::tag::{TagFilter, TagNameResolver};
use crate::value::{List, Mapping, Value};
use crate::xml::{Element, Parser};

/// Key holding an element's own text when it also has attributes or children
pub const TEXT_KEY: &str = "#text";
/// Prefix marking attribute keys
pub const ATTRIBUTE_PREFIX: char = '@';

/// Configured XML to canonical value converter
///
/// Immutable after construction; share it freely between threads.
#[derive(Clone, Debug, Default)]
pub struct Converter {
    config: Config,
}

impl Converter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        debug!(
            skip_tags = ?config.skip_tags,
            include_only_tags = ?config.include_only_tags,
            preserve_namespaces = config.preserve_namespaces,
            include_attributes = config.include_attributes,
            "converter initialized"
        );
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    const fn resolver(&self) -> TagNameResolver {
        TagNameResolver::new(self.config.preserve_namespaces)
    }

    /// Parse XML text into `{root_tag: value}`
    pub fn parse_str(&self, xml: &str) -> Result<Mapping> {
        if xml.trim().is_empty() {
            return Err(Error::new(ErrorKind::EmptyInput, Span::empty()));
        }

        let document = Parser::with_config(xml.as_bytes(), self.config.parser)
            .parse()
            .map_err(|err| {
                debug!(error = %err, "failed to parse xml");
                wrap_parse_error(err)
            })?;

        debug!(root = %document.root.name, "parsed xml document");
        let root_name = self.resolver().clean(&document.root.name).to_string();
        let mut result = Mapping::with_capacity(1);
        result.insert(root_name, self.convert(&document.root));
        Ok(result)
    }

    /// Read a UTF-8 XML file and parse it
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<Mapping> {
        let path = path.as_ref();
        let content = read_document(path)?;
        debug!(path = %path.display(), bytes = content.len(), "read xml file");
        self.parse_str(&content)
    }

    /// Convert one element; total for any well-formed tree
    pub fn convert(&self, element: &Element) -> Value {
        let resolver = self.resolver();
        let filter = TagFilter::new(&self.config);
        let mut result = Mapping::new();

        if self.config.include_attributes {
            for (name, value) in &element.attributes {
                let key = format!("{ATTRIBUTE_PREFIX}{}", resolver.clean(name));
                result.insert(key, value.as_str());
            }
        }

        let text = element
            .leading_text()
            .map(str::trim)
            .filter(|text| !text.is_empty());

        let mut groups: IndexMap<&str, Vec<Value>> = IndexMap::new();
        for child in element.elements() {
            if !filter.allow(&child.name) {
                trace!(tag = %child.name, "skipping filtered element");
                continue;
            }
            let value = self.convert(child);
            groups
                .entry(resolver.clean(&child.name))
                .or_default()
                .push(value);
        }

        for (tag, values) in groups {
            let value = match <[Value; 1]>::try_from(values) {
                Ok([only]) => only,
                Err(values) => Value::List(List::from(values)),
            };
            result.insert(tag, value);
        }

        finish(result, text)
    }
}

/// Resolve the final shape of a converted element
fn finish(mut result: Mapping, text: Option<&str>) -> Value {
    match text {
        Some(text) if result.is_empty() => Value::from(text),
        Some(text) => {
            result.insert(TEXT_KEY, text);
            Value::Mapping(result)
        }
        None if result.is_empty() => Value::default(),
        None if result.len() == 1 && result.contains_key(TEXT_KEY) => {
            result.remove(TEXT_KEY).unwrap_or_default()
        }
        None => Value::Mapping(result),
    }
}

/// Keep the parser's kind and position, prefixing the message the way callers see it
fn wrap_parse_error(err: Error) -> Error {
    let message = format!("failed to parse xml: {}", err.message());
    Error::with_message(err.kind().clone(), err.span(), message)
}
