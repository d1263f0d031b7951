//! Converter configuration

use indexmap::IndexSet;

use crate::xml::Config as ParserConfig;

/// Configuration for a [`Converter`](crate::Converter)
///
/// Read-only once the converter is built, so one converter can serve any number of
/// documents concurrently.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Child tags (cleaned names) to leave out; ignored while `include_only_tags` is active
    pub skip_tags: IndexSet<String>,
    /// When non-empty, the only child tags (cleaned names) kept
    pub include_only_tags: Option<IndexSet<String>>,
    /// Keep `{uri}` namespace designators in element and attribute names
    pub preserve_namespaces: bool,
    /// Emit attributes as `@name` keys
    pub include_attributes: bool,
    /// XML syntax parser limits
    pub parser: ParserConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            skip_tags: IndexSet::new(),
            include_only_tags: None,
            preserve_namespaces: false,
            include_attributes: true,
            parser: ParserConfig::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_skip_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_include_only_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_only_tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub const fn preserve_namespaces(mut self, preserve: bool) -> Self {
        self.preserve_namespaces = preserve;
        self
    }

    pub const fn include_attributes(mut self, include: bool) -> Self {
        self.include_attributes = include;
        self
    }

    /// Maximum element nesting depth (0 means unlimited)
    pub const fn with_max_depth(mut self, max_depth: u16) -> Self {
        self.parser.max_depth = max_depth;
        self
    }

    /// The include-only set, if it is active
    pub fn active_include_only(&self) -> Option<&IndexSet<String>> {
        self.include_only_tags.as_ref().filter(|tags| !tags.is_empty())
    }
}
