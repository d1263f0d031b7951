//! Tag name cleaning and child filtering

use crate::config::Config;

/// Strips the leading `{namespace-uri}` designator from Clark-notation names
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TagNameResolver {
    preserve_namespaces: bool,
}

impl TagNameResolver {
    pub const fn new(preserve_namespaces: bool) -> Self {
        Self {
            preserve_namespaces,
        }
    }

    /// Clean an element or attribute name; total, never fails
    pub fn clean<'a>(self, raw: &'a str) -> &'a str {
        if self.preserve_namespaces {
            return raw;
        }
        raw.strip_prefix('{')
            .and_then(|rest| rest.split_once('}'))
            .map_or(raw, |(_, local)| local)
    }
}

/// Decides whether a child element is converted
///
/// An active include-only set takes exclusive precedence over the skip set.
#[derive(Clone, Copy, Debug)]
pub struct TagFilter<'a> {
    resolver: TagNameResolver,
    config: &'a Config,
}

impl<'a> TagFilter<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            resolver: TagNameResolver::new(config.preserve_namespaces),
            config,
        }
    }

    pub fn allow(&self, raw_name: &str) -> bool {
        let name = self.resolver.clean(raw_name);
        if let Some(include) = self.config.active_include_only() {
            return include.contains(name);
        }
        if !self.config.skip_tags.is_empty() {
            return !self.config.skip_tags.contains(name);
        }
        true
    }
}
