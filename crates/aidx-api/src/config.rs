use std::env;

use aidx::Config;

pub const DEFAULT_MAX_CONTENT_LENGTH: usize = 16 * 1024 * 1024;

/// Service settings, read once at startup
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on the request body, in bytes
    pub max_content_length: usize,
    pub skip_tags: Vec<String>,
    pub include_only_tags: Vec<String>,
    pub preserve_namespaces: bool,
    pub include_attributes: bool,
    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
            skip_tags: vec!["TPA_Extension".to_string()],
            include_only_tags: Vec::new(),
            preserve_namespaces: false,
            include_attributes: true,
            cors_origins: vec!["*".to_string()],
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let host = lookup("AIDX_HOST").unwrap_or(defaults.host);
        let port = parse_or("AIDX_PORT", lookup("AIDX_PORT"), defaults.port);
        let max_content_length = parse_or(
            "AIDX_MAX_CONTENT_LENGTH",
            lookup("AIDX_MAX_CONTENT_LENGTH"),
            defaults.max_content_length,
        );
        let skip_tags = lookup("AIDX_SKIP_TAGS").map_or(defaults.skip_tags, |v| split_list(&v));
        let include_only_tags = lookup("AIDX_INCLUDE_ONLY_TAGS")
            .map_or(defaults.include_only_tags, |v| split_list(&v));
        let preserve_namespaces = bool_or(
            "AIDX_PRESERVE_NAMESPACES",
            lookup("AIDX_PRESERVE_NAMESPACES"),
            defaults.preserve_namespaces,
        );
        let include_attributes = bool_or(
            "AIDX_INCLUDE_ATTRIBUTES",
            lookup("AIDX_INCLUDE_ATTRIBUTES"),
            defaults.include_attributes,
        );
        let cors_origins =
            lookup("AIDX_CORS_ORIGINS").map_or(defaults.cors_origins, |v| split_list(&v));

        Self {
            host,
            port,
            max_content_length,
            skip_tags,
            include_only_tags,
            preserve_namespaces,
            include_attributes,
            cors_origins,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|origin| origin == "*")
    }

    /// Converter settings shared by every request
    pub fn converter_config(&self) -> Config {
        let config = Config::new()
            .with_skip_tags(&self.skip_tags)
            .preserve_namespaces(self.preserve_namespaces)
            .include_attributes(self.include_attributes);
        if self.include_only_tags.is_empty() {
            config
        } else {
            config.with_include_only_tags(&self.include_only_tags)
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

fn parse_or<T: std::str::FromStr>(key: &str, value: Option<String>, default: T) -> T {
    match value {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("{key}={raw:?} is not valid, using the default");
            default
        }),
    }
}

fn bool_or(key: &str, value: Option<String>, default: bool) -> bool {
    let Some(raw) = value else {
        return default;
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" => false,
        _ => {
            tracing::warn!("{key}={raw:?} is not a boolean, using {default}");
            default
        }
    }
}
