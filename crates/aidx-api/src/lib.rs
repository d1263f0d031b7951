//! HTTP upload service for the aidx converter
//!
//! `POST /convert` takes a multipart `file` field holding an AIDX XML document and
//! answers with the canonical JSON plus size and timing metadata.

#![forbid(unsafe_code)]

use std::sync::Arc;

use aidx::Converter;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
mod handlers;

pub use config::ApiConfig;
pub use error::ApiError;

/// Reported as `version` by `/health` and `/api/info`
pub const PARSER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone)]
pub struct AppState {
    pub converter: Arc<Converter>,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            converter: Arc::new(Converter::with_config(config.converter_config())),
            config: Arc::new(config),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_content_length;
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/convert", post(handlers::convert))
        .route("/health", get(handlers::health))
        .route("/api/info", get(handlers::info))
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);
    if config.allows_any_origin() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("ignoring invalid CORS origin {origin:?}");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

/// Human-readable byte count: `0 B`, `512.0 B`, `1.5 KB`, up to `GB`
pub fn format_file_size(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    #[allow(clippy::cast_precision_loss)]
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{size:.1} {}", UNITS.get(unit).copied().unwrap_or("GB"))
}
