use std::sync::Arc;
use std::time::Instant;

use aidx::{Converter, Mapping};
use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use serde_json::json;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::ApiError;
use crate::{format_file_size, AppState, PARSER_VERSION};

const HEALTH_PROBE_XML: &str = r#"<?xml version="1.0"?><test>Hello</test>"#;

#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    success: bool,
    filename: String,
    original_size: usize,
    json_size: usize,
    processing_time_ms: f64,
    json_data: Mapping,
    metadata: Metadata,
}

#[derive(Debug, Serialize)]
pub struct Metadata {
    parser_version: &'static str,
    conversion_timestamp: String,
    file_info: SizeInfo,
    json_info: JsonInfo,
}

#[derive(Debug, Serialize)]
pub struct SizeInfo {
    name: String,
    size_bytes: usize,
    size_formatted: String,
}

#[derive(Debug, Serialize)]
pub struct JsonInfo {
    size_bytes: usize,
    size_formatted: String,
    line_count: usize,
}

struct Upload {
    filename: String,
    bytes: Vec<u8>,
}

fn timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

fn multipart_error(err: &MultipartError, max_content_length: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::warn!("upload rejected: body exceeds {max_content_length} bytes");
        ApiError::too_large(max_content_length)
    } else {
        ApiError::bad_request("Invalid upload", err.body_text())
    }
}

/// Pull the `file` field out of the form, ignoring any other fields
async fn read_upload(mut multipart: Multipart, max_content_length: usize) -> Result<Upload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| multipart_error(&err, max_content_length))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        if filename.is_empty() {
            tracing::warn!("no file selected");
            return Err(ApiError::bad_request(
                "No file selected",
                "Please select a valid XML file",
            ));
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|err| multipart_error(&err, max_content_length))?;
        return Ok(Upload {
            filename,
            bytes: bytes.to_vec(),
        });
    }

    tracing::warn!("no file uploaded in request");
    Err(no_file_uploaded())
}

fn no_file_uploaded() -> ApiError {
    ApiError::bad_request("No file uploaded", "Please select an XML file to convert")
}

fn has_xml_extension(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("xml"))
}

/// Cheap shape checks before the document is handed to the converter
fn validate_content(text: &str) -> Result<(), &'static str> {
    let text = text.trim_start_matches('\u{feff}').trim();
    if text.is_empty() {
        return Err("File is empty");
    }
    if !text.starts_with('<') {
        return Err("File does not appear to be valid XML");
    }
    Ok(())
}

pub async fn convert(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ConvertResponse>, ApiError> {
    let started = Instant::now();
    let max_content_length = state.config.max_content_length;

    let multipart = multipart.map_err(|err| {
        tracing::warn!(error = %err, "request is not a multipart upload");
        no_file_uploaded()
    })?;
    let Upload { filename, bytes } = read_upload(multipart, max_content_length).await?;

    if !has_xml_extension(&filename) {
        tracing::warn!("invalid file type: {filename}");
        return Err(ApiError::bad_request(
            "Invalid file type",
            "Only XML files are supported",
        ));
    }

    let original_size = bytes.len();
    let text = String::from_utf8(bytes).map_err(|_| {
        tracing::error!("failed to decode file: {filename}");
        ApiError::bad_request("File encoding error", "File must be UTF-8 encoded XML")
    })?;
    tracing::info!(
        "processing file: {filename} ({})",
        format_file_size(original_size)
    );

    if let Err(details) = validate_content(&text) {
        tracing::error!("xml validation failed for {filename}: {details}");
        return Err(ApiError::bad_request("XML validation failed", details));
    }

    let converter = Arc::clone(&state.converter);
    let result = tokio::task::spawn_blocking(move || converter.parse_str(&text))
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "conversion task failed for {filename}");
            ApiError::internal(format!("An unexpected error occurred: {err}"))
        })?;
    let json_data = result.map_err(|err| {
        tracing::error!(error = %err, category = err.category(), "conversion failed for {filename}");
        ApiError::conversion(&err, &filename)
    })?;

    let rendered = aidx::to_json(&json_data, 2)
        .map_err(|err| ApiError::conversion(&err, &filename))?;
    let json_size = rendered.len();
    let line_count = rendered.split('\n').count();

    let processing_time_ms = (started.elapsed().as_secs_f64() * 100_000.0).round() / 100.0;
    tracing::info!("converted {filename} in {processing_time_ms:.2}ms");

    Ok(Json(ConvertResponse {
        success: true,
        original_size,
        json_size,
        processing_time_ms,
        json_data,
        metadata: Metadata {
            parser_version: PARSER_VERSION,
            conversion_timestamp: timestamp(),
            file_info: SizeInfo {
                name: filename.clone(),
                size_bytes: original_size,
                size_formatted: format_file_size(original_size),
            },
            json_info: JsonInfo {
                size_bytes: json_size,
                size_formatted: format_file_size(json_size),
                line_count,
            },
        },
        filename,
    }))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match probe(&state.converter) {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "timestamp": timestamp(),
                "version": PARSER_VERSION,
                "parser_status": "operational",
            })),
        ),
        Err(err) => {
            tracing::error!(error = %err, "health check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "status": "unhealthy",
                    "timestamp": timestamp(),
                    "error": err.to_string(),
                })),
            )
        }
    }
}

fn probe(converter: &Converter) -> aidx::Result<()> {
    converter.parse_str(HEALTH_PROBE_XML).map(|_| ())
}

pub async fn info(State(state): State<AppState>) -> Json<serde_json::Value> {
    let parser = state.converter.config();
    let include_only: Option<Vec<&str>> = parser
        .active_include_only()
        .map(|tags| tags.iter().map(String::as_str).collect());

    Json(json!({
        "name": "AIDX XML to JSON Converter API",
        "version": PARSER_VERSION,
        "description": "Convert AIDX XML files to JSON format",
        "endpoints": {
            "/convert": "Convert XML file to JSON (POST)",
            "/health": "Health check endpoint",
            "/api/info": "API information",
        },
        "supported_formats": ["xml"],
        "max_file_size": format_file_size(state.config.max_content_length),
        "parser_config": {
            "skip_tags": parser.skip_tags.iter().collect::<Vec<_>>(),
            "include_only_tags": include_only,
            "include_attributes": parser.include_attributes,
            "preserve_namespaces": parser.preserve_namespaces,
            "max_depth": parser.parser.max_depth,
        },
    }))
}

pub async fn not_found() -> ApiError {
    ApiError::new(
        StatusCode::NOT_FOUND,
        "Not found",
        "The requested resource was not found",
    )
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::new(
        StatusCode::METHOD_NOT_ALLOWED,
        "Method not allowed",
        "The requested method is not allowed for this endpoint",
    )
}
