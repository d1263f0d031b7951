use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// JSON error reply: `{error, details, filename?, category?}`
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    status: StatusCode,
    error: &'static str,
    details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'static str>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: &'static str, details: impl Into<String>) -> Self {
        Self {
            status,
            error,
            details: details.into(),
            filename: None,
            category: None,
        }
    }

    pub fn bad_request(error: &'static str, details: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error, details)
    }

    pub fn too_large(max_content_length: usize) -> Self {
        Self::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            "File too large",
            format!(
                "Maximum file size is {}",
                crate::format_file_size(max_content_length)
            ),
        )
    }

    /// Map a converter failure: bad input is 422, anything else 500
    pub fn conversion(err: &aidx::Error, filename: &str) -> Self {
        let base = if err.is_input_error() {
            Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "AIDX parsing failed",
                err.to_string(),
            )
        } else {
            Self::internal(format!("An unexpected error occurred: {err}"))
        };
        Self {
            filename: Some(filename.to_string()),
            category: Some(err.category()),
            ..base
        }
    }

    pub fn internal(details: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Conversion failed",
            details,
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}
