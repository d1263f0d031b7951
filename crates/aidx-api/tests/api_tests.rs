#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use aidx_api::{router, ApiConfig, AppState};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

const BOUNDARY: &str = "aidx-test-boundary";

const FLIGHT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Flight>
  <Airline CodeContext="IATA">JQ</Airline>
  <Num>255</Num>
  <TPA_Extension><FunctionalID>FL-0001</FunctionalID></TPA_Extension>
</Flight>"#;

fn app() -> Router {
    router(AppState::new(ApiConfig::default()))
}

fn app_with(config: ApiConfig) -> Router {
    router(AppState::new(config))
}

/// One-part multipart body; `filename: None` sends a plain form field
fn multipart_body(field: &str, filename: Option<&str>, content: &[u8]) -> Vec<u8> {
    let disposition = match filename {
        Some(name) => format!("form-data; name=\"{field}\"; filename=\"{name}\""),
        None => format!("form-data; name=\"{field}\""),
    };
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: {disposition}\r\nContent-Type: application/xml\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/convert")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request")
}

fn upload_file(filename: &str, content: &[u8]) -> Request<Body> {
    upload(multipart_body("file", Some(filename), content))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let body = serde_json::from_slice(&bytes).expect("json body");
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

#[tokio::test]
async fn convert_returns_canonical_json_and_metadata() {
    let (status, body) = send(app(), upload_file("flight.xml", FLIGHT_XML.as_bytes())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["filename"], json!("flight.xml"));
    assert_eq!(body["original_size"], json!(FLIGHT_XML.len()));
    // TPA_Extension is skipped by default
    assert_eq!(
        body["json_data"],
        json!({"Flight": {"Airline": {"@CodeContext": "IATA", "#text": "JQ"}, "Num": "255"}})
    );

    let metadata = &body["metadata"];
    assert_eq!(metadata["parser_version"], json!(env!("CARGO_PKG_VERSION")));
    assert_eq!(metadata["file_info"]["name"], json!("flight.xml"));
    assert_eq!(metadata["file_info"]["size_bytes"], json!(FLIGHT_XML.len()));
    assert!(metadata["conversion_timestamp"].is_string());
    assert!(body["processing_time_ms"].is_f64());
}

#[tokio::test]
async fn convert_reports_pretty_json_size_and_lines() {
    let xml = "<Legs><Leg>1</Leg><Leg>2</Leg></Legs>";
    let (status, body) = send(app(), upload_file("legs.XML", xml.as_bytes())).await;

    assert_eq!(status, StatusCode::OK);
    let rendered = "{\n  \"Legs\": {\n    \"Leg\": [\n      \"1\",\n      \"2\"\n    ]\n  }\n}";
    assert_eq!(body["json_size"], json!(rendered.len()));
    assert_eq!(body["metadata"]["json_info"]["size_bytes"], json!(rendered.len()));
    assert_eq!(body["metadata"]["json_info"]["line_count"], json!(8));
    assert_eq!(body["metadata"]["file_info"]["size_formatted"], json!("37.0 B"));
}

#[tokio::test]
async fn convert_uses_configured_filters() {
    let config = ApiConfig {
        skip_tags: Vec::new(),
        include_only_tags: vec!["TPA_Extension".to_string(), "FunctionalID".to_string()],
        include_attributes: false,
        ..ApiConfig::default()
    };
    let (status, body) = send(
        app_with(config),
        upload_file("flight.xml", FLIGHT_XML.as_bytes()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["json_data"],
        json!({"Flight": {"TPA_Extension": {"FunctionalID": "FL-0001"}}})
    );
}

#[tokio::test]
async fn missing_file_field_is_rejected() {
    let request = upload(multipart_body("document", Some("flight.xml"), b"<a/>"));
    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("No file uploaded"));
}

#[tokio::test]
async fn non_multipart_request_is_rejected() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/convert")
        .header(header::CONTENT_TYPE, "application/xml")
        .body(Body::from("<a/>"))
        .expect("request");
    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("No file uploaded"));
}

#[tokio::test]
async fn empty_filename_is_rejected() {
    let request = upload(multipart_body("file", None, b"<a/>"));
    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("No file selected"));
}

#[tokio::test]
async fn non_xml_extension_is_rejected() {
    let (status, body) = send(app(), upload_file("flight.json", b"<a/>")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Invalid file type"));
    assert_eq!(body["details"], json!("Only XML files are supported"));
}

#[tokio::test]
async fn non_utf8_content_is_rejected() {
    let (status, body) = send(app(), upload_file("flight.xml", b"<a>\xff\xfe</a>")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("File encoding error"));
}

#[tokio::test]
async fn blank_and_non_markup_content_fail_validation() {
    let (status, body) = send(app(), upload_file("blank.xml", b"  \n  ")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("XML validation failed"));
    assert_eq!(body["details"], json!("File is empty"));

    let (status, body) = send(app(), upload_file("text.xml", b"Flight JQ255")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["details"],
        json!("File does not appear to be valid XML")
    );
}

#[tokio::test]
async fn malformed_xml_is_unprocessable() {
    let (status, body) = send(app(), upload_file("broken.xml", b"<a><b>x</a>")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], json!("AIDX parsing failed"));
    assert_eq!(body["filename"], json!("broken.xml"));
    assert_eq!(body["category"], json!("syntax"));
    assert!(body["details"]
        .as_str()
        .is_some_and(|details| details.contains("mismatched tag")));
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let config = ApiConfig {
        max_content_length: 256,
        ..ApiConfig::default()
    };
    let content = format!("<Legs>{}</Legs>", "<Leg>1</Leg>".repeat(100));
    let (status, body) = send(
        app_with(config),
        upload_file("legs.xml", content.as_bytes()),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"], json!("File too large"));
    assert_eq!(body["details"], json!("Maximum file size is 256.0 B"));
}

#[tokio::test]
async fn health_reports_operational_parser() {
    let (status, body) = send(app(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("healthy"));
    assert_eq!(body["parser_status"], json!("operational"));
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn info_describes_service_and_parser() {
    let (status, body) = send(app(), get("/api/info")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["supported_formats"], json!(["xml"]));
    assert_eq!(body["max_file_size"], json!("16.0 MB"));
    assert_eq!(body["parser_config"]["skip_tags"], json!(["TPA_Extension"]));
    assert_eq!(body["parser_config"]["include_only_tags"], Value::Null);
    assert_eq!(body["parser_config"]["include_attributes"], json!(true));
    assert_eq!(body["parser_config"]["max_depth"], json!(aidx::DEFAULT_MAX_DEPTH));
}

#[tokio::test]
async fn nesting_up_to_default_limit_converts() {
    let max = usize::from(aidx::DEFAULT_MAX_DEPTH);
    let nested = |n: usize| format!("{}x{}", "<a>".repeat(n), "</a>".repeat(n));

    let response = app()
        .oneshot(upload_file("deep.xml", nested(max).as_bytes()))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let (status, body) = send(app(), upload_file("deeper.xml", nested(max + 1).as_bytes())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["category"], json!("max_depth_exceeded"));
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let (status, body) = send(app(), get("/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("Not found"));
}

#[tokio::test]
async fn wrong_method_is_json_405() {
    let (status, body) = send(app(), get("/convert")).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"], json!("Method not allowed"));
}

#[tokio::test]
async fn cors_allows_any_origin_by_default() {
    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "https://ops.example.com")
        .body(Body::empty())
        .expect("request");
    let response = app().oneshot(request).await.expect("response");
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}
