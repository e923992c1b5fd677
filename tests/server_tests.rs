//! Router tests: status codes, CORS headers and body limits over HTTP.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use pdf_courier::engine::Renderer;
use pdf_courier::page::PageStyle;
use pdf_courier::server::{router, AppState, HealthResponse, CONVERT_PATH, HEALTH_PATH};
use pdf_courier::RenderError;

const LIMIT: usize = 64 * 1024;

struct PanickingRenderer;

impl Renderer for PanickingRenderer {
    fn render(&self, _html: &str, _styles: &[PageStyle]) -> Result<Vec<u8>, RenderError> {
        panic!("renderer bug");
    }
}

fn app() -> Router {
    router(AppState::default(), LIMIT)
}

fn post(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(CONVERT_PATH)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .expect("request should build")
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app.oneshot(request).await.expect("router should respond");
    let status = response.status();
    let headers = response.headers().clone();
    let body = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes()
        .to_vec();
    (status, headers, body)
}

fn assert_cors(headers: &axum::http::HeaderMap) {
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST, OPTIONS");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
}

#[tokio::test]
async fn convert_returns_pdf_with_cors_headers() {
    let body = json!({ "html": "<h1>Hi</h1>", "page_size": "Letter", "orientation": "landscape" });
    let (status, headers, bytes) = send(app(), post(body.to_string())).await;
    assert_eq!(status, StatusCode::OK);
    assert_cors(&headers);
    assert!(headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("application/json"));

    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["success"], true);
    assert_eq!(value["filename"], "converted.pdf");
    assert!(value["pdf_base64"].as_str().unwrap().starts_with("JVBERi0"));
}

#[tokio::test]
async fn empty_body_is_a_bad_request() {
    let (status, headers, bytes) = send(app(), post(Body::empty())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_cors(&headers);
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value, json!({ "error": "Request body is required" }));
}

#[tokio::test]
async fn invalid_json_is_a_bad_request() {
    let (status, headers, bytes) = send(app(), post("{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_cors(&headers);
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["error"], "Invalid JSON format");
}

#[tokio::test]
async fn missing_html_is_a_bad_request() {
    let (status, _, bytes) = send(app(), post(r#"{"filename":"a.pdf"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["error"], "HTML content is required");
}

#[tokio::test]
async fn renderer_panic_is_a_server_error() {
    let app = router(AppState::new(Arc::new(PanickingRenderer)), LIMIT);
    let (status, headers, bytes) = send(app, post(r#"{"html":"<p>x</p>"}"#)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_cors(&headers);
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["success"], false);
    assert!(value["error"]
        .as_str()
        .unwrap()
        .starts_with("PDF conversion failed: "));
}

#[tokio::test]
async fn preflight_is_no_content() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri(CONVERT_PATH)
        .body(Body::empty())
        .expect("request should build");
    let (status, headers, bytes) = send(app(), request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_cors(&headers);
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn health_reports_service() {
    let request = Request::builder()
        .uri(HEALTH_PATH)
        .body(Body::empty())
        .expect("request should build");
    let (status, headers, bytes) = send(app(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_cors(&headers);
    let health: HealthResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.service, "pdf-courier");
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let html = "x".repeat(LIMIT * 2);
    let body = json!({ "html": html }).to_string();
    let (status, headers, _) = send(app(), post(body)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_cors(&headers);
}

#[tokio::test]
async fn deeply_nested_markup_is_served() {
    let depth = 50_000;
    let html = format!("{}x{}", "<div>".repeat(depth), "</div>".repeat(depth));
    let app = router(AppState::default(), 10 * 1024 * 1024);
    let (status, headers, bytes) = send(app, post(json!({ "html": html }).to_string())).await;
    assert_eq!(status, StatusCode::OK);
    assert_cors(&headers);
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["success"], true);
}
