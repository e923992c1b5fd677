//! Integration tests for the conversion handler.
//!
//! These tests validate:
//! - Successful conversions return a decodable PDF with size metadata
//! - Each validation failure maps to its 400 message
//! - Renderer failures map to 500 with `success: false`
//! - Page presets and orientations all render

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use pdf_courier::engine::{FlowEngine, Renderer};
use pdf_courier::page::PageStyle;
use pdf_courier::response::size_kb;
use pdf_courier::{handle_request, ConversionResponse, RenderError};

// =====================================================================
// Helpers
// =====================================================================

struct FailingRenderer;

impl Renderer for FailingRenderer {
    fn render(&self, _html: &str, _styles: &[PageStyle]) -> Result<Vec<u8>, RenderError> {
        Err(RenderError::new("engine exploded"))
    }
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 100, "PDF too small: {} bytes", bytes.len());
    assert_eq!(&bytes[0..5], b"%PDF-", "Missing PDF header");
}

fn post(body: &Value) -> (StatusCode, ConversionResponse) {
    let bytes = serde_json::to_vec(body).unwrap();
    handle_request(&FlowEngine::default(), Some(&bytes[..]))
}

fn post_raw(body: &[u8]) -> (StatusCode, ConversionResponse) {
    handle_request(&FlowEngine::default(), Some(body))
}

// =====================================================================
// Success path
// =====================================================================

#[test]
fn converts_html_to_base64_pdf() {
    let (status, response) = post(&json!({
        "html": "<h1>Hello</h1><p>World</p>",
        "filename": "hello.pdf"
    }));
    assert_eq!(status, StatusCode::OK);
    assert!(response.is_success());

    let pdf = response.decode_pdf().unwrap().unwrap();
    assert_valid_pdf(&pdf);

    let ConversionResponse::Success {
        filename,
        size_bytes,
        size_kb: kb,
        ..
    } = &response
    else {
        panic!("expected success");
    };
    assert_eq!(filename, "hello.pdf");
    assert_eq!(*size_bytes, pdf.len());
    assert_eq!(*kb, size_kb(pdf.len()));
}

#[test]
fn success_body_shape() {
    let (_, response) = post(&json!({ "html": "<p>x</p>" }));
    let value = serde_json::to_value(&response).unwrap();
    let mut keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        vec!["filename", "pdf_base64", "size_bytes", "size_kb", "success"]
    );
    assert_eq!(value["filename"], "converted.pdf");
    assert_eq!(value["success"], true);
}

#[test]
fn every_preset_and_orientation_renders() {
    for page_size in ["A4", "Letter", "Legal", "Tabloid"] {
        for orientation in ["portrait", "landscape", "sideways"] {
            let (status, response) = post(&json!({
                "html": "<p>preset</p>",
                "page_size": page_size,
                "orientation": orientation
            }));
            assert_eq!(status, StatusCode::OK, "{page_size} {orientation}");
            assert_valid_pdf(&response.decode_pdf().unwrap().unwrap());
        }
    }
}

#[test]
fn whitespace_html_and_null_options_are_accepted() {
    let (status, response) = post(&json!({
        "html": "   ",
        "filename": null,
        "page_size": null,
        "orientation": null,
        "extra": 42
    }));
    assert_eq!(status, StatusCode::OK);
    assert_valid_pdf(&response.decode_pdf().unwrap().unwrap());
}

#[test]
fn rich_document_renders() {
    let html = r#"<!DOCTYPE html>
<html><head><title>Report</title>
<style>@page { size: A5; margin: 2cm } body { color: red }</style></head>
<body>
  <h1 style="text-align: center">Quarterly report</h1>
  <p>Intro with <b>bold</b>, <i>italic</i> and <u>underlined</u> text &amp; entities &euro;.</p>
  <ol><li>One</li><li>Two</li></ol>
  <table><thead><tr><th>Name</th><th>Qty</th></tr></thead>
  <tbody><tr><td>Apples</td><td>3</td></tr></tbody></table>
  <hr>
  <pre>  code
    block</pre>
  <div style="page-break-before: always; background-color: #eef">Appendix</div>
</body></html>"#;
    let (status, response) = post(&json!({ "html": html, "page_size": "Letter" }));
    assert_eq!(status, StatusCode::OK);
    assert_valid_pdf(&response.decode_pdf().unwrap().unwrap());
}

#[test]
fn malformed_inline_colors_are_ignored() {
    for color in ["#a\u{e9}", "#\u{e9}\u{e9}\u{e9}", "#zzz", "rgb(1,2"] {
        let html = format!(r#"<p style="color: {color}">hi</p>"#);
        let (status, response) = post(&json!({ "html": html }));
        assert_eq!(status, StatusCode::OK, "{color}");
        assert_valid_pdf(&response.decode_pdf().unwrap().unwrap());
    }
}

#[test]
fn deeply_nested_markup_renders() {
    let depth = 50_000;
    let html = format!(
        "{}deep{}<ol start=\"9223372036854775807\"><li>a</li><li>b</li></ol>",
        "<div>".repeat(depth),
        "</div>".repeat(depth)
    );
    let (status, response) = post(&json!({ "html": html }));
    assert_eq!(status, StatusCode::OK);
    assert_valid_pdf(&response.decode_pdf().unwrap().unwrap());
}

#[test]
fn pdf_length_is_stable() {
    let body = json!({ "html": "<h1>Same</h1><p>input</p>", "page_size": "Legal" });
    let (_, first) = post(&body);
    let (_, second) = post(&body);
    let a = first.decode_pdf().unwrap().unwrap();
    let b = second.decode_pdf().unwrap().unwrap();

    // printpdf embeds timestamps, so byte-exact equality isn't guaranteed.
    let diff = (a.len() as i64 - b.len() as i64).unsigned_abs();
    assert!(diff < 200, "PDF outputs differ: {} vs {} bytes", a.len(), b.len());
}

// =====================================================================
// Validation failures
// =====================================================================

#[test]
fn missing_body_is_rejected() {
    let engine = FlowEngine::default();
    for body in [None, Some(&b""[..]), Some(&b"  \n"[..])] {
        let (status, response) = handle_request(&engine, body);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response.error(), Some("Request body is required"));
    }
    for falsy in ["null", "{}", "[]", "\"\"", "false", "0"] {
        let (status, response) = post_raw(falsy.as_bytes());
        assert_eq!(status, StatusCode::BAD_REQUEST, "{falsy}");
        assert_eq!(response.error(), Some("Request body is required"), "{falsy}");
    }
}

#[test]
fn malformed_json_is_rejected() {
    for body in [r#"{"html": "<p>"#, "not json", "[1, 2]", "\"<p>x</p>\"", r#"{"html": 5}"#] {
        let (status, response) = post_raw(body.as_bytes());
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(response.error(), Some("Invalid JSON format"), "{body}");
    }
}

#[test]
fn missing_html_is_rejected() {
    for body in [
        json!({ "filename": "x.pdf" }),
        json!({ "html": "" }),
        json!({ "html": null }),
    ] {
        let (status, response) = post(&body);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response.error(), Some("HTML content is required"));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value, json!({ "error": "HTML content is required" }));
    }
}

// =====================================================================
// Rendering failures
// =====================================================================

#[test]
fn renderer_failure_is_a_server_error() {
    let body = serde_json::to_vec(&json!({ "html": "<p>x</p>" })).unwrap();
    let (status, response) = handle_request(&FailingRenderer, Some(&body[..]));
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({ "error": "PDF conversion failed: engine exploded", "success": false })
    );
}

#[test]
fn page_directive_overrides_document_margins() {
    let html = "<style>@page { margin: 20in }</style><p>squeezed</p>";
    let (status, response) = post(&json!({ "html": html }));
    // The handler's own 1cm margin comes after the document's rule and wins.
    assert_eq!(status, StatusCode::OK);
    assert!(response.is_success());
}
