//! Smoke-test client: sends a sample document to a running service and
//! writes the returned PDF to disk.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::json;
use thiserror::Error;

use crate::config::SmokeArgs;
use crate::response::ConversionResponse;
use crate::server::CONVERT_PATH;

/// The document posted by the smoke test.
pub const SAMPLE_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>Smoke Test Document</title>
    <style>
        body { font-family: Arial, sans-serif; }
    </style>
</head>
<body>
    <h1>HTML to PDF Conversion Test</h1>
    <p>This document was generated by the courier smoke test.</p>
    <h2>Features</h2>
    <ul>
        <li><strong>Bold</strong> and <em>italic</em> text</li>
        <li>Lists and tables</li>
        <li>Page size and orientation control</li>
    </ul>
    <table>
        <tr><th>Name</th><th>Value</th></tr>
        <tr><td>Page size</td><td>A4</td></tr>
        <tr><td>Orientation</td><td>portrait</td></tr>
    </table>
    <p style="color: #555555">If you can read this, the service works.</p>
</body>
</html>
"#;

#[derive(Debug, Error)]
pub enum SmokeError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("service answered {status}: {error}")]
    Rejected { status: u16, error: String },

    #[error("response did not contain a PDF")]
    MissingPdf,

    #[error("could not decode pdf_base64: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("decoded payload is not a PDF")]
    NotPdf,

    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What a successful smoke run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SmokeReport {
    pub filename: String,
    pub size_bytes: usize,
    pub size_kb: f64,
    pub output: PathBuf,
}

/// Full endpoint URL for a base URL, tolerating a trailing slash.
pub fn endpoint(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), CONVERT_PATH)
}

pub async fn run(args: &SmokeArgs) -> Result<SmokeReport, SmokeError> {
    let url = endpoint(&args.base_url);
    log::info!("Testing HTML to PDF conversion at {url}");

    let request_error = |source| SmokeError::Request {
        url: url.clone(),
        source,
    };
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.timeout))
        .build()
        .map_err(request_error)?;

    let payload = json!({
        "html": SAMPLE_HTML,
        "filename": "test_document.pdf",
        "page_size": "A4",
        "orientation": "portrait",
    });
    let response = client
        .post(&url)
        .json(&payload)
        .send()
        .await
        .map_err(request_error)?;
    let status = response.status();
    let body: ConversionResponse = response.json().await.map_err(request_error)?;

    let (filename, size_bytes, size_kb) = match &body {
        ConversionResponse::Success {
            filename,
            size_bytes,
            size_kb,
            ..
        } if status.is_success() => (filename.clone(), *size_bytes, *size_kb),
        _ => {
            return Err(SmokeError::Rejected {
                status: status.as_u16(),
                error: body.error().unwrap_or("unexpected response").to_string(),
            })
        }
    };

    let pdf = body.decode_pdf().ok_or(SmokeError::MissingPdf)??;
    if !pdf.starts_with(b"%PDF-") {
        return Err(SmokeError::NotPdf);
    }
    write_pdf(&args.output, &pdf)?;

    Ok(SmokeReport {
        filename,
        size_bytes,
        size_kb,
        output: args.output.clone(),
    })
}

fn write_pdf(path: &Path, pdf: &[u8]) -> Result<(), SmokeError> {
    std::fs::write(path, pdf).map_err(|source| SmokeError::Write {
        path: path.to_path_buf(),
        source,
    })
}
