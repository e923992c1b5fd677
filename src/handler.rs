//! Conversion handler – validate → convert → respond.
//!
//! Transport-agnostic: takes the raw body bytes and returns a status code
//! plus the JSON envelope. The HTTP layer in [`crate::server`] adds the CORS
//! headers and runs this on the blocking pool.

use axum::http::StatusCode;

use crate::engine::Renderer;
use crate::error::{ConvertError, RenderError};
use crate::page::{build_page_style, PageOrientation, PageSize};
use crate::request::ConversionRequest;
use crate::response::{ConversionResponse, ConversionResult};

/// `Access-Control-Allow-Origin` on every response.
pub const ALLOW_ORIGIN: &str = "*";
/// `Access-Control-Allow-Methods` on every response.
pub const ALLOW_METHODS: &str = "POST, OPTIONS";
/// `Access-Control-Allow-Headers` on every response.
pub const ALLOW_HEADERS: &str = "Content-Type";

/// Render `html` on the given page preset and return the raw PDF bytes.
pub fn convert(
    renderer: &dyn Renderer,
    html: &str,
    page_size: PageSize,
    orientation: PageOrientation,
) -> Result<Vec<u8>, RenderError> {
    let style = build_page_style(page_size.dimensions().oriented(orientation));
    renderer.render(html, &[style])
}

/// Run a validated request through the renderer.
pub fn process(
    renderer: &dyn Renderer,
    request: &ConversionRequest,
) -> Result<ConversionResult, ConvertError> {
    log::info!(
        "Converting HTML ({} chars) to PDF - {} {}",
        request.html.chars().count(),
        request.page_size,
        request.orientation
    );
    let pdf = convert(
        renderer,
        &request.html,
        request.page_size,
        request.orientation,
    )?;
    log::info!("PDF generated successfully ({} bytes)", pdf.len());
    Ok(ConversionResult::new(pdf))
}

/// Full request cycle for one raw body. `None` means no body was sent.
pub fn handle_request(
    renderer: &dyn Renderer,
    body: Option<&[u8]>,
) -> (StatusCode, ConversionResponse) {
    let outcome = ConversionRequest::from_body(body).and_then(|request| {
        process(renderer, &request).map(|result| (request.filename, result))
    });
    match outcome {
        Ok((filename, result)) => (
            StatusCode::OK,
            ConversionResponse::success(filename, &result),
        ),
        Err(err) => failure(&err),
    }
}

/// Status and envelope for a failed conversion, logged once here.
pub fn failure(err: &ConvertError) -> (StatusCode, ConversionResponse) {
    match err {
        ConvertError::InvalidJson(detail) => {
            log::error!("Invalid JSON in request body: {detail}")
        }
        ConvertError::Render(inner) => log::error!("Error during PDF conversion: {inner}"),
        other => log::error!("Rejected conversion request: {other}"),
    }
    (err.status(), ConversionResponse::failure(err))
}
