//! # pdf-courier – HTML → PDF over HTTP
//!
//! A single endpoint accepts a JSON body carrying an HTML document and
//! optional page settings, renders it to PDF and returns the bytes
//! base64-encoded with size metadata.
//!
//! 1. **Request** – validate the JSON body ([`request`])
//! 2. **Page** – resolve the page preset into an `@page` rule ([`page`])
//! 3. **Render** – hand HTML and rule to a [`Renderer`] ([`engine`])
//! 4. **Respond** – wrap the PDF in the JSON envelope ([`response`])
//!
//! [`handler`] ties these together; [`server`] exposes them over axum.

pub mod config;
pub mod engine;
pub mod error;
pub mod handler;
pub mod page;
pub mod request;
pub mod response;
pub mod server;
pub mod smoke;

// Re-exports for convenience
pub use engine::{FlowEngine, Renderer};
pub use error::{ConvertError, RenderError};
pub use handler::{convert, handle_request};
pub use page::{build_page_style, resolve_page_dimensions, PageOrientation, PageSize};
pub use response::ConversionResponse;
