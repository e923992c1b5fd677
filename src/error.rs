//! Error types for the conversion handler and the rendering engine.

use axum::http::StatusCode;
use thiserror::Error;

/// Failure surfaced by a [`Renderer`](crate::engine::Renderer).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RenderError {
    message: String,
}

impl RenderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Every way a conversion request can fail.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Request body is required")]
    MissingBody,

    /// The detail is kept for logs only; callers see the fixed message.
    #[error("Invalid JSON format")]
    InvalidJson(String),

    #[error("HTML content is required")]
    MissingHtml,

    #[error("PDF conversion failed: {0}")]
    Render(#[from] RenderError),
}

impl ConvertError {
    /// Client-caused failures are 400, rendering failures are 500.
    pub fn status(&self) -> StatusCode {
        match self {
            ConvertError::MissingBody | ConvertError::InvalidJson(_) | ConvertError::MissingHtml => {
                StatusCode::BAD_REQUEST
            }
            ConvertError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }
}
