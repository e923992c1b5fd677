//! Response envelope – the JSON shape returned to callers.

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::ConvertError;

/// Rendered PDF bytes plus size metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    pdf: Vec<u8>,
}

impl ConversionResult {
    pub fn new(pdf: Vec<u8>) -> Self {
        Self { pdf }
    }

    pub fn pdf(&self) -> &[u8] {
        &self.pdf
    }

    pub fn size_bytes(&self) -> usize {
        self.pdf.len()
    }

    /// Kilobytes (1 KB = 1024 bytes) rounded to two decimals.
    pub fn size_kb(&self) -> f64 {
        size_kb(self.pdf.len())
    }
}

pub fn size_kb(size_bytes: usize) -> f64 {
    (size_bytes as f64 / 1024.0 * 100.0).round() / 100.0
}

/// JSON body of every response from the conversion endpoint.
///
/// Validation failures carry only `error`; rendering failures also carry
/// `success: false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConversionResponse {
    Success {
        success: bool,
        filename: String,
        size_bytes: usize,
        size_kb: f64,
        pdf_base64: String,
    },
    Failure {
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        success: Option<bool>,
    },
}

impl ConversionResponse {
    pub fn success(filename: impl Into<String>, result: &ConversionResult) -> Self {
        ConversionResponse::Success {
            success: true,
            filename: filename.into(),
            size_bytes: result.size_bytes(),
            size_kb: result.size_kb(),
            pdf_base64: BASE64_STD.encode(result.pdf()),
        }
    }

    pub fn failure(err: &ConvertError) -> Self {
        ConversionResponse::Failure {
            error: err.to_string(),
            success: (!err.is_client_error()).then_some(false),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ConversionResponse::Success { success: true, .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ConversionResponse::Failure { error, .. } => Some(error),
            ConversionResponse::Success { .. } => None,
        }
    }

    /// Decode the base64 payload of a successful response.
    pub fn decode_pdf(&self) -> Option<Result<Vec<u8>, base64::DecodeError>> {
        match self {
            ConversionResponse::Success { pdf_base64, .. } => Some(BASE64_STD.decode(pdf_base64)),
            ConversionResponse::Failure { .. } => None,
        }
    }
}
