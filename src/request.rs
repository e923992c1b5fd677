//! Request schema – validates the JSON body of a conversion request.

use serde::Deserialize;
use serde_json::Value;

use crate::error::ConvertError;
use crate::page::{PageOrientation, PageSize};

/// Filename echoed back when the request names none.
pub const DEFAULT_FILENAME: &str = "converted.pdf";

/// Raw body shape. Every field is optional here; required-ness is checked
/// in [`ConversionRequest::from_body`] so each failure gets its own message.
#[derive(Debug, Default, Deserialize)]
struct RequestBody {
    #[serde(default)]
    html: Option<String>,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    page_size: Option<String>,
    #[serde(default)]
    orientation: Option<String>,
}

/// A validated conversion request with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub html: String,
    /// Defaults to [`DEFAULT_FILENAME`].
    pub filename: String,
    /// Defaults to A4; unrecognised names also resolve to A4.
    pub page_size: PageSize,
    /// Defaults to portrait; anything but `"landscape"` is portrait.
    pub orientation: PageOrientation,
}

impl ConversionRequest {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            filename: DEFAULT_FILENAME.to_string(),
            page_size: PageSize::default(),
            orientation: PageOrientation::default(),
        }
    }

    /// Parse and validate a raw request body.
    ///
    /// `None`, an empty body, and falsy JSON (`null`, `{}`, `[]`, `""`,
    /// `false`, `0`) all count as a missing body.
    pub fn from_body(body: Option<&[u8]>) -> Result<Self, ConvertError> {
        let bytes = match body {
            Some(b) if !b.iter().all(u8::is_ascii_whitespace) => b,
            _ => return Err(ConvertError::MissingBody),
        };

        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| ConvertError::InvalidJson(e.to_string()))?;
        if is_falsy(&value) {
            return Err(ConvertError::MissingBody);
        }
        if !value.is_object() {
            return Err(ConvertError::InvalidJson(format!(
                "expected a JSON object, got {}",
                json_kind(&value)
            )));
        }

        let raw: RequestBody =
            serde_json::from_value(value).map_err(|e| ConvertError::InvalidJson(e.to_string()))?;

        let html = match raw.html {
            Some(html) if !html.is_empty() => html,
            _ => return Err(ConvertError::MissingHtml),
        };

        Ok(Self {
            html,
            filename: raw.filename.unwrap_or_else(|| DEFAULT_FILENAME.to_string()),
            page_size: raw
                .page_size
                .as_deref()
                .map(PageSize::from_name)
                .unwrap_or_default(),
            orientation: raw
                .orientation
                .as_deref()
                .map(PageOrientation::from_name)
                .unwrap_or_default(),
        })
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Result<ConversionRequest, ConvertError> {
        ConversionRequest::from_body(Some(body.as_bytes()))
    }

    #[test]
    fn defaults_are_applied() {
        let req = parse(r#"{"html": "<p>hi</p>"}"#).unwrap();
        assert_eq!(req, ConversionRequest::new("<p>hi</p>"));
        assert_eq!(req.filename, "converted.pdf");
    }

    #[test]
    fn explicit_fields_are_kept() {
        let req = parse(
            r#"{"html": "<p>x</p>", "filename": "out.pdf", "page_size": "Legal", "orientation": "landscape"}"#,
        )
        .unwrap();
        assert_eq!(req.filename, "out.pdf");
        assert_eq!(req.page_size, PageSize::Legal);
        assert_eq!(req.orientation, PageOrientation::Landscape);
    }

    #[test]
    fn null_optional_fields_take_defaults() {
        let req = parse(r#"{"html": "x", "filename": null, "page_size": null}"#).unwrap();
        assert_eq!(req.filename, DEFAULT_FILENAME);
        assert_eq!(req.page_size, PageSize::A4);
    }

    #[test]
    fn missing_and_falsy_bodies() {
        assert!(matches!(
            ConversionRequest::from_body(None),
            Err(ConvertError::MissingBody)
        ));
        for body in ["", "  \n", "null", "{}", "[]", "\"\"", "false", "0"] {
            assert!(
                matches!(parse(body), Err(ConvertError::MissingBody)),
                "body {body:?} should count as missing"
            );
        }
    }

    #[test]
    fn malformed_json() {
        assert!(matches!(parse("{html:"), Err(ConvertError::InvalidJson(_))));
        assert!(matches!(parse("[1, 2]"), Err(ConvertError::InvalidJson(_))));
        assert!(matches!(
            parse(r#"{"html": 42}"#),
            Err(ConvertError::InvalidJson(_))
        ));
    }

    #[test]
    fn html_is_required() {
        assert!(matches!(
            parse(r#"{"filename": "a.pdf"}"#),
            Err(ConvertError::MissingHtml)
        ));
        assert!(matches!(
            parse(r#"{"html": ""}"#),
            Err(ConvertError::MissingHtml)
        ));
    }
}
