//! `<img>` sources. Only inline `data:` URIs are decoded; the engine never
//! fetches anything over the network.

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};

use crate::engine::dom::ElementNode;
use crate::engine::page_rules::parse_length_pt;

/// Image bytes together with the pixel dimensions of the decoded raster.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub bytes: Vec<u8>,
    pub px_width: u32,
    pub px_height: u32,
}

impl DecodedImage {
    /// Natural size in points (1 CSS px = 0.75pt).
    pub fn natural_size_pt(&self) -> (f32, f32) {
        (self.px_width as f32 * 0.75, self.px_height as f32 * 0.75)
    }
}

/// Decode an `<img src>` value.
pub fn load(src: &str) -> Result<DecodedImage, String> {
    let bytes = parse_data_uri(src)?;
    let img = ::image::load_from_memory(&bytes).map_err(|e| format!("decode error: {e}"))?;
    Ok(DecodedImage {
        px_width: img.width(),
        px_height: img.height(),
        bytes,
    })
}

/// Parse a `data:<mime>;base64,<data>` URI and return the raw decoded bytes.
pub fn parse_data_uri(src: &str) -> Result<Vec<u8>, String> {
    let Some(rest) = src.trim().strip_prefix("data:") else {
        let preview: String = src.chars().take(80).collect();
        return Err(format!(
            "only data: URIs are supported for images, got {preview:?}"
        ));
    };
    let (header, data) = rest
        .split_once(',')
        .ok_or_else(|| "invalid data URI: missing `,` separator".to_string())?;
    if !header.to_ascii_lowercase().contains(";base64") {
        return Err("only base64-encoded data URIs are supported".to_string());
    }
    let compact: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    BASE64_STD
        .decode(compact)
        .map_err(|e| format!("base64 decode error: {e}"))
}

/// Width and height requested by `width`/`height` attributes or the inline
/// style, in points. Inline style wins over attributes.
pub fn declared_size(element: &ElementNode) -> (Option<f32>, Option<f32>) {
    let mut width = element.attr("width").and_then(attr_length);
    let mut height = element.attr("height").and_then(attr_length);
    if let Some(style) = element.inline_style() {
        for decl in style.split(';') {
            let Some((prop, value)) = decl.split_once(':') else {
                continue;
            };
            match prop.trim().to_ascii_lowercase().as_str() {
                "width" => width = parse_length_pt(value).or(width),
                "height" => height = parse_length_pt(value).or(height),
                _ => {}
            }
        }
    }
    (width, height)
}

/// HTML dimension attributes are unitless CSS pixels.
fn attr_length(value: &str) -> Option<f32> {
    let v = value.trim();
    match v.parse::<f32>() {
        Ok(px) if px.is_finite() && px >= 0.0 => Some(px * 0.75),
        Ok(_) => None,
        Err(_) => parse_length_pt(v),
    }
}
