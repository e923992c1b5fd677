//! Style resolver – maps tag defaults and inline `style` attributes to a
//! flat [`ComputedStyle`] consumed by the flow engine.
//!
//! There is no selector matching: `<style>` sheets only contribute `@page`
//! rules. Font properties inherit; box properties do not.

use crate::engine::dom::{ElementNode, Tag};
use crate::engine::page_rules::parse_length_pt;

/// Base font size in points (16 CSS px).
pub const BASE_FONT_SIZE_PT: f32 = 12.0;

/// Fully resolved style for a single element.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedStyle {
    // Typography (inherited)
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub color: Color,
    pub text_align: TextAlign,
    /// Multiple of `font_size`.
    pub line_height: f32,

    // Box (not inherited), in points
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub padding_left: f32,
    pub background_color: Option<Color>,
    pub hidden: bool,

    // Page break
    pub page_break_before: bool,
    pub page_break_after: bool,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            font_size: BASE_FONT_SIZE_PT,
            bold: false,
            italic: false,
            underline: false,
            color: Color::BLACK,
            text_align: TextAlign::Left,
            line_height: 1.3,
            margin_top: 0.0,
            margin_bottom: 0.0,
            padding_left: 0.0,
            background_color: None,
            hidden: false,
            page_break_before: false,
            page_break_after: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// RGB colour with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };
    pub const WHITE: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };
    pub const LIGHT_GRAY: Self = Self {
        r: 0.93,
        g: 0.93,
        b: 0.93,
    };
    pub const GRAY: Self = Self {
        r: 0.5,
        g: 0.5,
        b: 0.5,
    };

    pub fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#')?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            6 => Some(Self::rgb8(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => Some(Self::rgb8(
                channel(&hex[0..1].repeat(2))?,
                channel(&hex[1..2].repeat(2))?,
                channel(&hex[2..3].repeat(2))?,
            )),
            _ => None,
        }
    }

    /// Parse `#hex`, `rgb()`/`rgba()` or a basic colour keyword.
    pub fn parse(value: &str) -> Option<Self> {
        let v = value.trim().to_ascii_lowercase();
        if v.starts_with('#') {
            return Self::from_hex(&v);
        }
        if let Some(args) = v
            .strip_prefix("rgba(")
            .or_else(|| v.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let parts: Vec<u8> = args
                .split(',')
                .take(3)
                .map(|p| p.trim().parse::<f32>().ok().map(|n| n.clamp(0.0, 255.0) as u8))
                .collect::<Option<_>>()?;
            return match parts.as_slice() {
                [r, g, b] => Some(Self::rgb8(*r, *g, *b)),
                _ => None,
            };
        }
        let named = match v.as_str() {
            "black" => Self::BLACK,
            "white" => Self::WHITE,
            "gray" | "grey" => Self::GRAY,
            "silver" => Self::rgb8(192, 192, 192),
            "red" => Self::rgb8(255, 0, 0),
            "maroon" => Self::rgb8(128, 0, 0),
            "green" => Self::rgb8(0, 128, 0),
            "lime" => Self::rgb8(0, 255, 0),
            "blue" => Self::rgb8(0, 0, 255),
            "navy" => Self::rgb8(0, 0, 128),
            "yellow" => Self::rgb8(255, 255, 0),
            "orange" => Self::rgb8(255, 165, 0),
            "purple" => Self::rgb8(128, 0, 128),
            "teal" => Self::rgb8(0, 128, 128),
            _ => return None,
        };
        Some(named)
    }
}

// ---------------------------------------------------------------------------
// Style resolution
// ---------------------------------------------------------------------------

/// Resolve the style for an element, inheriting text properties from its parent.
pub fn resolve_style(element: &ElementNode, parent: &ComputedStyle) -> ComputedStyle {
    let mut style = ComputedStyle {
        font_size: parent.font_size,
        bold: parent.bold,
        italic: parent.italic,
        underline: parent.underline,
        color: parent.color,
        text_align: parent.text_align,
        line_height: parent.line_height,
        ..ComputedStyle::default()
    };
    apply_tag_defaults(&mut style, &element.tag);

    if let Some(inline) = element.inline_style() {
        apply_inline_style(&mut style, inline, parent.font_size);
    }
    style
}

fn apply_tag_defaults(s: &mut ComputedStyle, tag: &Tag) {
    match tag {
        Tag::Heading(level) => {
            let scale = match level {
                1 => 2.0,
                2 => 1.5,
                3 => 1.17,
                4 => 1.0,
                5 => 0.83,
                _ => 0.67,
            };
            s.font_size = BASE_FONT_SIZE_PT * scale;
            s.bold = true;
            s.margin_top = s.font_size * 0.67;
            s.margin_bottom = s.font_size * 0.67;
        }
        Tag::P | Tag::Pre => {
            s.margin_top = s.font_size;
            s.margin_bottom = s.font_size;
        }
        Tag::Ul | Tag::Ol => {
            s.margin_top = s.font_size;
            s.margin_bottom = s.font_size;
            s.padding_left = 30.0;
        }
        Tag::Table => {
            s.margin_bottom = s.font_size * 0.5;
        }
        Tag::Th => s.bold = true,
        Tag::Strong => s.bold = true,
        Tag::Em => s.italic = true,
        Tag::Underline => s.underline = true,
        Tag::Hr => {
            s.margin_top = 6.0;
            s.margin_bottom = 6.0;
        }
        _ => {}
    }
    if tag.is_hidden() {
        s.hidden = true;
    }
}

/// Apply a `style="..."` attribute. `parent_font_size` resolves `em` and `%`.
pub fn apply_inline_style(s: &mut ComputedStyle, style_str: &str, parent_font_size: f32) {
    for decl in style_str.split(';') {
        let Some((prop, val)) = decl.split_once(':') else {
            continue;
        };
        let prop = prop.trim().to_ascii_lowercase();
        let val = val.trim().trim_end_matches("!important").trim();
        apply_css_property(s, &prop, val, parent_font_size);
    }
}

fn apply_css_property(s: &mut ComputedStyle, prop: &str, val: &str, parent_font_size: f32) {
    let lower = val.to_ascii_lowercase();
    match prop {
        "display" => s.hidden = lower == "none",
        "visibility" => s.hidden = lower == "hidden",
        "font-size" => {
            if let Some(size) = parse_font_size(&lower, parent_font_size) {
                s.font_size = size;
            }
        }
        "font-weight" => {
            s.bold = match lower.as_str() {
                "bold" | "bolder" | "600" | "700" | "800" | "900" => true,
                "normal" | "lighter" | "100" | "200" | "300" | "400" | "500" => false,
                _ => s.bold,
            }
        }
        "font-style" => s.italic = lower == "italic" || lower == "oblique",
        "text-decoration" | "text-decoration-line" => s.underline = lower.contains("underline"),
        "color" => {
            if let Some(c) = Color::parse(&lower) {
                s.color = c;
            }
        }
        "background-color" | "background" => {
            if lower == "none" || lower == "transparent" {
                s.background_color = None;
            } else if let Some(c) = Color::parse(&lower) {
                s.background_color = Some(c);
            }
        }
        "text-align" => {
            s.text_align = match lower.as_str() {
                "center" => TextAlign::Center,
                "right" | "end" => TextAlign::Right,
                _ => TextAlign::Left,
            }
        }
        "line-height" => {
            if let Ok(v) = lower.parse::<f32>() {
                s.line_height = v;
            } else if let Some(pt) = parse_length_pt(&lower) {
                if s.font_size > 0.0 {
                    s.line_height = pt / s.font_size;
                }
            }
        }
        "margin" => {
            let parts: Vec<Option<f32>> = lower.split_whitespace().map(parse_length_pt).collect();
            let (top, bottom) = match parts.as_slice() {
                [all] => (*all, *all),
                [v, _] => (*v, *v),
                [t, _, b] | [t, _, b, _] => (*t, *b),
                _ => (None, None),
            };
            if let Some(t) = top {
                s.margin_top = t;
            }
            if let Some(b) = bottom {
                s.margin_bottom = b;
            }
        }
        "margin-top" => {
            if let Some(v) = parse_length_pt(&lower) {
                s.margin_top = v;
            }
        }
        "margin-bottom" => {
            if let Some(v) = parse_length_pt(&lower) {
                s.margin_bottom = v;
            }
        }
        "padding-left" | "margin-left" => {
            if let Some(v) = parse_length_pt(&lower) {
                s.padding_left = v;
            }
        }
        "page-break-before" | "break-before" => {
            s.page_break_before = lower == "always" || lower == "page";
        }
        "page-break-after" | "break-after" => {
            s.page_break_after = lower == "always" || lower == "page";
        }
        _ => {}
    }
}

fn parse_font_size(value: &str, parent: f32) -> Option<f32> {
    let keyword = match value {
        "xx-small" => Some(0.6),
        "x-small" => Some(0.75),
        "small" => Some(0.89),
        "medium" => Some(1.0),
        "large" => Some(1.2),
        "x-large" => Some(1.5),
        "xx-large" => Some(2.0),
        _ => None,
    };
    if let Some(scale) = keyword {
        return Some(BASE_FONT_SIZE_PT * scale);
    }
    if let Some(em) = value.strip_suffix("rem") {
        return em.trim().parse::<f32>().ok().map(|n| n * BASE_FONT_SIZE_PT);
    }
    if let Some(em) = value.strip_suffix("em") {
        return em.trim().parse::<f32>().ok().map(|n| n * parent);
    }
    if let Some(pct) = value.strip_suffix('%') {
        return pct.trim().parse::<f32>().ok().map(|n| n / 100.0 * parent);
    }
    parse_length_pt(value).filter(|v| *v > 0.0)
}
