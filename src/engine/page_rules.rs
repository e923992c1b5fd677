//! `@page` rules – page size and margins from CSS.
//!
//! Only plain `@page { ... }` rules are honoured (no `:first`/`:left`
//! selectors, no margin boxes). Rules apply in order, so the directives the
//! handler appends after the document's own `<style>` blocks win.

use crate::error::RenderError;

/// Points per CSS inch.
pub const PT_PER_IN: f32 = 72.0;

/// Default page margin when no rule sets one (75 CSS px).
pub const DEFAULT_MARGIN_PT: f32 = 56.25;

/// Margins (or any four-sided quantity) in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edges {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Edges {
    pub fn uniform(v: f32) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }
}

/// Physical page size and margins, all in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width_pt: f32,
    pub height_pt: f32,
    pub margin: Edges,
}

impl Default for PageGeometry {
    fn default() -> Self {
        let (width_pt, height_pt) = named_size("a4").unwrap_or((595.28, 841.89));
        Self {
            width_pt,
            height_pt,
            margin: Edges::uniform(DEFAULT_MARGIN_PT),
        }
    }
}

impl PageGeometry {
    pub fn content_width(&self) -> f32 {
        self.width_pt - self.margin.left - self.margin.right
    }

    pub fn content_height(&self) -> f32 {
        self.height_pt - self.margin.top - self.margin.bottom
    }

    /// y coordinate (from the top of the page) where content stops.
    pub fn content_bottom(&self) -> f32 {
        self.height_pt - self.margin.bottom
    }
}

/// Parse a CSS absolute length into points. Bare `0` is accepted.
pub fn parse_length_pt(value: &str) -> Option<f32> {
    let v = value.trim().to_ascii_lowercase();
    if v == "0" {
        return Some(0.0);
    }
    let units: [(&str, f32); 6] = [
        ("mm", PT_PER_IN / 25.4),
        ("cm", PT_PER_IN / 2.54),
        ("in", PT_PER_IN),
        ("pt", 1.0),
        ("pc", 12.0),
        ("px", 0.75),
    ];
    units.iter().find_map(|(suffix, factor)| {
        v.strip_suffix(suffix)
            .and_then(|n| n.trim().parse::<f32>().ok())
            .filter(|n| n.is_finite())
            .map(|n| n * factor)
    })
}

fn named_size(name: &str) -> Option<(f32, f32)> {
    let mm = PT_PER_IN / 25.4;
    let size = match name {
        "a3" => (297.0 * mm, 420.0 * mm),
        "a4" => (210.0 * mm, 297.0 * mm),
        "a5" => (148.0 * mm, 210.0 * mm),
        "b5" => (176.0 * mm, 250.0 * mm),
        "letter" => (8.5 * PT_PER_IN, 11.0 * PT_PER_IN),
        "legal" => (8.5 * PT_PER_IN, 14.0 * PT_PER_IN),
        "ledger" => (11.0 * PT_PER_IN, 17.0 * PT_PER_IN),
        _ => return None,
    };
    Some(size)
}

/// Parse the value of a `size` descriptor into `(width, height)` points.
pub fn parse_page_size(value: &str) -> Option<(f32, f32)> {
    let mut dims = None;
    let mut lengths = Vec::new();
    let mut landscape = None;

    for token in value.split_whitespace() {
        let token = token.to_ascii_lowercase();
        match token.as_str() {
            "auto" => dims = named_size("a4"),
            "portrait" => landscape = Some(false),
            "landscape" => landscape = Some(true),
            other => {
                if let Some(named) = named_size(other) {
                    dims = Some(named);
                } else {
                    lengths.push(parse_length_pt(other)?);
                }
            }
        }
    }

    let (w, h) = match lengths.as_slice() {
        [] => match (dims, landscape) {
            (Some(d), _) => d,
            (None, Some(_)) => named_size("a4")?,
            (None, None) => return None,
        },
        [side] => (*side, *side),
        [w, h] => (*w, *h),
        _ => return None,
    };

    Some(match landscape {
        Some(true) if w < h => (h, w),
        Some(false) if w > h => (h, w),
        _ => (w, h),
    })
}

/// Parse a 1–4 value margin shorthand.
pub fn parse_margin(value: &str) -> Option<Edges> {
    let parts: Vec<f32> = value
        .split_whitespace()
        .map(parse_length_pt)
        .collect::<Option<_>>()?;
    let edges = match parts.as_slice() {
        [all] => Edges::uniform(*all),
        [v, h] => Edges {
            top: *v,
            right: *h,
            bottom: *v,
            left: *h,
        },
        [t, h, b] => Edges {
            top: *t,
            right: *h,
            bottom: *b,
            left: *h,
        },
        [t, r, b, l] => Edges {
            top: *t,
            right: *r,
            bottom: *b,
            left: *l,
        },
        _ => return None,
    };
    Some(edges)
}

/// Apply every plain `@page` rule in `css` to `geometry`, in order.
pub fn apply_page_rules(css: &str, geometry: &mut PageGeometry) {
    let css = strip_comments(css);
    let lower = css.to_ascii_lowercase();
    let mut cursor = 0;

    while let Some(found) = lower[cursor..].find("@page") {
        let start = cursor + found + "@page".len();
        let Some(open) = lower[start..].find('{').map(|i| start + i) else {
            break;
        };
        let selector = css[start..open].trim();
        let close = matching_brace(&css, open);
        if selector.is_empty() {
            for (prop, value) in top_level_declarations(&css[open + 1..close]) {
                apply_descriptor(geometry, &prop, value.trim());
            }
        } else {
            log::debug!("ignoring @page rule with selector {selector:?}");
        }
        cursor = (close + 1).min(css.len());
    }
}

fn apply_descriptor(geometry: &mut PageGeometry, prop: &str, value: &str) {
    match prop {
        "size" => match parse_page_size(value) {
            Some((w, h)) => {
                geometry.width_pt = w;
                geometry.height_pt = h;
            }
            None => log::warn!("unsupported @page size {value:?}"),
        },
        "margin" => match parse_margin(value) {
            Some(edges) => geometry.margin = edges,
            None => log::warn!("unsupported @page margin {value:?}"),
        },
        "margin-top" | "margin-right" | "margin-bottom" | "margin-left" => {
            if let Some(v) = parse_length_pt(value) {
                match prop {
                    "margin-top" => geometry.margin.top = v,
                    "margin-right" => geometry.margin.right = v,
                    "margin-bottom" => geometry.margin.bottom = v,
                    _ => geometry.margin.left = v,
                }
            }
        }
        _ => {}
    }
}

/// Resolve the final geometry from style sheets in cascade order.
pub fn resolve_geometry(sheets: &[String]) -> Result<PageGeometry, RenderError> {
    let mut geometry = PageGeometry::default();
    for sheet in sheets {
        apply_page_rules(sheet, &mut geometry);
    }
    if geometry.content_width() <= 0.0 || geometry.content_height() <= 0.0 {
        return Err(RenderError::new(format!(
            "page margins leave no room for content ({:.1}x{:.1}pt page)",
            geometry.width_pt, geometry.height_pt
        )));
    }
    Ok(geometry)
}

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => {
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Index of the `}` closing the `{` at `open`, or the end of input.
fn matching_brace(css: &str, open: usize) -> usize {
    let mut depth = 0usize;
    for (i, b) in css.bytes().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return i;
                }
            }
            _ => {}
        }
    }
    css.len()
}

/// `prop: value` pairs outside any nested block, props lowercased.
fn top_level_declarations(body: &str) -> Vec<(String, String)> {
    let mut flat = String::with_capacity(body.len());
    let mut depth = 0usize;
    for c in body.chars() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    flat.push(';');
                }
            }
            _ if depth == 0 => flat.push(c),
            _ => {}
        }
    }
    flat.split(';')
        .filter_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            let prop = prop.trim().to_ascii_lowercase();
            // Nested at-rule preludes such as "@top-center" end up here.
            if prop.is_empty() || prop.starts_with('@') {
                return None;
            }
            Some((prop, value.trim().to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.05
    }

    #[test]
    fn lengths() {
        assert!(close(parse_length_pt("210mm").unwrap(), 595.28));
        assert!(close(parse_length_pt("8.5in").unwrap(), 612.0));
        assert!(close(parse_length_pt("1cm").unwrap(), 28.35));
        assert!(close(parse_length_pt("16px").unwrap(), 12.0));
        assert_eq!(parse_length_pt("0"), Some(0.0));
        assert_eq!(parse_length_pt("auto"), None);
        assert_eq!(parse_length_pt("10%"), None);
    }

    #[test]
    fn size_keywords_and_orientation() {
        let (w, h) = parse_page_size("A4 landscape").unwrap();
        assert!(w > h);
        let (w, h) = parse_page_size("letter").unwrap();
        assert!(close(w, 612.0) && close(h, 792.0));
        let (w, h) = parse_page_size("landscape").unwrap();
        assert!(close(w, 841.89) && close(h, 595.28));
        assert_eq!(parse_page_size("bogus"), None);
    }

    #[test]
    fn margin_shorthand() {
        let m = parse_margin("1cm 2cm").unwrap();
        assert!(close(m.top, 28.35) && close(m.right, 56.69));
        assert!(close(m.bottom, m.top) && close(m.left, m.right));
        assert!(parse_margin("1cm auto").is_none());
    }

    #[test]
    fn later_rules_win() {
        let sheets = vec![
            "@page { size: A5; margin: 2cm }".to_string(),
            "/* handler */ @page {\n    size: 14in 8.5in;\n    margin: 1cm;\n}\n".to_string(),
        ];
        let g = resolve_geometry(&sheets).unwrap();
        assert!(close(g.width_pt, 1008.0));
        assert!(close(g.height_pt, 612.0));
        assert!(close(g.margin.left, 28.35));
    }

    #[test]
    fn selector_rules_and_margin_boxes_ignored() {
        let css = "@page :first { size: A3 } @page { margin: 0; @top-center { content: 'x' } size: letter }";
        let g = resolve_geometry(&[css.to_string()]).unwrap();
        assert!(close(g.width_pt, 612.0));
        assert_eq!(g.margin, Edges::uniform(0.0));
    }

    #[test]
    fn default_is_a4() {
        let g = resolve_geometry(&[]).unwrap();
        assert!(close(g.width_pt, 595.28) && close(g.height_pt, 841.89));
    }
}
