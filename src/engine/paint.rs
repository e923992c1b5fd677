//! PDF painter – turns a [`DocumentPlan`] into PDF bytes using `printpdf`
//! (v0.8 ops-based API) and the builtin Helvetica/Courier fonts.

use printpdf::*;

use crate::engine::flow::{DocumentPlan, PlacedItem};
use crate::engine::style;
use crate::error::RenderError;

const MM_PER_PT: f32 = 0.352778;

/// Paint every page of `plan`.
///
/// Images the PDF encoder rejects are skipped with a warning.
pub fn render_pdf(plan: &DocumentPlan, title: &str) -> Result<Vec<u8>, RenderError> {
    if plan.width_pt <= 0.0 || plan.height_pt <= 0.0 {
        return Err(RenderError::new(format!(
            "invalid page size {}x{}pt",
            plan.width_pt, plan.height_pt
        )));
    }
    let page_w = Mm(plan.width_pt * MM_PER_PT);
    let page_h = Mm(plan.height_pt * MM_PER_PT);

    let mut doc = PdfDocument::new(title);

    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    let xobjects: Vec<Option<XObjectId>> = plan
        .images
        .iter()
        .map(|img| match RawImage::decode_from_bytes(&img.bytes, &mut warnings) {
            Ok(raw) => Some(doc.add_image(&raw)),
            Err(e) => {
                log::warn!("Skipping image: PDF encode error: {e}");
                None
            }
        })
        .collect();

    let mut pages = Vec::with_capacity(plan.pages.len().max(1));
    for page in &plan.pages {
        let mut ops = Vec::new();
        for item in &page.items {
            paint_item(&mut ops, item, plan, &xobjects);
        }
        pages.push(PdfPage::new(page_w, page_h, ops));
    }
    if pages.is_empty() {
        pages.push(PdfPage::new(page_w, page_h, Vec::new()));
    }

    doc.with_pages(pages);
    Ok(doc.save(&PdfSaveOptions::default(), &mut Vec::new()))
}

fn paint_item(
    ops: &mut Vec<Op>,
    item: &PlacedItem,
    plan: &DocumentPlan,
    xobjects: &[Option<XObjectId>],
) {
    // PDF origin is bottom-left; plan coordinates are top-left.
    let flip = |y: f32| plan.height_pt - y;

    match item {
        PlacedItem::Text {
            x,
            baseline,
            text,
            font_size,
            bold,
            italic,
            mono,
            color,
            underline,
        } => {
            let font = builtin_font(*bold, *italic, *mono);
            let y = flip(*baseline);
            ops.push(Op::StartTextSection);
            ops.push(Op::SetTextCursor {
                pos: point(*x, y),
            });
            ops.push(Op::SetFontSizeBuiltinFont {
                size: Pt(*font_size),
                font,
            });
            ops.push(Op::SetLineHeight {
                lh: Pt(*font_size),
            });
            ops.push(Op::SetFillColor {
                col: pdf_color(color),
            });
            ops.push(Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(to_winlatin(text))],
                font,
            });
            ops.push(Op::EndTextSection);

            if let Some(width) = underline {
                let uy = y - font_size * 0.1;
                stroke(ops, color, 0.5, vec![point(*x, uy), point(x + width, uy)], false);
            }
        }
        PlacedItem::Rect {
            x,
            y,
            width,
            height,
            color,
        } => {
            ops.push(Op::SetFillColor {
                col: pdf_color(color),
            });
            ops.push(Op::DrawPolygon {
                polygon: Polygon {
                    rings: vec![PolygonRing {
                        points: corners(*x, flip(*y + *height), *width, *height)
                            .into_iter()
                            .map(|p| LinePoint { p, bezier: false })
                            .collect(),
                    }],
                    mode: PaintMode::Fill,
                    winding_order: WindingOrder::NonZero,
                },
            });
        }
        PlacedItem::Frame {
            x,
            y,
            width,
            height,
            color,
        } => {
            let points = corners(*x, flip(*y + *height), *width, *height).to_vec();
            stroke(ops, color, 0.5, points, true);
        }
        PlacedItem::Rule {
            x1,
            x2,
            y,
            thickness,
            color,
        } => {
            let y = flip(*y);
            stroke(ops, color, *thickness, vec![point(*x1, y), point(*x2, y)], false);
        }
        PlacedItem::Image {
            index,
            x,
            y,
            width,
            height,
        } => {
            let (Some(Some(id)), Some(img)) = (xobjects.get(*index), plan.images.get(*index))
            else {
                return;
            };
            // At dpi=72 printpdf renders 1 px = 1 pt.
            let scale_x = if img.px_width > 0 {
                width / img.px_width as f32
            } else {
                1.0
            };
            let scale_y = if img.px_height > 0 {
                height / img.px_height as f32
            } else {
                1.0
            };
            ops.push(Op::UseXobject {
                id: id.clone(),
                transform: XObjectTransform {
                    translate_x: Some(Pt(*x)),
                    translate_y: Some(Pt(flip(*y + *height))),
                    dpi: Some(72.0),
                    scale_x: Some(scale_x),
                    scale_y: Some(scale_y),
                    rotate: None,
                },
            });
        }
    }
}

fn builtin_font(bold: bool, italic: bool, mono: bool) -> BuiltinFont {
    match (mono, bold, italic) {
        (true, true, true) => BuiltinFont::CourierBoldOblique,
        (true, true, false) => BuiltinFont::CourierBold,
        (true, false, true) => BuiltinFont::CourierOblique,
        (true, false, false) => BuiltinFont::Courier,
        (false, true, true) => BuiltinFont::HelveticaBoldOblique,
        (false, true, false) => BuiltinFont::HelveticaBold,
        (false, false, true) => BuiltinFont::HelveticaOblique,
        (false, false, false) => BuiltinFont::Helvetica,
    }
}

fn pdf_color(c: &style::Color) -> Color {
    Color::Rgb(Rgb {
        r: c.r,
        g: c.g,
        b: c.b,
        icc_profile: None,
    })
}

fn point(x: f32, y: f32) -> Point {
    Point { x: Pt(x), y: Pt(y) }
}

/// Corners of a rectangle whose bottom-left PDF corner is `(x, bottom)`.
fn corners(x: f32, bottom: f32, width: f32, height: f32) -> [Point; 4] {
    [
        point(x, bottom),
        point(x + width, bottom),
        point(x + width, bottom + height),
        point(x, bottom + height),
    ]
}

fn stroke(ops: &mut Vec<Op>, color: &style::Color, thickness: f32, points: Vec<Point>, closed: bool) {
    ops.push(Op::SetOutlineColor {
        col: pdf_color(color),
    });
    ops.push(Op::SetOutlineThickness { pt: Pt(thickness) });
    ops.push(Op::DrawLine {
        line: Line {
            points: points
                .into_iter()
                .map(|p| LinePoint { p, bezier: false })
                .collect(),
            is_closed: closed,
        },
    });
}

/// Convert a UTF-8 string to raw Windows-1252 bytes then wrap in a String so
/// printpdf writes the bytes unchanged into the PDF stream (builtin fonts use
/// WinAnsiEncoding, so each glyph is one byte 0x00–0xFF).
fn to_winlatin(s: &str) -> String {
    if s.is_ascii() {
        return s.to_string();
    }
    let bytes: Vec<u8> = s
        .chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80,
            '\u{201A}' => 0x82,
            '\u{201E}' => 0x84,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2122}' => 0x99,
            '\u{00A0}' => 0x20,
            c if (c as u32) < 256 => c as u8,
            _ => b'?',
        })
        .collect();
    // SAFETY: intentionally non-UTF-8 for bytes >= 0x80; printpdf passes
    // these bytes straight to the PDF stream, decoded by WinAnsiEncoding.
    #[allow(unsafe_code)]
    unsafe {
        String::from_utf8_unchecked(bytes)
    }
}
