//! Block flow and pagination.
//!
//! Walks the DOM top to bottom, breaking inline content into lines and
//! stacking blocks vertically. When the next line, row or image does not fit
//! above the bottom margin a new page starts. Handles:
//! - Mixed inline styles on one line, with `text-align`
//! - Collapsed vertical margins between blocks
//! - `page-break-before` / `page-break-after`
//! - Lists with bullet or number markers
//! - Tables with equal-width columns; rows never split across pages
//! - Block background colours, including blocks that span pages
//!
//! All coordinates are points measured from the top-left page corner.

use std::collections::HashMap;

use crate::engine::dom::{DomNode, ElementNode, Tag};
use crate::engine::images::{self, DecodedImage};
use crate::engine::metrics::{self, ASCENT};
use crate::engine::page_rules::PageGeometry;
use crate::engine::style::{resolve_style, Color, ComputedStyle, TextAlign};

/// Inner padding of table cells.
const CELL_PADDING: f32 = 4.0;
/// Gap between a list marker and the item text.
const MARKER_GAP: f32 = 6.0;
const EPSILON: f32 = 0.01;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Everything the painter needs: page size, per-page items and the images
/// they reference.
#[derive(Debug, Clone)]
pub struct DocumentPlan {
    pub width_pt: f32,
    pub height_pt: f32,
    /// Never empty.
    pub pages: Vec<PagePlan>,
    pub images: Vec<DecodedImage>,
}

#[derive(Debug, Clone, Default)]
pub struct PagePlan {
    /// Paint order.
    pub items: Vec<PlacedItem>,
}

/// A positioned drawing primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum PlacedItem {
    Text {
        x: f32,
        baseline: f32,
        text: String,
        font_size: f32,
        bold: bool,
        italic: bool,
        /// Set in Courier instead of Helvetica.
        mono: bool,
        color: Color,
        /// Underline length, if underlined.
        underline: Option<f32>,
    },
    /// Filled rectangle.
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
    },
    /// Stroked rectangle outline.
    Frame {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
    },
    /// Horizontal rule.
    Rule {
        x1: f32,
        x2: f32,
        y: f32,
        thickness: f32,
        color: Color,
    },
    Image {
        /// Index into [`DocumentPlan::images`].
        index: usize,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

impl PlacedItem {
    fn shift_down(&mut self, dy: f32) {
        match self {
            PlacedItem::Text { baseline, .. } => *baseline += dy,
            PlacedItem::Rect { y, .. }
            | PlacedItem::Frame { y, .. }
            | PlacedItem::Rule { y, .. }
            | PlacedItem::Image { y, .. } => *y += dy,
        }
    }
}

/// Lay out a parsed document on pages of the given geometry.
pub fn layout_document(document: &[DomNode], geometry: &PageGeometry) -> DocumentPlan {
    let mut flow = Flow::paged(geometry);
    flow.layout_nodes(
        document,
        &ComputedStyle::default(),
        geometry.margin.left,
        geometry.content_width(),
    );
    let (pages, images) = flow.finish();
    DocumentPlan {
        width_pt: geometry.width_pt,
        height_pt: geometry.height_pt,
        pages,
        images: images.images,
    }
}

// ---------------------------------------------------------------------------
// Flow state
// ---------------------------------------------------------------------------

/// Decoded images, deduplicated by `src`.
#[derive(Debug, Default)]
struct ImageSet {
    images: Vec<DecodedImage>,
    by_src: HashMap<String, Option<usize>>,
}

impl ImageSet {
    fn get_or_load(&mut self, src: &str) -> Option<usize> {
        if let Some(known) = self.by_src.get(src) {
            return *known;
        }
        let index = match images::load(src) {
            Ok(img) => {
                self.images.push(img);
                Some(self.images.len() - 1)
            }
            Err(e) => {
                log::warn!("Skipping image: {e}");
                None
            }
        };
        self.by_src.insert(src.to_string(), index);
        index
    }
}

/// Position in the flow, used to find items added after a point.
#[derive(Debug, Clone, Copy)]
struct Mark {
    page: usize,
    item: usize,
    y: f32,
}

struct Flow {
    /// `false` for table cells, which are measured on one endless page.
    paged: bool,
    top: f32,
    bottom: f32,
    pages: Vec<PagePlan>,
    items: Vec<PlacedItem>,
    y: f32,
    pending_margin: f32,
    images: ImageSet,
}

impl Flow {
    fn paged(geometry: &PageGeometry) -> Self {
        Self {
            paged: true,
            top: geometry.margin.top,
            bottom: geometry.content_bottom(),
            pages: Vec::new(),
            items: Vec::new(),
            y: geometry.margin.top,
            pending_margin: 0.0,
            images: ImageSet::default(),
        }
    }

    fn measuring(images: ImageSet) -> Self {
        Self {
            paged: false,
            top: 0.0,
            bottom: f32::INFINITY,
            pages: Vec::new(),
            items: Vec::new(),
            y: 0.0,
            pending_margin: 0.0,
            images,
        }
    }

    fn finish(mut self) -> (Vec<PagePlan>, ImageSet) {
        // A trailing forced break leaves an empty page behind; drop it.
        if !self.items.is_empty() || self.pages.is_empty() {
            self.pages.push(PagePlan { items: self.items });
        }
        (self.pages, self.images)
    }

    fn break_page(&mut self) {
        if !self.paged {
            return;
        }
        self.pages.push(PagePlan {
            items: std::mem::take(&mut self.items),
        });
        self.y = self.top;
        self.pending_margin = 0.0;
    }

    /// Forced break; a no-op at the very top of an empty page.
    fn break_page_if_used(&mut self) {
        if !self.items.is_empty() || self.y > self.top + EPSILON {
            self.break_page();
        }
    }

    fn add_margin(&mut self, margin: f32) {
        self.pending_margin = self.pending_margin.max(margin);
    }

    /// Apply pending margin and return the current position.
    fn settle(&mut self) -> Mark {
        self.y += std::mem::take(&mut self.pending_margin);
        if self.y > self.bottom {
            self.break_page();
        }
        self.mark()
    }

    fn mark(&self) -> Mark {
        Mark {
            page: self.pages.len(),
            item: self.items.len(),
            y: self.y,
        }
    }

    /// Make room for something `height` tall and return its top y. Breaks
    /// the page unless already at the top, where oversized content is
    /// placed anyway and overflows.
    fn reserve(&mut self, height: f32) -> f32 {
        self.settle();
        if self.y + height > self.bottom + EPSILON && self.y > self.top + EPSILON {
            self.break_page();
        }
        self.y
    }

    fn page_items_mut(&mut self, page: usize) -> &mut Vec<PlacedItem> {
        match self.pages.get_mut(page) {
            Some(p) => &mut p.items,
            None => &mut self.items,
        }
    }

    // -----------------------------------------------------------------------
    // Blocks
    // -----------------------------------------------------------------------

    fn layout_nodes(&mut self, nodes: &[DomNode], style: &ComputedStyle, x: f32, width: f32) {
        let mut inline = InlineBuffer::default();
        for node in nodes {
            match node {
                DomNode::Text(text) => inline.push_text(text, style),
                DomNode::Element(el) if el.tag.is_inline() => inline.collect(el, style),
                DomNode::Element(el) => {
                    self.layout_inline(&mut inline, style, x, width);
                    self.layout_block(el, style, x, width, None);
                }
            }
        }
        self.layout_inline(&mut inline, style, x, width);
    }

    fn layout_block(
        &mut self,
        el: &ElementNode,
        parent: &ComputedStyle,
        x: f32,
        width: f32,
        marker: Option<String>,
    ) {
        let style = resolve_style(el, parent);
        if style.hidden {
            return;
        }
        if style.page_break_before {
            self.break_page_if_used();
        }
        self.add_margin(style.margin_top);
        let start = self.settle();

        let inner_x = x + style.padding_left;
        let inner_width = (width - style.padding_left).max(1.0);
        match el.tag {
            Tag::Hr => self.place_rule(x, width),
            Tag::Img => self.place_image(el, &style, x, width),
            Tag::Pre => self.layout_pre(el, &style, inner_x, inner_width),
            Tag::Table => self.layout_table(el, &style, inner_x, inner_width),
            Tag::Ul | Tag::Ol => self.layout_list(el, &style, inner_x, inner_width),
            _ => self.layout_nodes(&el.children, &style, inner_x, inner_width),
        }

        if let Some(marker) = marker {
            self.place_marker(start, &marker, &style, inner_x);
        }
        if let Some(color) = style.background_color {
            self.paint_background(start, color, x, width);
        }

        self.add_margin(style.margin_bottom);
        if style.page_break_after {
            self.break_page_if_used();
        }
    }

    /// Fill `x..x+width` from `start` to the current position, behind
    /// everything placed since `start`.
    fn paint_background(&mut self, start: Mark, color: Color, x: f32, width: f32) {
        let rect = |y: f32, height: f32| PlacedItem::Rect {
            x,
            y,
            width,
            height,
            color,
        };
        let current = self.pages.len();
        if start.page == current {
            if self.y > start.y {
                self.items.insert(start.item, rect(start.y, self.y - start.y));
            }
            return;
        }
        let (top, bottom) = (self.top, self.bottom);
        self.pages[start.page]
            .items
            .insert(start.item, rect(start.y, bottom - start.y));
        for page in &mut self.pages[start.page + 1..] {
            page.items.insert(0, rect(top, bottom - top));
        }
        if self.y > top {
            self.items.insert(0, rect(top, self.y - top));
        }
    }

    fn place_rule(&mut self, x: f32, width: f32) {
        let y = self.reserve(1.0);
        self.items.push(PlacedItem::Rule {
            x1: x,
            x2: x + width,
            y: y + 0.5,
            thickness: 0.75,
            color: Color::GRAY,
        });
        self.y += 1.0;
    }

    fn place_image(&mut self, el: &ElementNode, style: &ComputedStyle, x: f32, width: f32) {
        let Some(src) = el.src() else {
            return;
        };
        let Some(index) = self.images.get_or_load(src) else {
            return;
        };
        let (natural_w, natural_h) = self.images.images[index].natural_size_pt();
        let (w, h) = match images::declared_size(el) {
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) if natural_w > 0.0 => (w, w * natural_h / natural_w),
            (None, Some(h)) if natural_h > 0.0 => (h * natural_w / natural_h, h),
            _ => (natural_w, natural_h),
        };

        // Shrink to fit the column and, when paged, the page.
        let mut scale = if w > width { width / w } else { 1.0 };
        if self.paged && h * scale > self.bottom - self.top {
            scale = (self.bottom - self.top) / h;
        }
        let (w, h) = (w * scale, h * scale);

        let y = self.reserve(h);
        let x = match style.text_align {
            TextAlign::Left => x,
            TextAlign::Center => x + (width - w) / 2.0,
            TextAlign::Right => x + width - w,
        };
        self.items.push(PlacedItem::Image {
            index,
            x,
            y,
            width: w,
            height: h,
        });
        self.y += h;
    }

    fn layout_pre(&mut self, el: &ElementNode, style: &ComputedStyle, x: f32, width: f32) {
        let text = el.text_content().replace("\r\n", "\n").replace('\t', "    ");
        let text = text.strip_prefix('\n').unwrap_or(&text);
        let text = text.strip_suffix('\n').unwrap_or(text);
        let line_height = style.font_size * style.line_height;
        let per_line = ((width / (metrics::MONO_ADVANCE * style.font_size)) as usize).max(1);

        for source_line in text.split('\n') {
            let chars: Vec<char> = source_line.chars().collect();
            let pieces: Vec<String> = if chars.is_empty() {
                vec![String::new()]
            } else {
                chars.chunks(per_line).map(|c| c.iter().collect()).collect()
            };
            for piece in pieces {
                let top = self.reserve(line_height);
                if !piece.trim().is_empty() {
                    let baseline = top + (line_height - style.font_size) / 2.0
                        + style.font_size * ASCENT;
                    let underline = style
                        .underline
                        .then(|| metrics::mono_width(&piece, style.font_size));
                    self.items.push(PlacedItem::Text {
                        x,
                        baseline,
                        text: piece,
                        font_size: style.font_size,
                        bold: style.bold,
                        italic: style.italic,
                        mono: true,
                        color: style.color,
                        underline,
                    });
                }
                self.y += line_height;
            }
        }
    }

    fn layout_list(&mut self, el: &ElementNode, style: &ComputedStyle, x: f32, width: f32) {
        let ordered = el.tag == Tag::Ol;
        let mut number: i64 = el
            .attr("start")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(1);
        for child in &el.children {
            match child {
                DomNode::Element(item) if item.tag == Tag::Li => {
                    let marker = if ordered {
                        format!("{number}.")
                    } else {
                        "\u{2022}".to_string()
                    };
                    number = number.saturating_add(1);
                    self.layout_block(item, style, x, width, Some(marker));
                }
                other => self.layout_nodes(std::slice::from_ref(other), style, x, width),
            }
        }
    }

    /// Put a list marker left of the first line placed since `start`.
    fn place_marker(&mut self, start: Mark, marker: &str, style: &ComputedStyle, x: f32) {
        let current = self.pages.len();
        let first_baseline = (start.page..=current).find_map(|page| {
            let items = if page == current {
                &self.items
            } else {
                &self.pages[page].items
            };
            let from = if page == start.page { start.item } else { 0 };
            items.get(from..)?.iter().find_map(|item| match item {
                PlacedItem::Text { baseline, .. } => Some((page, *baseline)),
                _ => None,
            })
        });
        let (page, baseline) = first_baseline.unwrap_or((
            start.page,
            start.y + style.font_size * ASCENT,
        ));
        let marker_width = metrics::text_width(marker, style.font_size, false);
        self.page_items_mut(page).push(PlacedItem::Text {
            x: x - marker_width - MARKER_GAP,
            baseline,
            text: marker.to_string(),
            font_size: style.font_size,
            bold: false,
            italic: false,
            mono: false,
            color: style.color,
            underline: None,
        });
    }

    // -----------------------------------------------------------------------
    // Tables
    // -----------------------------------------------------------------------

    fn layout_table(&mut self, el: &ElementNode, style: &ComputedStyle, x: f32, width: f32) {
        let rows = table_rows(el, style);
        let columns = rows.iter().map(|(_, cells)| cells.len()).max().unwrap_or(0);
        if columns == 0 {
            return;
        }
        let col_width = width / columns as f32;
        let content_width = (col_width - 2.0 * CELL_PADDING).max(1.0);

        for (row_style, cells) in &rows {
            let mut measured = Vec::with_capacity(cells.len());
            for cell in cells {
                let mut cell_style = resolve_style(cell, row_style);
                if cell.tag == Tag::Th && cell_style.background_color.is_none() {
                    cell_style.background_color = Some(Color::LIGHT_GRAY);
                }
                let mut sub = Flow::measuring(std::mem::take(&mut self.images));
                if !cell_style.hidden {
                    sub.layout_nodes(&cell.children, &cell_style, 0.0, content_width);
                }
                let height = sub.y;
                let (mut pages, images) = sub.finish();
                self.images = images;
                let items = pages.pop().map(|p| p.items).unwrap_or_default();
                measured.push((cell_style.background_color, items, height));
            }

            let row_height = measured
                .iter()
                .map(|(_, _, h)| *h)
                .fold(0.0f32, f32::max)
                + 2.0 * CELL_PADDING;
            let y = self.reserve(row_height);

            for (i, (background, items, _)) in measured.into_iter().enumerate() {
                let cell_x = x + i as f32 * col_width;
                if let Some(color) = background {
                    self.items.push(PlacedItem::Rect {
                        x: cell_x,
                        y,
                        width: col_width,
                        height: row_height,
                        color,
                    });
                }
                for mut item in items {
                    item.shift_down(y + CELL_PADDING);
                    shift_right(&mut item, cell_x + CELL_PADDING);
                    self.items.push(item);
                }
                self.items.push(PlacedItem::Frame {
                    x: cell_x,
                    y,
                    width: col_width,
                    height: row_height,
                    color: Color::GRAY,
                });
            }
            self.y += row_height;
        }
    }

    // -----------------------------------------------------------------------
    // Inline content
    // -----------------------------------------------------------------------

    /// Break buffered inline content into lines and place them.
    fn layout_inline(
        &mut self,
        inline: &mut InlineBuffer,
        block: &ComputedStyle,
        x: f32,
        width: f32,
    ) {
        let buffer = std::mem::take(inline);
        if !buffer.has_content() {
            return;
        }
        let empty_height = block.font_size * block.line_height;

        for line in break_lines(&buffer, width) {
            let (height, ascent) = line.extent(&buffer.styles, empty_height);
            let top = self.reserve(height);
            let offset = match block.text_align {
                TextAlign::Left => 0.0,
                TextAlign::Center => ((width - line.width) / 2.0).max(0.0),
                TextAlign::Right => (width - line.width).max(0.0),
            };
            for segment in line.segments {
                let s = &buffer.styles[segment.style];
                self.items.push(PlacedItem::Text {
                    x: x + offset + segment.x,
                    baseline: top + ascent,
                    text: segment.text,
                    font_size: s.font_size,
                    bold: s.bold,
                    italic: s.italic,
                    mono: false,
                    color: s.color,
                    underline: s.underline.then_some(segment.width),
                });
            }
            self.y += height;
        }
    }
}

fn shift_right(item: &mut PlacedItem, dx: f32) {
    match item {
        PlacedItem::Text { x, .. }
        | PlacedItem::Rect { x, .. }
        | PlacedItem::Frame { x, .. }
        | PlacedItem::Image { x, .. } => *x += dx,
        PlacedItem::Rule { x1, x2, .. } => {
            *x1 += dx;
            *x2 += dx;
        }
    }
}

/// Rows of a table with their cells, looking through `thead`/`tbody`/`tfoot`.
fn table_rows<'a>(
    table: &'a ElementNode,
    style: &ComputedStyle,
) -> Vec<(ComputedStyle, Vec<&'a ElementNode>)> {
    let mut rows = Vec::new();
    collect_rows(&table.children, style, &mut rows);
    rows
}

fn collect_rows<'a>(
    nodes: &'a [DomNode],
    parent: &ComputedStyle,
    rows: &mut Vec<(ComputedStyle, Vec<&'a ElementNode>)>,
) {
    for node in nodes {
        let DomNode::Element(el) = node else {
            continue;
        };
        let style = resolve_style(el, parent);
        if style.hidden {
            continue;
        }
        match el.tag {
            Tag::TableSection => collect_rows(&el.children, &style, rows),
            Tag::Tr => {
                let cells = el
                    .children
                    .iter()
                    .filter_map(|c| match c {
                        DomNode::Element(cell) if matches!(cell.tag, Tag::Td | Tag::Th) => {
                            Some(cell)
                        }
                        _ => None,
                    })
                    .collect();
                rows.push((style, cells));
            }
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Line breaking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Inline {
    Word {
        text: String,
        style: usize,
        space_before: bool,
    },
    Break,
}

/// Inline content of one anonymous block, with the distinct styles it uses.
#[derive(Debug, Default)]
struct InlineBuffer {
    styles: Vec<ComputedStyle>,
    items: Vec<Inline>,
    pending_space: bool,
}

impl InlineBuffer {
    fn has_content(&self) -> bool {
        !self.items.is_empty()
    }

    fn style_index(&mut self, style: &ComputedStyle) -> usize {
        match self.styles.iter().rposition(|s| s == style) {
            Some(i) => i,
            None => {
                self.styles.push(style.clone());
                self.styles.len() - 1
            }
        }
    }

    fn push_text(&mut self, text: &str, style: &ComputedStyle) {
        let mut words = text.split(|c: char| c.is_ascii_whitespace()).peekable();
        if text.starts_with(|c: char| c.is_ascii_whitespace()) {
            self.pending_space = true;
        }
        let index = self.style_index(style);
        while let Some(word) = words.next() {
            if !word.is_empty() {
                self.items.push(Inline::Word {
                    text: word.to_string(),
                    style: index,
                    space_before: self.pending_space,
                });
                self.pending_space = false;
            }
            if words.peek().is_some() {
                self.pending_space = true;
            }
        }
    }

    fn push_break(&mut self) {
        self.items.push(Inline::Break);
        self.pending_space = false;
    }

    /// Add an inline element and everything inside it.
    fn collect(&mut self, el: &ElementNode, parent: &ComputedStyle) {
        let style = resolve_style(el, parent);
        if style.hidden {
            return;
        }
        if el.tag == Tag::Br {
            self.push_break();
            return;
        }
        for child in &el.children {
            match child {
                DomNode::Text(text) => self.push_text(text, &style),
                DomNode::Element(inner) => self.collect(inner, &style),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Segment {
    style: usize,
    text: String,
    x: f32,
    width: f32,
}

#[derive(Debug, Clone, Default)]
struct Line {
    segments: Vec<Segment>,
    width: f32,
}

impl Line {
    fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    fn push(&mut self, style: usize, space: f32, text: &str, width: f32) {
        match self.segments.last_mut() {
            Some(last) if last.style == style => {
                if space > 0.0 {
                    last.text.push(' ');
                }
                last.text.push_str(text);
                last.width += space + width;
            }
            _ => self.segments.push(Segment {
                style,
                text: text.to_string(),
                x: self.width + space,
                width,
            }),
        }
        self.width += space + width;
    }

    /// Line height and baseline offset from the line top.
    fn extent(&self, styles: &[ComputedStyle], empty_height: f32) -> (f32, f32) {
        if self.segments.is_empty() {
            return (empty_height, empty_height * ASCENT);
        }
        self.segments.iter().fold((0.0f32, 0.0f32), |(h, a), seg| {
            let s = &styles[seg.style];
            let line_height = s.font_size * s.line_height;
            let ascent = (line_height - s.font_size) / 2.0 + s.font_size * ASCENT;
            (h.max(line_height), a.max(ascent))
        })
    }
}

fn break_lines(buffer: &InlineBuffer, width: f32) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut line = Line::default();

    for item in &buffer.items {
        let (text, style_index, space_before) = match item {
            Inline::Break => {
                lines.push(std::mem::take(&mut line));
                continue;
            }
            Inline::Word {
                text,
                style,
                space_before,
            } => (text, *style, *space_before),
        };
        let style = &buffer.styles[style_index];
        let word_width = metrics::text_width(text, style.font_size, style.bold);
        let mut space = if space_before && !line.is_empty() {
            metrics::text_width(" ", style.font_size, style.bold)
        } else {
            0.0
        };

        if !line.is_empty() && line.width + space + word_width > width {
            lines.push(std::mem::take(&mut line));
            space = 0.0;
        }
        if word_width <= width {
            line.push(style_index, space, text, word_width);
            continue;
        }
        for piece in metrics::split_to_width(text, style.font_size, style.bold, width) {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            let piece_width = metrics::text_width(&piece, style.font_size, style.bold);
            line.push(style_index, 0.0, &piece, piece_width);
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}
