//! HTML → PDF rendering engine.
//!
//! The conversion handler only knows the [`Renderer`] trait. The bundled
//! [`FlowEngine`] implements it with a small pipeline:
//!
//! 1. **Parse** – HTML string → DOM tree ([`dom`])
//! 2. **Page rules** – `@page` size and margin from the document and the
//!    supplied directives ([`page_rules`])
//! 3. **Style** – tag defaults plus inline `style` attributes ([`style`])
//! 4. **Flow** – block flow, word wrap and pagination ([`flow`])
//! 5. **Paint** – emit PDF bytes via printpdf ([`paint`])

pub mod dom;
pub mod flow;
pub mod images;
pub mod metrics;
pub mod page_rules;
pub mod paint;
pub mod style;

use crate::error::RenderError;
use crate::page::PageStyle;

/// An HTML/CSS → PDF capability.
pub trait Renderer: Send + Sync {
    /// Render `html` with the given page-level stylesheets appended after
    /// the document's own styles.
    fn render(&self, html: &str, styles: &[PageStyle]) -> Result<Vec<u8>, RenderError>;
}

/// The bundled block-flow engine.
#[derive(Debug, Clone)]
pub struct FlowEngine {
    /// Fallback document title when the HTML has no `<title>`.
    pub title: String,
}

impl Default for FlowEngine {
    fn default() -> Self {
        Self {
            title: "converted document".to_string(),
        }
    }
}

impl Renderer for FlowEngine {
    fn render(&self, html: &str, styles: &[PageStyle]) -> Result<Vec<u8>, RenderError> {
        let document = dom::parse_html(html);

        let mut sheets = dom::style_sheets(&document);
        sheets.extend(styles.iter().map(|s| s.css().to_string()));
        let geometry = page_rules::resolve_geometry(&sheets)?;
        log::debug!(
            "page geometry {:.1}x{:.1}pt, content {:.1}x{:.1}pt",
            geometry.width_pt,
            geometry.height_pt,
            geometry.content_width(),
            geometry.content_height()
        );

        let plan = flow::layout_document(&document, &geometry);
        log::debug!("laid out {} page(s)", plan.pages.len());

        let title = dom::document_title(&document).unwrap_or_else(|| self.title.clone());
        paint::render_pdf(&plan, &title)
    }
}
