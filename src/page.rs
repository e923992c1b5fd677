//! Page presets and the `@page` directive handed to the renderer.
//!
//! The preset table is fixed: `A4`, `Letter` and `Legal`. Anything else
//! resolves to A4, and any orientation other than `"landscape"` is portrait.

use std::fmt;

/// Margin applied on every side of every page.
pub const PAGE_MARGIN: &str = "1cm";

/// Page size presets accepted in the `page_size` request field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageSize {
    #[default]
    A4,
    Letter,
    Legal,
}

/// Width/height pair as CSS lengths (e.g. `210mm`, `8.5in`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageDimensions {
    pub width: &'static str,
    pub height: &'static str,
}

/// Fixed preset table, portrait orientation.
pub const PAGE_SIZES: [(PageSize, PageDimensions); 3] = [
    (
        PageSize::A4,
        PageDimensions {
            width: "210mm",
            height: "297mm",
        },
    ),
    (
        PageSize::Letter,
        PageDimensions {
            width: "8.5in",
            height: "11in",
        },
    ),
    (
        PageSize::Legal,
        PageDimensions {
            width: "8.5in",
            height: "14in",
        },
    ),
];

impl PageSize {
    /// Exact, case-sensitive lookup; unknown names fall back to A4.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Letter" => PageSize::Letter,
            "Legal" => PageSize::Legal,
            _ => PageSize::A4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PageSize::A4 => "A4",
            PageSize::Letter => "Letter",
            PageSize::Legal => "Legal",
        }
    }

    /// Portrait dimensions from [`PAGE_SIZES`].
    pub fn dimensions(self) -> PageDimensions {
        PAGE_SIZES
            .iter()
            .find(|(size, _)| *size == self)
            .map(|(_, dims)| *dims)
            .unwrap_or(PAGE_SIZES[0].1)
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Page orientation for the generated PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageOrientation {
    /// Portrait mode: height > width (default).
    #[default]
    Portrait,
    /// Landscape mode: width and height swapped.
    Landscape,
}

impl PageOrientation {
    /// Only the exact string `"landscape"` selects landscape.
    pub fn from_name(name: &str) -> Self {
        if name == "landscape" {
            PageOrientation::Landscape
        } else {
            PageOrientation::Portrait
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PageOrientation::Portrait => "portrait",
            PageOrientation::Landscape => "landscape",
        }
    }
}

impl fmt::Display for PageOrientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl PageDimensions {
    /// Apply `orientation`, swapping the pair for landscape.
    pub fn oriented(self, orientation: PageOrientation) -> Self {
        match orientation {
            PageOrientation::Portrait => self,
            PageOrientation::Landscape => PageDimensions {
                width: self.height,
                height: self.width,
            },
        }
    }
}

/// Resolve the request's raw `page_size` / `orientation` strings.
pub fn resolve_page_dimensions(page_size: &str, orientation: &str) -> PageDimensions {
    PageSize::from_name(page_size)
        .dimensions()
        .oriented(PageOrientation::from_name(orientation))
}

/// A CSS page-level style rule passed to the renderer alongside the HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageStyle {
    css: String,
}

impl PageStyle {
    pub fn from_css(css: impl Into<String>) -> Self {
        Self { css: css.into() }
    }

    pub fn css(&self) -> &str {
        &self.css
    }
}

/// Build the `@page` rule fixing page size to `width height` and a 1cm margin.
pub fn build_page_style(dimensions: PageDimensions) -> PageStyle {
    PageStyle::from_css(format!(
        "@page {{\n    size: {} {};\n    margin: {};\n}}\n",
        dimensions.width, dimensions.height, PAGE_MARGIN
    ))
}
