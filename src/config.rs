//! Stamp placement configuration.

use crate::geometry::Rect;

/// Which pages of the document receive the inserted content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageSubset {
    /// Every page
    #[default]
    All,
    /// Only the first page
    First,
    /// Only the last page
    Last,
}

impl PageSubset {
    /// The 1-based page numbers selected out of `page_count`.
    pub fn select(&self, page_count: usize) -> Vec<usize> {
        match self {
            PageSubset::All => (1..=page_count).collect(),
            PageSubset::First => {
                if page_count >= 1 {
                    vec![1]
                } else {
                    vec![]
                }
            },
            PageSubset::Last => {
                if page_count >= 1 {
                    vec![page_count]
                } else {
                    vec![]
                }
            },
        }
    }
}

/// Anchor position of inserted content on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    /// Page center
    #[default]
    Center,
    /// Centered horizontally at the top edge
    TopCenter,
    /// Centered horizontally at the bottom edge
    BottomCenter,
    /// Top-left corner
    TopLeft,
    /// Top-right corner
    TopRight,
    /// Bottom-left corner
    BottomLeft,
    /// Bottom-right corner
    BottomRight,
}

impl Anchor {
    /// Absolute lower-left position for content of the given extent placed
    /// on `page`.
    pub fn position(&self, page: &Rect, width: f32, height: f32) -> (f32, f32) {
        let center_x = page.llx + (page.width() - width) / 2.0;
        let center_y = page.lly + (page.height() - height) / 2.0;
        let left = page.llx;
        let right = page.urx - width;
        let bottom = page.lly;
        let top = page.ury - height;
        match self {
            Anchor::Center => (center_x, center_y),
            Anchor::TopCenter => (center_x, top),
            Anchor::BottomCenter => (center_x, bottom),
            Anchor::TopLeft => (left, top),
            Anchor::TopRight => (right, top),
            Anchor::BottomLeft => (left, bottom),
            Anchor::BottomRight => (right, bottom),
        }
    }
}

/// Placement options for one watermark image.
#[derive(Debug, Clone, Copy, Default)]
pub struct StampConfig {
    /// Page selection
    pub pages: PageSubset,
    /// Anchor position on each selected page
    pub anchor: Anchor,
    /// Rotation in degrees applied to the inserted content
    pub rotate_degrees: f32,
}

impl StampConfig {
    /// Default placement: all pages, centered, no rotation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the pages to stamp.
    pub fn with_pages(mut self, pages: PageSubset) -> Self {
        self.pages = pages;
        self
    }

    /// Set the anchor position.
    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    /// Set the rotation in degrees.
    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotate_degrees = degrees;
        self
    }
}
