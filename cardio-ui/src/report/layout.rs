//! Page layout for the PDF report
//!
//! Positions are in PDF points measured from the top-left corner of an A4
//! page; the renderer flips them. Content flows down a cursor and breaks to a
//! new page whenever the next block would cross into the footer band.

use crate::charts::RasterImage;

pub const PAGE_WIDTH: f32 = 595.0;
pub const PAGE_HEIGHT: f32 = 842.0;
pub const MARGIN: f32 = 50.0;
/// Reserved at the bottom of every page for the footer
pub const FOOTER_BAND: f32 = 46.0;

pub type Rgb = (f32, f32, f32);

pub const TEXT_COLOR: Rgb = (0.07, 0.09, 0.15);
pub const MUTED_COLOR: Rgb = (0.42, 0.45, 0.50);
pub const RULE_COLOR: Rgb = (0.82, 0.84, 0.86);

/// Line advance as a multiple of the font size
const LEADING: f32 = 1.35;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// `y` is the baseline
    Text {
        x: f32,
        y: f32,
        size: f32,
        font: Font,
        color: Rgb,
        text: String,
    },
    /// `y` is the top edge; `image` indexes [`ReportLayout::images`]
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        image: usize,
    },
    Rule {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        width: f32,
        color: Rgb,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub elements: Vec<Element>,
}

impl Page {
    /// All text on the page, in drawing order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().filter_map(|e| match e {
            Element::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ReportLayout {
    pages: Vec<Page>,
    images: Vec<RasterImage>,
    cursor: f32,
}

impl Default for ReportLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportLayout {
    pub fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            images: Vec::new(),
            cursor: MARGIN,
        }
    }

    pub fn content_width() -> f32 {
        PAGE_WIDTH - 2.0 * MARGIN
    }

    /// Lowest y content may reach
    pub fn content_bottom() -> f32 {
        PAGE_HEIGHT - MARGIN - FOOTER_BAND
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn images(&self) -> &[RasterImage] {
        &self.images
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn cursor(&self) -> f32 {
        self.cursor
    }

    fn current(&mut self) -> &mut Page {
        if self.pages.is_empty() {
            self.pages.push(Page::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    pub fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.cursor = MARGIN;
    }

    /// Break to a new page unless `height` more points fit on this one
    pub fn ensure_space(&mut self, height: f32) {
        let at_top = self.cursor <= MARGIN;
        if !at_top && self.cursor + height > Self::content_bottom() {
            self.new_page();
        }
    }

    pub fn gap(&mut self, height: f32) {
        self.cursor += height;
    }

    /// One line of text at the left margin
    pub fn text(&mut self, text: impl Into<String>, size: f32, font: Font, color: Rgb) {
        self.text_at(MARGIN, text, size, font, color);
    }

    pub fn text_at(&mut self, x: f32, text: impl Into<String>, size: f32, font: Font, color: Rgb) {
        let advance = size * LEADING;
        self.ensure_space(advance);
        let baseline = self.cursor + size;
        self.current().elements.push(Element::Text {
            x,
            y: baseline,
            size,
            font,
            color,
            text: text.into(),
        });
        self.cursor += advance;
    }

    /// Several texts sharing one line, each at its own x
    pub fn columns(&mut self, cells: &[(f32, String, Font, Rgb)], size: f32) {
        let advance = size * LEADING;
        self.ensure_space(advance);
        let baseline = self.cursor + size;
        let elements: Vec<Element> = cells
            .iter()
            .map(|(x, text, font, color)| Element::Text {
                x: *x,
                y: baseline,
                size,
                font: *font,
                color: *color,
                text: text.clone(),
            })
            .collect();
        self.current().elements.extend(elements);
        self.cursor += advance;
    }

    /// Full-width horizontal rule
    pub fn rule(&mut self) {
        self.ensure_space(8.0);
        let y = self.cursor + 4.0;
        self.current().elements.push(Element::Rule {
            x1: MARGIN,
            y1: y,
            x2: PAGE_WIDTH - MARGIN,
            y2: y,
            width: 0.75,
            color: RULE_COLOR,
        });
        self.cursor += 8.0;
    }

    /// Image at content width, scaled to preserve aspect ratio
    ///
    /// An image taller than a whole page is shrunk to fit one.
    pub fn image(&mut self, image: RasterImage) {
        let max_height = Self::content_bottom() - MARGIN;
        let mut width = Self::content_width();
        let mut height = width * image.aspect_ratio();
        if height > max_height {
            width *= max_height / height;
            height = max_height;
        }

        self.ensure_space(height);
        let index = self.images.len();
        self.images.push(image);
        let y = self.cursor;
        self.current().elements.push(Element::Image {
            x: MARGIN + (Self::content_width() - width) / 2.0,
            y,
            width,
            height,
            image: index,
        });
        self.cursor += height;
    }

    /// Add the disclaimer and "Page X of Y" to every page
    ///
    /// Runs once, after all content is placed, so Y is final.
    pub fn stamp_footer(&mut self, disclaimer: &str) {
        let total = self.pages.len();
        let rule_y = PAGE_HEIGHT - MARGIN - FOOTER_BAND + 14.0;
        let text_y = PAGE_HEIGHT - MARGIN - 8.0;

        for (index, page) in self.pages.iter_mut().enumerate() {
            page.elements.push(Element::Rule {
                x1: MARGIN,
                y1: rule_y,
                x2: PAGE_WIDTH - MARGIN,
                y2: rule_y,
                width: 0.5,
                color: RULE_COLOR,
            });
            page.elements.push(Element::Text {
                x: MARGIN,
                y: text_y,
                size: 8.0,
                font: Font::Regular,
                color: MUTED_COLOR,
                text: disclaimer.to_string(),
            });
            page.elements.push(Element::Text {
                x: PAGE_WIDTH - MARGIN - 58.0,
                y: text_y,
                size: 8.0,
                font: Font::Regular,
                color: MUTED_COLOR,
                text: page_label(index + 1, total),
            });
        }
    }
}

pub fn page_label(page: usize, total: usize) -> String {
    format!("Page {} of {}", page, total)
}
