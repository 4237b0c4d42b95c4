//! Paginated layout in millimetres, independent of the document backend.
//!
//! Coordinates are measured from the top-left corner of the page; renderers flip
//! them as their format requires. Text is wrapped by estimated display width.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const PT_TO_MM: f32 = 0.3528;
/// Average glyph advance for Helvetica, as a fraction of the font size.
const AVG_GLYPH_EM: f32 = 0.5;
const LINE_SPACING: f32 = 1.4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width_mm: f32,
    pub height_mm: f32,
    pub margin_mm: f32,
}

impl PageGeometry {
    pub const A4: PageGeometry = PageGeometry { width_mm: 210.0, height_mm: 297.0, margin_mm: 15.0 };

    pub fn content_width(&self) -> f32 {
        self.width_mm - 2.0 * self.margin_mm
    }

    pub fn bottom(&self) -> f32 {
        self.height_mm - self.margin_mm
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::A4
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// `y_mm` is the baseline.
    Text { x_mm: f32, y_mm: f32, size_pt: f32, weight: FontWeight, text: String },
    /// `y_mm` is the top edge.
    Image { x_mm: f32, y_mm: f32, width_mm: f32, height_mm: f32 },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            DrawOp::Image { .. } => None,
        })
    }

    pub fn has_image(&self) -> bool {
        self.ops.iter().any(|op| matches!(op, DrawOp::Image { .. }))
    }
}

/// Cursor-driven page builder: every block is placed below the previous one and
/// overflow starts a new page.
#[derive(Debug, Clone)]
pub struct DocumentLayout {
    geometry: PageGeometry,
    pages: Vec<Page>,
    cursor_mm: f32,
}

impl DocumentLayout {
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            pages: vec![Page::default()],
            cursor_mm: geometry.margin_mm,
        }
    }

    pub fn geometry(&self) -> PageGeometry {
        self.geometry
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.cursor_mm = self.geometry.margin_mm;
    }

    pub fn gap(&mut self, mm: f32) {
        self.cursor_mm += mm;
    }

    /// Word-wrapped text block at content width; paragraphs split on `\n` and blank
    /// lines are kept as vertical space.
    pub fn text_block(&mut self, text: &str, size_pt: f32, weight: FontWeight) {
        let line_height = size_pt * PT_TO_MM * LINE_SPACING;
        let columns = columns_for(self.geometry.content_width(), size_pt);
        for paragraph in text.split('\n') {
            for line in wrap_text(paragraph, columns) {
                if self.cursor_mm + line_height > self.geometry.bottom() {
                    self.new_page();
                }
                let baseline = self.cursor_mm + size_pt * PT_TO_MM;
                if !line.is_empty() {
                    let op = DrawOp::Text {
                        x_mm: self.geometry.margin_mm,
                        y_mm: baseline,
                        size_pt,
                        weight,
                        text: line,
                    };
                    self.current_page().ops.push(op);
                }
                self.cursor_mm += line_height;
            }
        }
    }

    /// Image scaled to content width with aspect ratio kept. Starts a new page if it
    /// does not fit below the cursor; an image taller than a page is shrunk to fit.
    pub fn image(&mut self, width_px: u32, height_px: u32) {
        if width_px == 0 || height_px == 0 {
            return;
        }
        let mut width = self.geometry.content_width();
        let mut height = width * height_px as f32 / width_px as f32;
        let full_page = self.geometry.bottom() - self.geometry.margin_mm;
        if height > full_page {
            width *= full_page / height;
            height = full_page;
        }
        if self.cursor_mm + height > self.geometry.bottom() {
            self.new_page();
        }
        let op = DrawOp::Image {
            x_mm: self.geometry.margin_mm,
            y_mm: self.cursor_mm,
            width_mm: width,
            height_mm: height,
        };
        self.current_page().ops.push(op);
        self.cursor_mm += height;
    }

    fn current_page(&mut self) -> &mut Page {
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }
}

/// Approximate number of text columns that fit `width_mm` at `size_pt`.
fn columns_for(width_mm: f32, size_pt: f32) -> usize {
    let glyph_mm = size_pt * PT_TO_MM * AVG_GLYPH_EM;
    ((width_mm / glyph_mm).floor() as usize).max(1)
}

/// Greedy word wrap by display width. Words wider than `width` are hard-broken.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0usize;

    for word in text.split_whitespace() {
        let word_width = word.width();
        if !current.is_empty() && current_width + 1 + word_width <= width {
            current.push(' ');
            current.push_str(word);
            current_width += 1 + word_width;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if word_width > width {
            let mut parts = wrap_chars(word, width);
            if let Some(last) = parts.pop() {
                lines.extend(parts);
                current_width = last.width();
                current = last;
            }
        } else {
            current = word.to_string();
            current_width = word_width;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn wrap_chars(text: &str, width: usize) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_width = 0usize;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if current_width + w > width && !current.is_empty() {
            parts.push(std::mem::take(&mut current));
            current_width = 0;
        }
        current.push(ch);
        current_width += w;
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}
