//! PDF backend for [`DocumentLayout`] (printpdf, built-in Helvetica).

use printpdf::{BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument};

use super::layout::{DocumentLayout, DrawOp, FontWeight};
use super::{DocumentRenderer, ReferenceImage};
use crate::error::{DeckError, Result};

const IMAGE_DPI: f32 = 300.0;

pub struct PdfRenderer {
    title: String,
}

impl PdfRenderer {
    pub fn new(title: &str) -> Self {
        Self { title: title.to_string() }
    }
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self::new("AI Discovery Summary")
    }
}

impl DocumentRenderer for PdfRenderer {
    fn render(&self, layout: &DocumentLayout, image: Option<&ReferenceImage>) -> Result<Vec<u8>> {
        let geo = layout.geometry();
        let (w, h) = (Mm(geo.width_mm), Mm(geo.height_mm));
        let (doc, first_page, first_layer) = PdfDocument::new(self.title.as_str(), w, h, "Layer 1");
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(render_err)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(render_err)?;

        for (i, page) in layout.pages().iter().enumerate() {
            let (page_idx, layer_idx) = if i == 0 {
                (first_page, first_layer)
            } else {
                doc.add_page(w, h, format!("Layer {}", i + 1))
            };
            let layer = doc.get_page(page_idx).get_layer(layer_idx);

            for op in &page.ops {
                match op {
                    DrawOp::Text { x_mm, y_mm, size_pt, weight, text } => {
                        let font: &IndirectFontRef = match weight {
                            FontWeight::Regular => &regular,
                            FontWeight::Bold => &bold,
                        };
                        layer.use_text(pdf_safe(text), *size_pt, Mm(*x_mm), Mm(geo.height_mm - y_mm), font);
                    }
                    DrawOp::Image { x_mm, y_mm, width_mm, height_mm } => {
                        let Some(img) = image else {
                            continue;
                        };
                        let natural_width_mm = img.width_px as f32 / IMAGE_DPI * 25.4;
                        let scale = width_mm / natural_width_mm;
                        Image::from_dynamic_image(&img.image).add_to_layer(
                            layer.clone(),
                            ImageTransform {
                                translate_x: Some(Mm(*x_mm)),
                                translate_y: Some(Mm(geo.height_mm - y_mm - height_mm)),
                                scale_x: Some(scale),
                                scale_y: Some(scale),
                                dpi: Some(IMAGE_DPI),
                                ..Default::default()
                            },
                        );
                    }
                }
            }
        }

        doc.save_to_bytes().map_err(render_err)
    }
}

fn render_err(e: printpdf::Error) -> DeckError {
    DeckError::Render(e.to_string())
}

/// Built-in PDF fonts only cover Latin-1; map common typography and replace the rest.
pub(crate) fn pdf_safe(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201C}' | '\u{201D}' => out.push('"'),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            '\u{2022}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            '\u{2192}' => out.push_str("->"),
            '\u{2011}' => out.push('-'),
            c if (c as u32) < 0x100 && !c.is_control() => out.push(c),
            '\t' => out.push(' '),
            _ => out.push('?'),
        }
    }
    out
}
