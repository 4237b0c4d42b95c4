//! Export pipeline: summary + illustrative image + transcript excerpts as one document.
//!
//! Order on the page:
//! 1. heading and the generated summary, wrapped and paginated;
//! 2. the reference image at content width (skipped if it cannot be loaded);
//! 3. a fresh page with the "Chat Transcript" heading;
//! 4. up to [`MAX_EXCHANGES`] user→assistant pairs from the stored transcript.

pub mod layout;
pub mod pdf;

use std::path::{Path, PathBuf};

use printpdf::image_crate::{self, DynamicImage, GenericImageView};

use crate::client::DeckApi;
use crate::error::{DeckError, Result};
use crate::session::SessionContext;
use crate::transcript::{exchanges, parse_transcript, Exchange, TranscriptStore};

pub use layout::{DocumentLayout, DrawOp, FontWeight, Page, PageGeometry};
pub use pdf::PdfRenderer;

pub const EXPORT_FILE_NAME: &str = "AI_Discovery_Summary.pdf";
pub const MAX_EXCHANGES: usize = 3;
pub const TRANSCRIPT_HEADING: &str = "Chat Transcript";
const DOCUMENT_HEADING: &str = "AI Discovery Deck - Workshop Summary";

const HEADING_PT: f32 = 16.0;
const SECTION_PT: f32 = 14.0;
const BODY_PT: f32 = 11.0;
const META_PT: f32 = 9.0;
const EXCHANGE_GAP_MM: f32 = 4.0;

/// Turns a finished layout into document bytes.
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, layout: &DocumentLayout, image: Option<&ReferenceImage>) -> Result<Vec<u8>>;
}

/// Decoded illustrative image.
pub struct ReferenceImage {
    pub image: DynamicImage,
    pub width_px: u32,
    pub height_px: u32,
}

impl ReferenceImage {
    pub fn from_image(image: DynamicImage) -> Self {
        let (width_px, height_px) = GenericImageView::dimensions(&image);
        Self { image, width_px, height_px }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| DeckError::AssetLoad(format!("{}: {}", path.display(), e)))?;
        let image = image_crate::load_from_memory(&bytes)
            .map_err(|e| DeckError::AssetLoad(format!("{}: {}", path.display(), e)))?;
        Ok(Self::from_image(image))
    }
}

/// The produced artifact, handed to the user and not retained.
#[derive(Debug, Clone)]
pub struct ExportedDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub pages: usize,
    pub exchanges: usize,
    pub image_embedded: bool,
}

/// Lay out the document. Pure: no I/O.
pub fn compose(
    summary: &str,
    image_size: Option<(u32, u32)>,
    pairs: &[Exchange],
    generated_on: &str,
    geometry: PageGeometry,
) -> DocumentLayout {
    let mut doc = DocumentLayout::new(geometry);
    doc.text_block(DOCUMENT_HEADING, HEADING_PT, FontWeight::Bold);
    doc.text_block(&format!("Generated {}", generated_on), META_PT, FontWeight::Regular);
    doc.gap(4.0);
    doc.text_block(summary, BODY_PT, FontWeight::Regular);

    if let Some((w, h)) = image_size {
        doc.gap(6.0);
        doc.image(w, h);
    }

    doc.new_page();
    doc.text_block(TRANSCRIPT_HEADING, SECTION_PT, FontWeight::Bold);
    doc.gap(4.0);

    for (i, ex) in pairs.iter().enumerate() {
        if i > 0 {
            doc.gap(EXCHANGE_GAP_MM);
        }
        doc.text_block(&format!("You: {}", ex.user), BODY_PT, FontWeight::Bold);
        doc.text_block(&format!("AI: {}", ex.assistant), BODY_PT, FontWeight::Regular);
    }
    doc
}

pub struct ExportPipeline {
    renderer: Box<dyn DocumentRenderer>,
    image_path: PathBuf,
    geometry: PageGeometry,
}

/// Clears the session's export flag however the export ends.
struct ExportGuard<'a> {
    session: &'a mut SessionContext,
}

impl<'a> ExportGuard<'a> {
    fn acquire(session: &'a mut SessionContext) -> Result<Self> {
        if session.is_exporting() {
            return Err(DeckError::Busy("export"));
        }
        session.set_exporting(true);
        Ok(Self { session })
    }
}

impl Drop for ExportGuard<'_> {
    fn drop(&mut self) {
        self.session.set_exporting(false);
    }
}

impl ExportPipeline {
    pub fn new(image_path: impl Into<PathBuf>) -> Self {
        Self {
            renderer: Box::new(PdfRenderer::default()),
            image_path: image_path.into(),
            geometry: PageGeometry::A4,
        }
    }

    pub fn with_renderer(mut self, renderer: Box<dyn DocumentRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub async fn export(
        &self,
        session: &mut SessionContext,
        api: &dyn DeckApi,
        store: &TranscriptStore,
    ) -> Result<ExportedDocument> {
        let guard = ExportGuard::acquire(session)?;

        let raw = store.load_raw().unwrap_or_else(|e| {
            tracing::warn!("export: transcript unavailable, continuing without it: {}", e);
            None
        });
        let turns = parse_transcript(raw.as_deref());

        let request = guard.session.summary_request(&turns);
        let summary = api.summarize(&request).await?;

        let image = match ReferenceImage::load(&self.image_path) {
            Ok(img) => Some(img),
            Err(e) => {
                tracing::warn!("export: skipping reference image: {}", e);
                None
            }
        };

        let pairs = exchanges(&turns, MAX_EXCHANGES);
        let generated_on = chrono::Local::now().format("%Y-%m-%d").to_string();
        let layout = compose(
            &summary,
            image.as_ref().map(|i| (i.width_px, i.height_px)),
            &pairs,
            &generated_on,
            self.geometry,
        );
        let bytes = self.renderer.render(&layout, image.as_ref())?;

        tracing::info!(
            pages = layout.pages().len(),
            exchanges = pairs.len(),
            image = image.is_some(),
            "export: document assembled"
        );
        drop(guard);

        Ok(ExportedDocument {
            file_name: EXPORT_FILE_NAME.to_string(),
            bytes,
            pages: layout.pages().len(),
            exchanges: pairs.len(),
            image_embedded: image.is_some(),
        })
    }
}
