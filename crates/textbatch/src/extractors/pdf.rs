//! PDF document extractor.
//!
//! Pages are handled one at a time. A page with a text layer is taken as is;
//! a page without one is rasterized and OCR'd. Tables are detected on every
//! page from positioned words and rendered after the page text. Native pages
//! take their words from the rasterizer session when it can read them
//! (pdfium character boxes) and from the content stream otherwise; OCR'd
//! pages use the engine's word boxes.
//!
//! A page that fails is logged and left out; the document fails only when
//! no page could be processed.

use super::append_tables;
use crate::core::config::{PdfConfig, TableConfig};
use crate::core::formats::FileKind;
use crate::extraction::table::{TextBox, detect_tables};
use crate::pdf::{PageRasterizer, PdfDocument, RasterSession, extract_page_images, extract_words_from_page};
use crate::plugins::{DocumentExtractor, OcrEngine, Plugin};
use crate::types::{ExtractionResult, PageContent, PageSource, Table};
use crate::{Result, TextbatchError};
use std::path::Path;
use std::sync::Arc;

/// PDF extractor with OCR fallback for pages that have no text layer.
pub struct PdfExtractor {
    config: PdfConfig,
    tables: TableConfig,
    ocr: Arc<dyn OcrEngine>,
    rasterizer: Arc<dyn PageRasterizer>,
}

/// Text found on one page, before the marker and tables are added.
struct PageText {
    source: PageSource,
    text: String,
    tables: Vec<Table>,
    image_blocks: Vec<String>,
}

impl PdfExtractor {
    pub fn new(
        config: PdfConfig,
        tables: TableConfig,
        ocr: Arc<dyn OcrEngine>,
        rasterizer: Arc<dyn PageRasterizer>,
    ) -> Self {
        Self {
            config,
            tables,
            ocr,
            rasterizer,
        }
    }

    fn native_text(&self, document: &PdfDocument<'_>, page_number: u32) -> Option<String> {
        if self.config.force_ocr {
            return None;
        }
        match document.page_text(page_number) {
            Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Ok(_) => {
                tracing::debug!(page = page_number, "No text layer, falling back to OCR");
                None
            }
            Err(err) => {
                tracing::debug!(page = page_number, error = %err, "Text layer unreadable, falling back to OCR");
                None
            }
        }
    }

    /// Open the rasterizer session on first use.
    fn open_session<'a, 's>(
        &'a self,
        document: &'a PdfDocument<'_>,
        session: &'s mut Option<Box<dyn RasterSession + 'a>>,
    ) -> Result<&'s mut (dyn RasterSession + 'a)> {
        if session.is_none() {
            *session = Some(self.rasterizer.open(document)?);
        }
        match session {
            Some(session) => Ok(&mut **session),
            None => Err(TextbatchError::extraction("Rasterizer session unavailable")),
        }
    }

    /// Positioned words of a native page.
    fn native_words<'a>(
        &'a self,
        document: &'a PdfDocument<'_>,
        session: &mut Option<Box<dyn RasterSession + 'a>>,
        page_number: u32,
    ) -> Result<Vec<TextBox>> {
        let from_session = self
            .open_session(document, session)
            .and_then(|session| session.page_words(page_number).map_err(TextbatchError::from));
        match from_session {
            Ok(Some(words)) => return Ok(words),
            Ok(None) => {}
            Err(err) => {
                tracing::debug!(
                    page = page_number,
                    rasterizer = self.rasterizer.name(),
                    error = %err,
                    "Rasterizer could not read words, using the content stream"
                );
            }
        }
        Ok(extract_words_from_page(document, page_number)?)
    }

    fn extract_native_page<'a>(
        &'a self,
        document: &'a PdfDocument<'_>,
        session: &mut Option<Box<dyn RasterSession + 'a>>,
        page_number: u32,
        text: String,
    ) -> PageText {
        let tables = if self.tables.enabled {
            match self.native_words(document, session, page_number) {
                Ok(words) => detect_tables(&words, &self.tables, Some(page_number as usize)),
                Err(err) => {
                    tracing::debug!(page = page_number, error = %err, "Skipping table detection");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let image_blocks = if self.config.ocr_embedded_images {
            self.embedded_image_blocks(document, page_number)
        } else {
            Vec::new()
        };

        PageText {
            source: PageSource::Native,
            text,
            tables,
            image_blocks,
        }
    }

    /// `Image K text:` blocks for embedded images with recognizable text.
    fn embedded_image_blocks(&self, document: &PdfDocument<'_>, page_number: u32) -> Vec<String> {
        let images = match extract_page_images(document, page_number) {
            Ok(images) => images,
            Err(err) => {
                tracing::debug!(page = page_number, error = %err, "Could not read embedded images");
                return Vec::new();
            }
        };

        let mut blocks = Vec::new();
        for (index, image) in images.iter().enumerate() {
            match self.ocr.recognize(&image.image) {
                Ok(output) if !output.is_blank() => {
                    blocks.push(format!("Image {} text:\n{}", index + 1, output.text.trim()));
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(
                        page = page_number,
                        image = %image.name,
                        error = %err,
                        "OCR failed for embedded image"
                    );
                }
            }
        }
        blocks
    }

    fn extract_ocr_page<'a>(
        &'a self,
        document: &'a PdfDocument<'_>,
        session: &mut Option<Box<dyn RasterSession + 'a>>,
        page_number: u32,
    ) -> Result<PageText> {
        let images = self.open_session(document, session)?.render_page(page_number)?;
        tracing::debug!(
            page = page_number,
            images = images.len(),
            rasterizer = self.rasterizer.name(),
            language = self.ocr.language(),
            "Running OCR on page"
        );

        let mut texts = Vec::new();
        let mut tables = Vec::new();
        for image in &images {
            let output = self.ocr.recognize(image)?;
            if self.tables.enabled {
                tables.extend(detect_tables(&output.words, &self.tables, Some(page_number as usize)));
            }
            if !output.is_blank() {
                texts.push(output.text.trim().to_string());
            }
        }

        Ok(PageText {
            source: PageSource::Ocr,
            text: texts.join("\n"),
            tables,
            image_blocks: Vec::new(),
        })
    }
}

impl Plugin for PdfExtractor {
    fn name(&self) -> &str {
        "pdf-extractor"
    }

    fn description(&self) -> &str {
        "Extracts text and tables from PDFs, with OCR for pages without a text layer"
    }
}

impl DocumentExtractor for PdfExtractor {
    fn extract_bytes(&self, content: &[u8], source: &Path) -> Result<ExtractionResult> {
        let document = PdfDocument::load(content)?;
        let page_count = document.page_count();
        tracing::debug!(file = %source.display(), pages = page_count, "Loaded PDF");

        let mut session: Option<Box<dyn RasterSession + '_>> = None;
        let mut pages = Vec::with_capacity(page_count);
        let mut blocks = Vec::with_capacity(page_count);
        let mut last_error = None;

        for page_number in document.page_numbers() {
            let outcome = match self.native_text(&document, page_number) {
                Some(text) => Ok(self.extract_native_page(&document, &mut session, page_number, text)),
                None => self.extract_ocr_page(&document, &mut session, page_number),
            };

            let page = match outcome {
                Ok(page) => page,
                Err(err) => {
                    tracing::warn!(
                        file = %source.display(),
                        page = page_number,
                        error = %err,
                        "Page failed, continuing with the rest of the document"
                    );
                    pages.push(PageContent {
                        page_number: page_number as usize,
                        source: PageSource::Failed,
                        content: String::new(),
                        tables: Vec::new(),
                    });
                    last_error = Some(err);
                    continue;
                }
            };

            if let Some(block) = render_page(page_number, &page, &self.tables.delimiter) {
                blocks.push(block);
            }
            pages.push(PageContent {
                page_number: page_number as usize,
                source: page.source,
                content: page.text,
                tables: page.tables,
            });
        }

        if !pages.is_empty() && pages.iter().all(|p| p.source == PageSource::Failed) {
            let message = format!("All {} pages failed", page_count);
            return Err(match last_error {
                Some(err) => TextbatchError::extraction_with_source(message, err),
                None => TextbatchError::extraction(message),
            });
        }

        let tables = pages.iter().flat_map(|p| p.tables.iter().cloned()).collect();

        Ok(ExtractionResult {
            content: blocks.join("\n\n"),
            kind: FileKind::Pdf,
            tables,
            pages: Some(pages),
        })
    }

    fn supported_kinds(&self) -> &[FileKind] {
        &[FileKind::Pdf]
    }
}

/// Marker line, text, image blocks and tables of a page.
///
/// `None` when the page produced nothing at all.
fn render_page(page_number: u32, page: &PageText, delimiter: &str) -> Option<String> {
    if page.text.is_empty() && page.tables.is_empty() && page.image_blocks.is_empty() {
        return None;
    }

    let mut body = page.text.clone();
    for block in &page.image_blocks {
        if !body.is_empty() {
            body.push_str("\n\n");
        }
        body.push_str(block);
    }
    append_tables(&mut body, &page.tables, delimiter);

    let marker = match page.source {
        PageSource::Ocr => format!("--- Page {} (OCR) ---", page_number),
        _ => format!("--- Page {} ---", page_number),
    };
    Some(format!("{}\n{}", marker, body))
}
