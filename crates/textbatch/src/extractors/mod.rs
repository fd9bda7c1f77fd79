//! Built-in document extractors.
//!
//! One extractor per supported [`FileKind`](crate::FileKind). All of them
//! implement the `DocumentExtractor` plugin trait and are assembled into an
//! [`ExtractorRegistry`] by [`default_registry`].

use crate::Result;
use crate::core::config::BatchConfig;
use crate::extraction::table::render_tables;
use crate::pdf::PageRasterizer;
use crate::plugins::{ExtractorRegistry, OcrEngine};
use crate::types::Table;
use std::sync::Arc;

pub mod docx;
pub mod image;
pub mod pdf;
pub mod text;

pub use docx::DocxExtractor;
pub use image::ImageExtractor;
pub use pdf::PdfExtractor;
pub use text::TextExtractor;

/// Build a registry holding the four built-in extractors.
///
/// The OCR engine and the page rasterizer are shared by the image and PDF
/// extractors.
pub fn default_registry(
    config: &BatchConfig,
    ocr: Arc<dyn OcrEngine>,
    rasterizer: Arc<dyn PageRasterizer>,
) -> Result<ExtractorRegistry> {
    let mut registry = ExtractorRegistry::new();
    registry.register(Arc::new(TextExtractor::new()))?;
    registry.register(Arc::new(DocxExtractor::new(config.tables.clone())))?;
    registry.register(Arc::new(ImageExtractor::new(Arc::clone(&ocr), config.tables.clone())))?;
    registry.register(Arc::new(PdfExtractor::new(
        config.pdf.clone(),
        config.tables.clone(),
        ocr,
        rasterizer,
    )))?;
    Ok(registry)
}

/// Append rendered tables to `text`, separated by a blank line.
pub(crate) fn append_tables(text: &mut String, tables: &[Table], delimiter: &str) {
    if tables.is_empty() {
        return;
    }
    if !text.is_empty() {
        text.push_str("\n\n");
    }
    text.push_str(&render_tables(tables, delimiter));
}
