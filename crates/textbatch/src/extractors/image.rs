//! Raster image extractor.

use super::append_tables;
use crate::Result;
use crate::core::config::TableConfig;
use crate::core::formats::{FileKind, image_mime_type};
use crate::extraction::table::detect_tables;
use crate::plugins::{DocumentExtractor, OcrEngine, Plugin};
use crate::types::ExtractionResult;
use std::path::Path;
use std::sync::Arc;

/// OCRs PNG, JPEG, TIFF and BMP images.
///
/// The whole image is recognized in one pass. Tables found in the engine's
/// word boxes are appended after the text when table detection is enabled.
pub struct ImageExtractor {
    ocr: Arc<dyn OcrEngine>,
    tables: TableConfig,
}

impl ImageExtractor {
    pub fn new(ocr: Arc<dyn OcrEngine>, tables: TableConfig) -> Self {
        Self { ocr, tables }
    }
}

impl Plugin for ImageExtractor {
    fn name(&self) -> &str {
        "image-extractor"
    }

    fn description(&self) -> &str {
        "Recognizes text in PNG, JPEG, TIFF and BMP images"
    }
}

impl DocumentExtractor for ImageExtractor {
    fn extract_bytes(&self, content: &[u8], source: &Path) -> Result<ExtractionResult> {
        let image = image::load_from_memory(content)?;
        tracing::debug!(
            file = %source.display(),
            mime = image_mime_type(source),
            width = image.width(),
            height = image.height(),
            engine = self.ocr.name(),
            language = self.ocr.language(),
            "Running OCR on image"
        );

        let output = self.ocr.recognize(&image)?;

        let tables = if self.tables.enabled {
            detect_tables(&output.words, &self.tables, None)
        } else {
            Vec::new()
        };

        let mut text = output.text;
        append_tables(&mut text, &tables, &self.tables.delimiter);

        Ok(ExtractionResult {
            content: text,
            kind: FileKind::Image,
            tables,
            pages: None,
        })
    }

    fn supported_kinds(&self) -> &[FileKind] {
        &[FileKind::Image]
    }
}
