//! DOCX extractor.

use crate::Result;
use crate::core::config::TableConfig;
use crate::core::formats::FileKind;
use crate::extraction::docx::extract_docx;
use crate::plugins::{DocumentExtractor, Plugin};
use crate::types::ExtractionResult;
use std::path::Path;

/// Microsoft Word (.docx) extractor.
///
/// Paragraphs and tables come out in document order; tables are rendered with
/// the configured cell delimiter.
pub struct DocxExtractor {
    tables: TableConfig,
}

impl DocxExtractor {
    pub fn new(tables: TableConfig) -> Self {
        Self { tables }
    }
}

impl Default for DocxExtractor {
    fn default() -> Self {
        Self::new(TableConfig::default())
    }
}

impl Plugin for DocxExtractor {
    fn name(&self) -> &str {
        "docx-extractor"
    }

    fn description(&self) -> &str {
        "Extracts paragraphs and tables from Word documents"
    }
}

impl DocumentExtractor for DocxExtractor {
    fn extract_bytes(&self, content: &[u8], source: &Path) -> Result<ExtractionResult> {
        let docx = extract_docx(content, &self.tables.delimiter)?;
        tracing::debug!(
            file = %source.display(),
            tables = docx.tables.len(),
            "Extracted DOCX"
        );

        Ok(ExtractionResult {
            content: docx.text,
            kind: FileKind::Docx,
            tables: docx.tables,
            pages: None,
        })
    }

    fn supported_kinds(&self) -> &[FileKind] {
        &[FileKind::Docx]
    }
}
