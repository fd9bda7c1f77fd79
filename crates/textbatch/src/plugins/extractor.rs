//! Document extractor plugin trait.

use crate::Result;
use crate::core::formats::FileKind;
use crate::plugins::Plugin;
use crate::types::ExtractionResult;
use std::path::Path;

/// Converts the bytes of one source file into text.
///
/// Implementations are stateless between calls; everything they need
/// (configuration, OCR engine) is handed to them at construction.
pub trait DocumentExtractor: Plugin {
    /// Extract text from the file content.
    ///
    /// `source` is the path the bytes were read from. It is used for log
    /// fields and error messages only.
    fn extract_bytes(&self, content: &[u8], source: &Path) -> Result<ExtractionResult>;

    /// Kinds this extractor handles.
    fn supported_kinds(&self) -> &[FileKind];

    /// Read `path` and extract it.
    fn extract_file(&self, path: &Path) -> Result<ExtractionResult> {
        let bytes = crate::core::io::read_file(path)?;
        self.extract_bytes(&bytes, path)
    }
}
