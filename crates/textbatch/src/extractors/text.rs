//! Plain text extractor.

use crate::Result;
use crate::core::formats::FileKind;
use crate::extraction::text::decode_utf8;
use crate::plugins::{DocumentExtractor, Plugin};
use crate::types::ExtractionResult;
use std::path::Path;

/// Plain text extractor.
///
/// Passes `.txt` content through unchanged. Content must be valid UTF-8.
pub struct TextExtractor;

impl TextExtractor {
    /// Create a new plain text extractor.
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for TextExtractor {
    fn name(&self) -> &str {
        "plain-text-extractor"
    }

    fn description(&self) -> &str {
        "Passes UTF-8 text files through unchanged"
    }
}

impl DocumentExtractor for TextExtractor {
    fn extract_bytes(&self, content: &[u8], _source: &Path) -> Result<ExtractionResult> {
        let text = decode_utf8(content)?;
        Ok(ExtractionResult::plain(text, FileKind::Txt))
    }

    fn supported_kinds(&self) -> &[FileKind] {
        &[FileKind::Txt]
    }
}
