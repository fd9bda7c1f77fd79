//! File classification by extension.
//!
//! Classification never looks at file content: the extension alone decides
//! which extractor handles a file. Matching is case-insensitive.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// The kind of document a source file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Image,
    Pdf,
    Docx,
    Txt,
    Unsupported,
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tiff", "tif", "bmp"];
const PDF_EXTENSIONS: &[&str] = &["pdf"];
const DOCX_EXTENSIONS: &[&str] = &["docx"];
const TXT_EXTENSIONS: &[&str] = &["txt"];

static EXT_TO_KIND: Lazy<HashMap<&'static str, FileKind>> = Lazy::new(|| {
    let mut m = HashMap::new();
    for kind in FileKind::SUPPORTED {
        for ext in kind.extensions() {
            m.insert(*ext, kind);
        }
    }
    m
});

impl FileKind {
    /// Every kind that has an extractor.
    pub const SUPPORTED: [FileKind; 4] = [FileKind::Image, FileKind::Pdf, FileKind::Docx, FileKind::Txt];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Image => "image",
            FileKind::Pdf => "pdf",
            FileKind::Docx => "docx",
            FileKind::Txt => "txt",
            FileKind::Unsupported => "unsupported",
        }
    }

    /// Lower-case extensions accepted for this kind, without the dot.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            FileKind::Image => IMAGE_EXTENSIONS,
            FileKind::Pdf => PDF_EXTENSIONS,
            FileKind::Docx => DOCX_EXTENSIONS,
            FileKind::Txt => TXT_EXTENSIONS,
            FileKind::Unsupported => &[],
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, FileKind::Unsupported)
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a path by its extension.
///
/// Files without an extension, and extensions outside the fixed set, are
/// [`FileKind::Unsupported`].
pub fn classify(path: impl AsRef<Path>) -> FileKind {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .and_then(|ext| EXT_TO_KIND.get(ext.as_str()).copied())
        .unwrap_or(FileKind::Unsupported)
}

/// Best-effort MIME type for an image path, used in log fields only.
pub fn image_mime_type(path: impl AsRef<Path>) -> &'static str {
    let ext = path
        .as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "tif" | "tiff" => "image/tiff",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}
