use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::core::formats::FileKind;
use crate::error::TextbatchError;

/// Result of converting a single source file.
///
/// `content` is exactly what gets written to the output file. The page and
/// table records are kept alongside for reporting and tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub content: String,
    pub kind: FileKind,
    pub tables: Vec<Table>,

    /// Per-page provenance for paginated inputs (PDF only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<Vec<PageContent>>,
}

impl ExtractionResult {
    pub fn plain(content: String, kind: FileKind) -> Self {
        Self {
            content,
            kind,
            tables: Vec::new(),
            pages: None,
        }
    }

    /// Number of pages whose text came from OCR.
    pub fn ocr_page_count(&self) -> usize {
        self.pages
            .as_ref()
            .map(|pages| pages.iter().filter(|p| p.source == PageSource::Ocr).count())
            .unwrap_or(0)
    }
}

/// Where a page's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSource {
    Native,
    Ocr,
    Failed,
}

/// Content for a single PDF page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageContent {
    /// Page number (1-indexed)
    pub page_number: usize,
    pub source: PageSource,
    /// Text content for this page, without marker or tables
    pub content: String,
    /// Tables found on this page
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tables: Vec<Table>,
}

/// Extracted table structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Table cells as a 2D vector (rows × columns)
    pub cells: Vec<Vec<String>>,
    /// Page number where the table was found (1-indexed); `None` for unpaginated formats
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<usize>,
}

impl Table {
    pub fn row_count(&self) -> usize {
        self.cells.len()
    }

    pub fn column_count(&self) -> usize {
        self.cells.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// An output file produced by a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrittenFile {
    pub source: PathBuf,
    pub output: PathBuf,
    pub kind: FileKind,
    pub bytes: usize,
}

/// Category of a per-file failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Unsupported,
    Decode,
    Engine,
    Io,
}

impl From<&TextbatchError> for FailureKind {
    fn from(err: &TextbatchError) -> Self {
        match err {
            TextbatchError::UnsupportedFormat(_) => FailureKind::Unsupported,
            TextbatchError::Decoding { .. } => FailureKind::Decode,
            TextbatchError::Io(_) => FailureKind::Io,
            TextbatchError::Ocr { .. }
            | TextbatchError::Extraction { .. }
            | TextbatchError::Validation { .. }
            | TextbatchError::MissingDependency(_) => FailureKind::Engine,
        }
    }
}

/// A source file that produced no output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub kind: FailureKind,
    pub message: String,
}

impl FileFailure {
    pub fn from_error(path: PathBuf, err: &TextbatchError) -> Self {
        Self {
            path,
            kind: FailureKind::from(err),
            message: err.to_string(),
        }
    }
}

/// Outcome of a whole batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub written: Vec<WrittenFile>,
    pub failures: Vec<FileFailure>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.written.len() + self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
