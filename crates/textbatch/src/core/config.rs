//! Configuration loading and management.
//!
//! A batch run is described by [`BatchConfig`]: the folder pair plus the OCR,
//! PDF and table-detection knobs. It can be loaded from TOML or JSON, found by
//! walking up from the current directory, or built in code.

use crate::{Result, TextbatchError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name searched for by [`BatchConfig::discover`].
pub const CONFIG_FILE_NAME: &str = "textbatch.toml";

pub const MIN_DPI: u32 = 72;
pub const MAX_DPI: u32 = 1200;

/// Main batch configuration.
///
/// # Example
///
/// ```rust
/// use textbatch::core::config::BatchConfig;
///
/// let config = BatchConfig::default();
/// assert_eq!(config.pdf.dpi, 300);
///
/// // let config = BatchConfig::from_toml_file("textbatch.toml")?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Folder scanned (non-recursively) for source files
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,

    /// Folder receiving one `.txt` file per converted source
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default)]
    pub ocr: OcrConfig,

    #[serde(default)]
    pub pdf: PdfConfig,

    #[serde(default)]
    pub tables: TableConfig,
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Explicit path to the tesseract executable (None = search)
    #[serde(default)]
    pub tesseract_path: Option<PathBuf>,

    /// Language code (e.g., "eng", "eng+hin")
    #[serde(default = "default_eng")]
    pub language: String,

    /// Tesseract page segmentation mode
    #[serde(default = "default_psm")]
    pub psm: u8,
}

/// Which backend turns an image-only PDF page into pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RasterizerKind {
    /// Pdfium when the library can be bound, embedded images otherwise
    #[default]
    Auto,
    Pdfium,
    EmbeddedImages,
}

/// PDF handling options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfConfig {
    /// Rendering resolution for OCR'd pages
    #[serde(default = "default_dpi")]
    pub dpi: u32,

    #[serde(default)]
    pub rasterizer: RasterizerKind,

    /// Directory containing the pdfium shared library (None = system library)
    #[serde(default)]
    pub pdfium_library: Option<PathBuf>,

    /// OCR every page even when it has a text layer
    #[serde(default)]
    pub force_ocr: bool,

    /// Also OCR images embedded in pages that have a text layer
    #[serde(default = "default_true")]
    pub ocr_embedded_images: bool,
}

/// Table detection and rendering options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Minimum consecutive aligned rows for a table
    #[serde(default = "default_min_rows")]
    pub min_rows: usize,

    /// Minimum cells per row for a table
    #[serde(default = "default_min_columns")]
    pub min_columns: usize,

    /// Horizontal gap, in multiples of the median word height, that separates cells
    #[serde(default = "default_column_gap_ratio")]
    pub column_gap_ratio: f64,

    /// Text placed between cells when a row is rendered
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("input")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}
fn default_true() -> bool {
    true
}
fn default_eng() -> String {
    "eng".to_string()
}
fn default_psm() -> u8 {
    3
}
fn default_dpi() -> u32 {
    300
}
fn default_min_rows() -> usize {
    2
}
fn default_min_columns() -> usize {
    2
}
fn default_column_gap_ratio() -> f64 {
    1.5
}
fn default_delimiter() -> String {
    " | ".to_string()
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
            ocr: OcrConfig::default(),
            pdf: PdfConfig::default(),
            tables: TableConfig::default(),
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_path: None,
            language: default_eng(),
            psm: default_psm(),
        }
    }
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            dpi: default_dpi(),
            rasterizer: RasterizerKind::default(),
            pdfium_library: None,
            force_ocr: false,
            ocr_embedded_images: true,
        }
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_rows: default_min_rows(),
            min_columns: default_min_columns(),
            column_gap_ratio: default_column_gap_ratio(),
            delimiter: default_delimiter(),
        }
    }
}

impl BatchConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `TextbatchError::Validation` if the file cannot be read, is not
    /// valid TOML, or fails [`BatchConfig::validate`].
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            TextbatchError::validation(format!("Failed to read config file {}: {}", path.as_ref().display(), e))
        })?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| TextbatchError::validation(format!("Invalid TOML in {}: {}", path.as_ref().display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            TextbatchError::validation(format!("Failed to read config file {}: {}", path.as_ref().display(), e))
        })?;

        let config: Self = serde_json::from_str(&content)
            .map_err(|e| TextbatchError::validation(format!("Invalid JSON in {}: {}", path.as_ref().display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, picking the format from its extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()).map(str::to_lowercase) {
            Some(ext) if ext == "json" => Self::from_json_file(path),
            Some(ext) if ext == "toml" => Self::from_toml_file(path),
            _ => Err(TextbatchError::validation(format!(
                "Unsupported config file format: {} (expected .toml or .json)",
                path.display()
            ))),
        }
    }

    /// Discover `textbatch.toml` in the current directory or its parents.
    ///
    /// # Returns
    ///
    /// - `Some(config)` if found
    /// - `None` if no config file found
    pub fn discover() -> Result<Option<Self>> {
        let current = std::env::current_dir().map_err(TextbatchError::Io)?;
        Self::discover_from(&current)
    }

    /// Same as [`BatchConfig::discover`], starting at `start`.
    pub fn discover_from(start: &Path) -> Result<Option<Self>> {
        for dir in start.ancestors() {
            let candidate = dir.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                tracing::debug!(path = %candidate.display(), "Discovered config file");
                return Ok(Some(Self::from_toml_file(candidate)?));
            }
        }
        Ok(None)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_DPI..=MAX_DPI).contains(&self.pdf.dpi) {
            return Err(TextbatchError::validation(format!(
                "pdf.dpi must be between {} and {}, got {}",
                MIN_DPI, MAX_DPI, self.pdf.dpi
            )));
        }
        if self.ocr.language.trim().is_empty() {
            return Err(TextbatchError::validation("ocr.language must not be empty"));
        }
        if self.ocr.psm > 13 {
            return Err(TextbatchError::validation(format!(
                "ocr.psm must be between 0 and 13, got {}",
                self.ocr.psm
            )));
        }
        if self.tables.min_rows < 2 {
            return Err(TextbatchError::validation(format!(
                "tables.min_rows must be at least 2, got {}",
                self.tables.min_rows
            )));
        }
        if self.tables.min_columns < 2 {
            return Err(TextbatchError::validation(format!(
                "tables.min_columns must be at least 2, got {}",
                self.tables.min_columns
            )));
        }
        if !(self.tables.column_gap_ratio > 0.0 && self.tables.column_gap_ratio.is_finite()) {
            return Err(TextbatchError::validation(format!(
                "tables.column_gap_ratio must be positive, got {}",
                self.tables.column_gap_ratio
            )));
        }
        Ok(())
    }
}
