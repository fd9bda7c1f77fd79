//! textbatch - batch conversion of documents into plain text.
//!
//! Reads every file in an input folder and writes one `.txt` file per
//! convertible source into an output folder. PDFs, DOCX, plain text and
//! raster images are supported; pages and images without a text layer are
//! OCR'd with Tesseract, and tables are rendered as delimited text.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use textbatch::{BatchConfig, BatchRunner};
//!
//! # fn main() -> textbatch::Result<()> {
//! let config = BatchConfig {
//!     input_dir: "scans".into(),
//!     output_dir: "text".into(),
//!     ..BatchConfig::default()
//! };
//! let report = BatchRunner::from_config(&config)?.run()?;
//! for failure in &report.failures {
//!     eprintln!("{}: {}", failure.path.display(), failure.message);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Core Module** (`core`): classification, config, I/O, the batch driver
//! - **Plugin System** (`plugins`): `DocumentExtractor` and `OcrEngine` traits, extractor registry
//! - **Extractors** (`extractors`): one per supported file kind
//! - **Extraction** (`extraction`): DOCX parsing, text decoding, table detection and rendering
//! - **OCR** (`ocr`): Tesseract command-line engine
//! - **PDF** (`pdf`): text layer, layout words, embedded images, page rasterization

#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod extraction;
pub mod extractors;
pub mod ocr;
pub mod pdf;
pub mod plugins;
pub mod types;

pub use error::{Result, TextbatchError};
pub use types::*;

pub use core::batch::{BatchRunner, plan_outputs};
pub use core::config::{BatchConfig, OcrConfig, PdfConfig, RasterizerKind, TableConfig};
pub use core::formats::{FileKind, classify};

pub use extraction::table::TextBox;
pub use plugins::{DocumentExtractor, ExtractorRegistry, OcrEngine, OcrOutput, Plugin};
