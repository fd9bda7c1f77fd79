//! OCR engine implementations.
//!
//! The [`OcrEngine`](crate::plugins::OcrEngine) trait lives in `plugins`; this
//! module holds the Tesseract command-line engine and its TSV parser.

pub mod tesseract;
pub mod tsv;

pub use tesseract::{TesseractCli, locate_tesseract};
pub use tsv::extract_words_from_tsv;
