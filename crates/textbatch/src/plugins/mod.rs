//! Plugin seams.
//!
//! Extractors and the OCR engine are trait objects so the batch driver can be
//! assembled from real implementations or from test doubles.

mod extractor;
mod ocr;
mod registry;
mod traits;

pub use extractor::DocumentExtractor;
pub use ocr::{OcrEngine, OcrOutput};
pub use registry::ExtractorRegistry;
pub use traits::Plugin;

#[cfg(test)]
pub(crate) use ocr::test_support;
