//! PDF document processing.
//!
//! Low-level building blocks used by the PDF extractor:
//!
//! - **Text layer**: per-page text through `lopdf` ([`PdfDocument`])
//! - **Layout**: positioned words from content streams, for table detection
//! - **Images**: decoding of embedded image XObjects
//! - **Rendering**: page rasterization for OCR, through pdfium or embedded images
//! - **Errors**: PDF-specific error type, converted to `TextbatchError::Decoding`

#[cfg(feature = "pdfium")]
pub(crate) mod bindings;
pub mod error;
pub mod images;
pub mod layout;
pub mod rendering;
pub mod text;

pub use error::PdfError;
pub use images::{PdfImage, extract_page_images};
pub use layout::extract_words_from_page;
pub use rendering::{EmbeddedImageRasterizer, PageRasterizer, RasterSession, build_rasterizer};
#[cfg(feature = "pdfium")]
pub use rendering::{PageRenderOptions, PdfiumRasterizer};
pub use text::PdfDocument;
