//! Turning image-only PDF pages into pixels for OCR.
//!
//! Two rasterizers implement [`PageRasterizer`]:
//!
//! - [`PdfiumRasterizer`] renders the whole page at the configured DPI through
//!   a pdfium shared library bound at runtime (feature `pdfium`).
//! - [`EmbeddedImageRasterizer`] needs no native library: it decodes the
//!   images the page draws, which for scanned documents is the scan itself.
//!
//! [`build_rasterizer`] picks one according to [`RasterizerKind`]; `auto`
//! prefers pdfium and falls back to embedded images with a warning.
//!
//! A session backed by pdfium also reports positioned words for native pages,
//! grouped from pdfium's character boxes. Sessions without that ability return
//! `None` and callers fall back to [`extract_words_from_page`](super::extract_words_from_page).

use super::error::Result;
use super::images::extract_page_images;
use super::text::PdfDocument;
use crate::core::config::{PdfConfig, RasterizerKind};
use crate::extraction::table::TextBox;
use image::DynamicImage;

#[cfg(feature = "pdfium")]
pub use self::pdfium::{PageRenderOptions, PdfiumRasterizer};

/// Produces the images to OCR for a page.
pub trait PageRasterizer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Prepare to rasterize pages of `document`.
    fn open<'a>(&'a self, document: &'a PdfDocument<'_>) -> Result<Box<dyn RasterSession + 'a>>;
}

/// Rasterization state for one open document.
pub trait RasterSession {
    /// Images for a 1-indexed page. May be empty when nothing is drawn.
    fn render_page(&mut self, page_number: u32) -> Result<Vec<DynamicImage>>;

    /// Positioned words of a page in top-left page coordinates, if this
    /// backend can read them.
    fn page_words(&mut self, _page_number: u32) -> Result<Option<Vec<TextBox>>> {
        Ok(None)
    }
}

/// Rasterizer that OCRs the images embedded in each page.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedImageRasterizer;

struct EmbeddedImageSession<'a, 'b> {
    document: &'a PdfDocument<'b>,
}

impl PageRasterizer for EmbeddedImageRasterizer {
    fn name(&self) -> &'static str {
        "embedded-images"
    }

    fn open<'a>(&'a self, document: &'a PdfDocument<'_>) -> Result<Box<dyn RasterSession + 'a>> {
        Ok(Box::new(EmbeddedImageSession { document }))
    }
}

impl RasterSession for EmbeddedImageSession<'_, '_> {
    fn render_page(&mut self, page_number: u32) -> Result<Vec<DynamicImage>> {
        Ok(extract_page_images(self.document, page_number)?
            .into_iter()
            .map(|img| img.image)
            .collect())
    }
}

/// Build the rasterizer selected by `config`.
///
/// # Errors
///
/// `LibraryUnavailable` when pdfium is explicitly requested but cannot be
/// bound. `auto` never fails.
pub fn build_rasterizer(config: &PdfConfig) -> Result<Box<dyn PageRasterizer>> {
    match config.rasterizer {
        RasterizerKind::EmbeddedImages => Ok(Box::new(EmbeddedImageRasterizer)),
        RasterizerKind::Pdfium => pdfium_rasterizer(config),
        RasterizerKind::Auto => match pdfium_rasterizer(config) {
            Ok(rasterizer) => Ok(rasterizer),
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    "pdfium unavailable, image-only PDF pages will be OCR'd from their embedded images"
                );
                Ok(Box::new(EmbeddedImageRasterizer))
            }
        },
    }
}

#[cfg(feature = "pdfium")]
fn pdfium_rasterizer(config: &PdfConfig) -> Result<Box<dyn PageRasterizer>> {
    let options = PageRenderOptions {
        target_dpi: config.dpi as i32,
        ..PageRenderOptions::default()
    };
    Ok(Box::new(PdfiumRasterizer::new(config.pdfium_library.as_deref(), options)?))
}

#[cfg(not(feature = "pdfium"))]
fn pdfium_rasterizer(_config: &PdfConfig) -> Result<Box<dyn PageRasterizer>> {
    Err(super::error::PdfError::LibraryUnavailable(
        "textbatch was built without the `pdfium` feature".to_string(),
    ))
}

#[cfg(feature = "pdfium")]
mod pdfium {
    use super::super::bindings::bind_pdfium;
    use super::super::error::PdfError;
    use super::super::layout::{CharInfo, group_chars_into_words};
    use super::{PageRasterizer, PdfDocument, RasterSession, Result, TextBox};
    use image::DynamicImage;
    use pdfium_render::prelude::*;
    use std::path::Path;

    const PDF_POINTS_PER_INCH: f64 = 72.0;

    #[derive(Debug, Clone)]
    pub struct PageRenderOptions {
        pub target_dpi: i32,
        pub max_image_dimension: i32,
        pub min_dpi: i32,
        pub max_dpi: i32,
    }

    impl Default for PageRenderOptions {
        fn default() -> Self {
            Self {
                target_dpi: 300,
                max_image_dimension: 65536,
                min_dpi: 72,
                max_dpi: 1200,
            }
        }
    }

    /// Renders pages through pdfium.
    pub struct PdfiumRasterizer {
        pdfium: Pdfium,
        options: PageRenderOptions,
    }

    impl PdfiumRasterizer {
        pub fn new(library: Option<&Path>, options: PageRenderOptions) -> Result<Self> {
            let bindings = bind_pdfium(library)?;
            Ok(Self {
                pdfium: Pdfium::new(bindings),
                options,
            })
        }
    }

    impl PageRasterizer for PdfiumRasterizer {
        fn name(&self) -> &'static str {
            "pdfium"
        }

        fn open<'a>(&'a self, document: &'a PdfDocument<'_>) -> Result<Box<dyn RasterSession + 'a>> {
            let document = self
                .pdfium
                .load_pdf_from_byte_slice(document.bytes(), None)
                .map_err(|e| PdfError::InvalidPdf(e.to_string()))?;
            Ok(Box::new(PdfiumSession {
                document,
                options: self.options.clone(),
            }))
        }
    }

    struct PdfiumSession<'a> {
        document: pdfium_render::prelude::PdfDocument<'a>,
        options: PageRenderOptions,
    }

    impl<'a> PdfiumSession<'a> {
        fn page(&self, page_number: u32) -> Result<PdfPage<'a>> {
            let page_index = page_number.saturating_sub(1) as usize;
            self.document
                .pages()
                .get(page_index as u16)
                .map_err(|_| PdfError::PageNotFound(page_number as usize))
        }
    }

    impl RasterSession for PdfiumSession<'_> {
        fn render_page(&mut self, page_number: u32) -> Result<Vec<DynamicImage>> {
            let page = self.page(page_number)?;

            let width_points = page.width().value;
            let height_points = page.height().value;

            let dpi = calculate_optimal_dpi(
                width_points as f64,
                height_points as f64,
                self.options.target_dpi,
                self.options.max_image_dimension,
                self.options.min_dpi,
                self.options.max_dpi,
            );
            let scale = dpi as f64 / PDF_POINTS_PER_INCH;

            let config = PdfRenderConfig::new()
                .set_target_width(((width_points * scale as f32) as i32).max(1))
                .set_target_height(((height_points * scale as f32) as i32).max(1))
                .rotate_if_landscape(PdfPageRenderRotation::None, false);

            let bitmap = page
                .render_with_config(&config)
                .map_err(|e| PdfError::RenderingFailed(format!("Failed to render page {}: {}", page_number, e)))?;

            Ok(vec![DynamicImage::ImageRgb8(bitmap.as_image().into_rgb8())])
        }

        fn page_words(&mut self, page_number: u32) -> Result<Option<Vec<TextBox>>> {
            let page = self.page(page_number)?;
            let page_text = page
                .text()
                .map_err(|e| PdfError::TextExtractionFailed(format!("Failed to get page text: {}", e)))?;

            let text_chars = page_text.chars();
            let mut chars = Vec::new();
            for pdf_char in text_chars.iter() {
                let Some(text) = pdf_char.unicode_char() else {
                    continue;
                };
                let bounds = pdf_char
                    .loose_bounds()
                    .map_err(|e| PdfError::TextExtractionFailed(format!("Failed to get char bounds: {}", e)))?;
                chars.push(CharInfo {
                    text,
                    x: bounds.left().value as f64,
                    y: bounds.bottom().value as f64,
                    width: bounds.width().value as f64,
                    height: bounds.height().value as f64,
                });
            }

            let page_top = page.height().value as f64;
            Ok(Some(group_chars_into_words(&chars, page_top)))
        }
    }

    /// DPI to render at so neither side exceeds `max_dimension` pixels.
    pub(crate) fn calculate_optimal_dpi(
        page_width: f64,
        page_height: f64,
        target_dpi: i32,
        max_dimension: i32,
        min_dpi: i32,
        max_dpi: i32,
    ) -> i32 {
        let width_inches = page_width / PDF_POINTS_PER_INCH;
        let height_inches = page_height / PDF_POINTS_PER_INCH;

        let width_at_target = (width_inches * target_dpi as f64) as i32;
        let height_at_target = (height_inches * target_dpi as f64) as i32;

        if width_at_target <= max_dimension && height_at_target <= max_dimension {
            return target_dpi.clamp(min_dpi, max_dpi);
        }

        let width_limited_dpi = (max_dimension as f64 / width_inches) as i32;
        let height_limited_dpi = (max_dimension as f64 / height_inches) as i32;

        width_limited_dpi.min(height_limited_dpi).clamp(min_dpi, max_dpi)
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::error::PdfError;
    use crate::pdf::text::test_support::{image_ops, pdf_with_pages, text_ops};

    #[test]
    fn test_embedded_rasterizer_on_text_page() {
        let bytes = pdf_with_pages(vec![text_ops(72, 700, "HELLO")]);
        let document = PdfDocument::load(&bytes).unwrap();
        let rasterizer = EmbeddedImageRasterizer;
        let mut session = rasterizer.open(&document).unwrap();
        assert!(session.render_page(1).unwrap().is_empty());
        assert!(matches!(session.render_page(9), Err(PdfError::PageNotFound(9))));
    }

    #[test]
    fn test_embedded_rasterizer_on_scanned_page() {
        let bytes = pdf_with_pages(vec![image_ops()]);
        let document = PdfDocument::load(&bytes).unwrap();
        let mut session = EmbeddedImageRasterizer.open(&document).unwrap();
        let images = session.render_page(1).unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!((images[0].width(), images[0].height()), (8, 8));
    }

    #[test]
    fn test_embedded_rasterizer_reads_no_words() {
        let bytes = pdf_with_pages(vec![text_ops(72, 700, "HELLO")]);
        let document = PdfDocument::load(&bytes).unwrap();
        let mut session = EmbeddedImageRasterizer.open(&document).unwrap();
        assert!(session.page_words(1).unwrap().is_none());
    }

    #[test]
    fn test_build_embedded_rasterizer() {
        let config = PdfConfig {
            rasterizer: RasterizerKind::EmbeddedImages,
            ..PdfConfig::default()
        };
        assert_eq!(build_rasterizer(&config).unwrap().name(), "embedded-images");
    }

    #[test]
    fn test_build_explicit_pdfium_with_missing_library_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = PdfConfig {
            rasterizer: RasterizerKind::Pdfium,
            pdfium_library: Some(dir.path().join("missing")),
            ..PdfConfig::default()
        };
        assert!(build_rasterizer(&config).is_err());
    }

    #[test]
    fn test_auto_falls_back_to_embedded_images() {
        let dir = tempfile::tempdir().unwrap();
        let config = PdfConfig {
            rasterizer: RasterizerKind::Auto,
            pdfium_library: Some(dir.path().join("missing")),
            ..PdfConfig::default()
        };
        assert_eq!(build_rasterizer(&config).unwrap().name(), "embedded-images");
    }
}
