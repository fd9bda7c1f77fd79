//! OCR engine plugin trait.

use crate::Result;
use crate::extraction::table::TextBox;
use crate::plugins::Plugin;
use image::DynamicImage;

/// Text recognized in one image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrOutput {
    /// Recognized text in reading order
    pub text: String,
    /// Word boxes in image pixel coordinates, top-left origin
    pub words: Vec<TextBox>,
}

impl OcrOutput {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Recognizes text in raster images.
///
/// Engines are shared between extractors as `Arc<dyn OcrEngine>`.
pub trait OcrEngine: Plugin {
    fn recognize(&self, image: &DynamicImage) -> Result<OcrOutput>;

    /// Language string passed to the engine (e.g. "eng").
    fn language(&self) -> &str {
        "eng"
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Engine that returns a fixed output and counts calls.
    #[derive(Default)]
    pub struct StubOcr {
        pub output: OcrOutput,
        pub fail: bool,
        calls: AtomicUsize,
    }

    impl StubOcr {
        pub fn returning(text: &str) -> Self {
            Self::with_output(OcrOutput {
                text: text.to_string(),
                words: Vec::new(),
            })
        }

        pub fn with_output(output: OcrOutput) -> Self {
            Self {
                output,
                ..Self::default()
            }
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Plugin for StubOcr {
        fn name(&self) -> &str {
            "stub-ocr"
        }
    }

    impl OcrEngine for StubOcr {
        fn recognize(&self, _image: &DynamicImage) -> Result<OcrOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(crate::TextbatchError::ocr("stub engine failure"));
            }
            Ok(self.output.clone())
        }
    }
}
