//! Error types for textbatch.
//!
//! Every fallible operation in the library returns [`TextbatchError`]. The
//! variants fall into two groups:
//!
//! **Per-file errors** are caught by the batch driver, logged, recorded in the
//! report, and the run continues:
//! - `UnsupportedFormat` - the file extension is not one we convert
//! - `Decoding` - corrupt or malformed input (bad PDF, bad zip, invalid UTF-8)
//! - `Ocr` / `Extraction` - the OCR engine or an extraction backend failed
//! - `Io` - reading the source or writing its output failed
//!
//! **Configuration errors** abort before any file is touched:
//! - `MissingDependency` - the OCR engine binary cannot be found
//! - `Validation` - the configuration file or a parameter is invalid
//!
//! `Io` bubbles up unchanged via `?` so permission and disk problems surface
//! with their original message.
use thiserror::Error;

/// Result type alias using `TextbatchError`.
pub type Result<T> = std::result::Result<T, TextbatchError>;

/// Main error type for all textbatch operations.
#[derive(Debug, Error)]
pub enum TextbatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Decoding error: {message}")]
    Decoding {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("OCR error: {message}")]
    Ocr {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Extraction error: {message}")]
    Extraction {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl From<crate::pdf::error::PdfError> for TextbatchError {
    fn from(err: crate::pdf::error::PdfError) -> Self {
        TextbatchError::Decoding {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<image::ImageError> for TextbatchError {
    fn from(err: image::ImageError) -> Self {
        TextbatchError::Decoding {
            message: format!("Failed to decode image: {}", err),
            source: Some(Box::new(err)),
        }
    }
}

macro_rules! error_constructor {
    ($name:ident, $variant:ident) => {
        pastey::paste! {
            #[doc = "Create a " $variant " error"]
            pub fn $name<S: Into<String>>(message: S) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: None,
                }
            }

            #[doc = "Create a " $variant " error with source"]
            pub fn [<$name _with_source>]<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
                message: S,
                source: E,
            ) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: Some(Box::new(source)),
                }
            }
        }
    };
}

impl TextbatchError {
    error_constructor!(decoding, Decoding);
    error_constructor!(ocr, Ocr);
    error_constructor!(extraction, Extraction);
    error_constructor!(validation, Validation);

    /// Whether this error must abort the whole run rather than a single file.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TextbatchError::MissingDependency(_) | TextbatchError::Validation { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TextbatchError = io_err.into();
        assert!(matches!(err, TextbatchError::Io(_)));
        assert!(err.to_string().contains("IO error"));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_decoding_error() {
        let err = TextbatchError::decoding("invalid UTF-8");
        assert_eq!(err.to_string(), "Decoding error: invalid UTF-8");
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_decoding_error_with_source() {
        let source = std::io::Error::new(std::io::ErrorKind::InvalidData, "bad data");
        let err = TextbatchError::decoding_with_source("corrupt archive", source);
        assert_eq!(err.to_string(), "Decoding error: corrupt archive");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_ocr_error_with_source() {
        let source = std::io::Error::other("tesseract crashed");
        let err = TextbatchError::ocr_with_source("OCR failed", source);
        assert_eq!(err.to_string(), "OCR error: OCR failed");
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_extraction_error() {
        let err = TextbatchError::extraction("all 3 pages failed");
        assert_eq!(err.to_string(), "Extraction error: all 3 pages failed");
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn test_validation_error_is_fatal() {
        let err = TextbatchError::validation("dpi out of range");
        assert_eq!(err.to_string(), "Validation error: dpi out of range");
        assert!(err.is_fatal());
    }

    #[test]
    fn test_missing_dependency_is_fatal() {
        let err = TextbatchError::MissingDependency("tesseract not found".to_string());
        assert_eq!(err.to_string(), "Missing dependency: tesseract not found");
        assert!(err.is_fatal());
    }

    #[test]
    fn test_unsupported_format_error() {
        let err = TextbatchError::UnsupportedFormat("notes.xyz".to_string());
        assert_eq!(err.to_string(), "Unsupported format: notes.xyz");
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_pdf_error_converts_to_decoding() {
        let pdf_err = crate::pdf::error::PdfError::InvalidPdf("missing trailer".to_string());
        let err: TextbatchError = pdf_err.into();
        assert!(matches!(err, TextbatchError::Decoding { .. }));
        assert!(err.to_string().contains("missing trailer"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_error_debug() {
        let err = TextbatchError::ocr("test");
        let debug = format!("{:?}", err);
        assert!(debug.contains("Ocr"));
    }
}
