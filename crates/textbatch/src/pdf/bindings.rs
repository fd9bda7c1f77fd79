use super::error::PdfError;
use once_cell::sync::Lazy;
use pdfium_render::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Binding failures seen so far, keyed by configured library location.
///
/// A library that failed to load once is not probed again for the rest of
/// the process; the cached message is returned instead.
static FAILED_BINDINGS: Lazy<Mutex<HashMap<Option<PathBuf>, String>>> = Lazy::new(|| Mutex::new(HashMap::new()));

fn bind_pdfium_impl(library: Option<&Path>) -> Result<Box<dyn PdfiumLibraryBindings>, String> {
    match library {
        Some(path) if path.is_file() => {
            Pdfium::bind_to_library(path).map_err(|e| format!("Failed to load '{}': {}", path.display(), e))
        }
        Some(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
            .map_err(|e| format!("Failed to load pdfium from '{}': {}", dir.display(), e)),
        None => Pdfium::bind_to_system_library().map_err(|e| format!("Failed to load system pdfium: {}", e)),
    }
}

/// Bind the pdfium shared library.
///
/// `library` may name the library file itself or the directory holding it;
/// `None` uses the platform's default library search.
pub(crate) fn bind_pdfium(library: Option<&Path>) -> Result<Box<dyn PdfiumLibraryBindings>, PdfError> {
    let key = library.map(Path::to_path_buf);
    let mut failures = FAILED_BINDINGS
        .lock()
        .map_err(|e| PdfError::LibraryUnavailable(format!("Failed to acquire lock on pdfium state: {}", e)))?;

    if let Some(err) = failures.get(&key) {
        return Err(PdfError::LibraryUnavailable(format!(
            "pdfium initialization previously failed: {}",
            err
        )));
    }

    bind_pdfium_impl(library).map_err(|err| {
        failures.insert(key, err.clone());
        PdfError::LibraryUnavailable(err)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_library_fails_and_is_cached() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nowhere");

        let first = bind_pdfium(Some(missing.as_path())).err().unwrap();
        assert!(matches!(first, PdfError::LibraryUnavailable(_)));

        let second = bind_pdfium(Some(missing.as_path())).err().unwrap();
        assert!(second.to_string().contains("previously failed"));
    }
}
