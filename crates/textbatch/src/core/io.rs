//! File I/O utilities.
//!
//! Reading sources, listing the input folder, and writing outputs so that a
//! reader never observes a half-written file.

use crate::{Result, TextbatchError};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Read a file synchronously.
///
/// # Errors
///
/// Returns `TextbatchError::Io` for I/O errors (these always bubble up).
pub fn read_file(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    std::fs::read(path.as_ref()).map_err(TextbatchError::Io)
}

/// List the regular files directly inside `dir`, sorted by file name.
///
/// Subdirectories and other non-file entries are skipped; the listing is not
/// recursive.
///
/// # Errors
///
/// Returns `TextbatchError::Validation` if `dir` is not a directory and
/// `TextbatchError::Io` if it cannot be read.
pub fn list_input_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();

    if !dir.is_dir() {
        return Err(TextbatchError::validation(format!(
            "Input path is not a directory: {}",
            dir.display()
        )));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(TextbatchError::Io)? {
        let entry = entry.map_err(TextbatchError::Io)?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        } else {
            tracing::trace!(path = %path.display(), "Skipping non-regular entry");
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Create `dir` (and parents) if it does not exist yet.
pub fn ensure_dir(dir: impl AsRef<Path>) -> Result<()> {
    std::fs::create_dir_all(dir.as_ref()).map_err(TextbatchError::Io)
}

/// Write `content` to `target` atomically.
///
/// The bytes go to a temporary file in the same directory, which is renamed
/// over `target` only after the write completed. An existing `target` is
/// replaced.
pub fn write_atomic(target: impl AsRef<Path>, content: &[u8]) -> Result<()> {
    let target = target.as_ref();
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir).map_err(TextbatchError::Io)?;
    temp.write_all(content).map_err(TextbatchError::Io)?;
    temp.as_file().sync_all().map_err(TextbatchError::Io)?;
    temp.persist(target).map_err(|e| TextbatchError::Io(e.error))?;
    Ok(())
}
