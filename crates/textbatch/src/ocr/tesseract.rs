//! Tesseract command-line OCR engine.
//!
//! The engine shells out to the `tesseract` executable once per image,
//! requesting both plain text and TSV word boxes in a single invocation:
//!
//! ```text
//! tesseract <dir>/page.png <dir>/out -l <lang> --psm <psm> txt tsv
//! ```
//!
//! Everything is written to a private temporary directory that is removed
//! when recognition returns, on success or failure.
//!
//! # System Requirement
//!
//! Tesseract 3.05 or newer must be installed:
//! - **macOS**: `brew install tesseract`
//! - **Linux**: `apt install tesseract-ocr`
//! - **Windows**: the UB Mannheim installer

use crate::core::config::OcrConfig;
use crate::ocr::tsv::extract_words_from_tsv;
use crate::plugins::{OcrEngine, OcrOutput, Plugin};
use crate::{Result, TextbatchError};
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageEncoder};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Environment variables consulted, in order, before platform defaults.
pub const TESSERACT_PATH_ENV_VARS: [&str; 2] = ["TEXTBATCH_TESSERACT_PATH", "TESSERACT_PATH"];

/// Word rows below this confidence are dropped before table detection.
const MIN_WORD_CONFIDENCE: f64 = 0.0;

static VERSION_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"tesseract\s+v?(\d+)\.(\d+)(?:\.(\d+))?").ok());

fn tesseract_install_message() -> String {
    "Tesseract OCR is required to read scanned documents and images. \
Install: macOS: 'brew install tesseract', \
Linux: 'apt install tesseract-ocr', \
Windows: install from https://github.com/UB-Mannheim/tesseract/wiki. \
If Tesseract is installed in a custom location, set ocr.tesseract_path in textbatch.toml \
or the TEXTBATCH_TESSERACT_PATH environment variable to the executable."
        .to_string()
}

fn tesseract_candidates() -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    let mut push_candidate = |path: PathBuf| {
        if seen.insert(path.clone()) {
            candidates.push(path);
        }
    };

    for var in TESSERACT_PATH_ENV_VARS {
        if let Some(value) = env::var_os(var).filter(|v| !v.is_empty()) {
            push_candidate(PathBuf::from(value));
        }
    }

    if cfg!(target_os = "windows") {
        push_candidate(PathBuf::from("C:\\Program Files\\Tesseract-OCR\\tesseract.exe"));
        push_candidate(PathBuf::from("C:\\Program Files (x86)\\Tesseract-OCR\\tesseract.exe"));
    }

    if cfg!(target_os = "macos") {
        push_candidate(PathBuf::from("/opt/homebrew/bin/tesseract"));
        push_candidate(PathBuf::from("/usr/local/bin/tesseract"));
    }

    if cfg!(target_os = "linux") {
        push_candidate(PathBuf::from("/usr/bin/tesseract"));
        push_candidate(PathBuf::from("/usr/local/bin/tesseract"));
    }

    if let Some(path_env) = env::var_os("PATH") {
        for dir in env::split_paths(&path_env) {
            push_candidate(dir.join("tesseract"));
            push_candidate(dir.join("tesseract.exe"));
        }
    }

    candidates
}

/// Find the tesseract executable.
///
/// An explicitly configured path wins and is never silently replaced by a
/// search result: if it does not point at a file, this fails.
pub fn locate_tesseract(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        return Err(TextbatchError::MissingDependency(format!(
            "Configured Tesseract executable '{}' does not exist",
            path.display()
        )));
    }

    tesseract_candidates()
        .into_iter()
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| TextbatchError::MissingDependency(tesseract_install_message()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

pub(crate) fn parse_version(output: &str) -> Option<Version> {
    let caps = VERSION_RE.as_ref()?.captures(output)?;
    let major = caps.get(1)?.as_str().parse().ok()?;
    let minor = caps.get(2)?.as_str().parse().ok()?;
    let patch = caps.get(3).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
    Some(Version { major, minor, patch })
}

/// Run `--version` and check the executable is new enough to emit TSV.
fn check_tesseract_version(binary: &Path) -> Result<Version> {
    let output = Command::new(binary).arg("--version").output().map_err(|err| {
        TextbatchError::MissingDependency(format!(
            "Tesseract executable '{}' could not be executed: {}. {help}",
            binary.display(),
            err,
            help = tesseract_install_message()
        ))
    })?;

    if !output.status.success() {
        return Err(TextbatchError::MissingDependency(format!(
            "Tesseract executable '{}' responded with a failure when checking '--version'",
            binary.display()
        )));
    }

    // Older releases print the banner on stderr.
    let banner = format!(
        "{}\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    let version = parse_version(&banner).ok_or_else(|| {
        TextbatchError::MissingDependency(format!(
            "Could not parse Tesseract version from output: {}",
            banner.trim()
        ))
    })?;

    if (version.major, version.minor) < (3, 5) {
        return Err(TextbatchError::MissingDependency(format!(
            "Tesseract 3.05 or newer is required, found version {}",
            version
        )));
    }

    Ok(version)
}

/// OCR engine backed by the `tesseract` executable.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    binary: PathBuf,
    language: String,
    psm: u8,
    version: String,
}

impl TesseractCli {
    /// Locate and verify tesseract according to `config`.
    ///
    /// # Errors
    ///
    /// `MissingDependency` if no usable executable is found. This is a
    /// configuration error and should abort the run before any file is read.
    pub fn from_config(config: &OcrConfig) -> Result<Self> {
        let binary = locate_tesseract(config.tesseract_path.as_deref())?;
        let version = check_tesseract_version(&binary)?;
        tracing::debug!(binary = %binary.display(), version = %version, "Verified Tesseract executable");

        Ok(Self {
            binary,
            language: config.language.clone(),
            psm: config.psm,
            version: version.to_string(),
        })
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn write_png(image: &DynamicImage, path: &Path) -> Result<()> {
        let rgb = image.to_rgb8();
        let file = fs::File::create(path)?;
        let encoder = PngEncoder::new(std::io::BufWriter::new(file));
        encoder
            .write_image(&rgb, rgb.width(), rgb.height(), image::ColorType::Rgb8.into())
            .map_err(|e| TextbatchError::ocr_with_source("Failed to encode image for OCR", e))
    }
}

impl Plugin for TesseractCli {
    fn name(&self) -> &str {
        "tesseract-cli"
    }

    fn version(&self) -> String {
        self.version.clone()
    }

    fn description(&self) -> &str {
        "Tesseract OCR via the command-line executable"
    }
}

impl OcrEngine for TesseractCli {
    fn recognize(&self, image: &DynamicImage) -> Result<OcrOutput> {
        if image.width() == 0 || image.height() == 0 {
            return Ok(OcrOutput::default());
        }

        let workdir = tempfile::tempdir()?;
        let input = workdir.path().join("page.png");
        let out_base = workdir.path().join("out");
        Self::write_png(image, &input)?;

        let output = Command::new(&self.binary)
            .arg(&input)
            .arg(&out_base)
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg(self.psm.to_string())
            .arg("txt")
            .arg("tsv")
            .output()
            .map_err(|e| TextbatchError::ocr_with_source(format!("Failed to run {}", self.binary.display()), e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TextbatchError::ocr(format!(
                "Tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let raw_text = fs::read_to_string(out_base.with_extension("txt"))
            .map_err(|e| TextbatchError::ocr_with_source("Tesseract produced no text output", e))?;
        let text = raw_text.trim_end_matches(['\u{c}', '\n', '\r', ' ']).to_string();

        let words = match fs::read_to_string(out_base.with_extension("tsv")) {
            Ok(tsv) => extract_words_from_tsv(&tsv, MIN_WORD_CONFIDENCE),
            Err(err) => {
                tracing::debug!(error = %err, "Tesseract produced no TSV output, skipping word boxes");
                Vec::new()
            }
        };

        tracing::trace!(chars = text.len(), words = words.len(), "OCR finished");
        Ok(OcrOutput { text, words })
    }

    fn language(&self) -> &str {
        &self.language
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version_modern() {
        let version = parse_version("tesseract 5.3.0\n leptonica-1.82.0\n  libgif 5.2.1").unwrap();
        assert_eq!(
            version,
            Version {
                major: 5,
                minor: 3,
                patch: 0
            }
        );
    }

    #[test]
    fn test_parse_version_prefixed() {
        let version = parse_version("tesseract v5.0.0.20190623").unwrap();
        assert_eq!(version.major, 5);
        assert_eq!(version.to_string(), "5.0.0");
    }

    #[test]
    fn test_parse_version_without_patch() {
        let version = parse_version("tesseract 3.05").unwrap();
        assert_eq!((version.major, version.minor, version.patch), (3, 5, 0));
    }

    #[test]
    fn test_parse_version_garbage() {
        assert!(parse_version("command not found").is_none());
    }

    #[test]
    fn test_explicit_missing_path_is_missing_dependency() {
        let dir = tempfile::tempdir().unwrap();
        let err = locate_tesseract(Some(&dir.path().join("no-tesseract"))).unwrap_err();
        assert!(matches!(err, TextbatchError::MissingDependency(_)));
        assert!(err.is_fatal());
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_explicit_existing_path_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("tesseract");
        fs::write(&fake, b"").unwrap();
        assert_eq!(locate_tesseract(Some(&fake)).unwrap(), fake);
    }

    #[test]
    fn test_from_config_with_missing_binary_fails() {
        let config = OcrConfig {
            tesseract_path: Some(PathBuf::from("/nonexistent/tesseract")),
            ..OcrConfig::default()
        };
        let err = TesseractCli::from_config(&config).unwrap_err();
        assert!(matches!(err, TextbatchError::MissingDependency(_)));
    }

    #[test]
    fn test_install_message_mentions_env_var() {
        assert!(tesseract_install_message().contains("TEXTBATCH_TESSERACT_PATH"));
    }

    #[test]
    #[ignore = "requires tesseract on the system"]
    fn test_recognize_blank_image() {
        let engine = TesseractCli::from_config(&OcrConfig::default()).unwrap();
        let image = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(200, 100, image::Rgb([255, 255, 255])));
        let output = engine.recognize(&image).unwrap();
        assert!(output.is_blank());
    }
}
