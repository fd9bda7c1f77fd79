//! Batch driver: one input folder in, one text file per source out.
//!
//! Every regular file in the input folder is classified, extracted and
//! written to the output folder. A file that cannot be converted is logged
//! and recorded in the [`BatchReport`]; the run carries on with the next one.

use crate::core::config::BatchConfig;
use crate::core::formats::{FileKind, classify};
use crate::core::io::{ensure_dir, list_input_files, write_atomic};
use crate::extractors::default_registry;
use crate::ocr::TesseractCli;
use crate::pdf::{PageRasterizer, build_rasterizer};
use crate::plugins::{ExtractorRegistry, OcrEngine, Plugin};
use crate::types::{BatchReport, FileFailure, WrittenFile};
use crate::{Result, TextbatchError};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const OUTPUT_EXTENSION: &str = "txt";

/// A source file and the output name it will be written under.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedFile {
    pub source: PathBuf,
    pub kind: FileKind,
    /// File name inside the output folder; `None` for unsupported files.
    pub output_name: Option<String>,
}

/// Runs one batch over an input folder.
pub struct BatchRunner {
    input_dir: PathBuf,
    output_dir: PathBuf,
    registry: ExtractorRegistry,
}

impl BatchRunner {
    /// Assemble a runner with Tesseract and the configured page rasterizer.
    ///
    /// # Errors
    ///
    /// `Validation` for an invalid config, `MissingDependency` when Tesseract
    /// cannot be found or pdfium was explicitly requested and cannot be loaded.
    pub fn from_config(config: &BatchConfig) -> Result<Self> {
        config.validate()?;
        let ocr = TesseractCli::from_config(&config.ocr)?;
        tracing::info!(
            binary = %ocr.binary().display(),
            version = %ocr.version(),
            language = ocr.language(),
            "Using Tesseract"
        );

        let rasterizer = build_rasterizer(&config.pdf)
            .map_err(|e| TextbatchError::MissingDependency(format!("PDF rasterizer unavailable: {}", e)))?;
        tracing::debug!(rasterizer = rasterizer.name(), "Selected PDF page rasterizer");

        Self::with_engines(config, Arc::new(ocr), Arc::from(rasterizer))
    }

    /// Assemble a runner around an existing OCR engine and rasterizer.
    pub fn with_engines(
        config: &BatchConfig,
        ocr: Arc<dyn OcrEngine>,
        rasterizer: Arc<dyn PageRasterizer>,
    ) -> Result<Self> {
        config.validate()?;
        let registry = default_registry(config, ocr, rasterizer)?;
        Ok(Self::with_registry(&config.input_dir, &config.output_dir, registry))
    }

    pub fn with_registry(
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        registry: ExtractorRegistry,
    ) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            registry,
        }
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }

    /// Process every file in the input folder.
    ///
    /// # Errors
    ///
    /// Only run-level problems are returned: the input folder cannot be
    /// listed, the output folder cannot be created, or an extractor reports
    /// an error for which [`TextbatchError::is_fatal`] holds. Per-file
    /// failures end up in the report.
    pub fn run(&self) -> Result<BatchReport> {
        let files = list_input_files(&self.input_dir).inspect_err(|err| {
            tracing::error!(input = %self.input_dir.display(), error = %err, "Cannot read input folder");
        })?;
        ensure_dir(&self.output_dir).inspect_err(|err| {
            tracing::error!(output = %self.output_dir.display(), error = %err, "Cannot create output folder");
        })?;

        tracing::info!(
            input = %self.input_dir.display(),
            output = %self.output_dir.display(),
            files = files.len(),
            "Starting batch"
        );

        let mut report = BatchReport::default();
        for planned in plan_outputs(&files) {
            match self.process(&planned) {
                Ok(written) => {
                    tracing::info!(
                        file = %written.source.display(),
                        output = %written.output.display(),
                        kind = %written.kind,
                        bytes = written.bytes,
                        "Wrote text"
                    );
                    report.written.push(written);
                }
                Err(err) if err.is_fatal() => {
                    tracing::error!(file = %planned.source.display(), error = %err, "Aborting batch");
                    return Err(err);
                }
                Err(err) => {
                    if matches!(err, TextbatchError::UnsupportedFormat(_)) {
                        tracing::warn!(file = %planned.source.display(), "Skipping unsupported file type");
                    } else {
                        tracing::warn!(file = %planned.source.display(), error = %err, "Failed to convert file");
                    }
                    report.failures.push(FileFailure::from_error(planned.source, &err));
                }
            }
        }

        tracing::info!(
            written = report.written.len(),
            failed = report.failures.len(),
            "Batch finished"
        );
        Ok(report)
    }

    fn process(&self, planned: &PlannedFile) -> Result<WrittenFile> {
        let Some(output_name) = planned.output_name.as_deref() else {
            return Err(TextbatchError::UnsupportedFormat(format!(
                "unsupported file type: {}",
                display_name(&planned.source)
            )));
        };

        let extractor = self.registry.get(planned.kind)?;
        tracing::debug!(
            file = %planned.source.display(),
            kind = %planned.kind,
            extractor = extractor.name(),
            "Extracting"
        );
        let result = extractor.extract_file(&planned.source)?;

        let output = self.output_dir.join(output_name);
        write_atomic(&output, result.content.as_bytes())?;

        Ok(WrittenFile {
            source: planned.source.clone(),
            output,
            kind: planned.kind,
            bytes: result.content.len(),
        })
    }

    /// Shut down every registered extractor.
    pub fn shutdown(mut self) -> Result<()> {
        self.registry.shutdown_all()
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Decide the output name of every file before any is processed.
///
/// A supported file is written as `stem.txt`. When several supported files
/// share a stem (ignoring case) each of them keeps its extension instead:
/// `stem.ext.txt`. Any name still taken after that gets a `-N` suffix, in
/// input order, so no output ever overwrites another from the same run.
pub fn plan_outputs(files: &[PathBuf]) -> Vec<PlannedFile> {
    let kinds: Vec<FileKind> = files.iter().map(classify).collect();

    let mut stem_counts: HashMap<String, usize> = HashMap::new();
    for (path, kind) in files.iter().zip(&kinds) {
        if kind.is_supported() {
            *stem_counts.entry(stem(path).to_lowercase()).or_default() += 1;
        }
    }

    let mut taken: HashSet<String> = HashSet::new();
    files
        .iter()
        .zip(kinds)
        .map(|(path, kind)| {
            if !kind.is_supported() {
                return PlannedFile {
                    source: path.clone(),
                    kind,
                    output_name: None,
                };
            }

            let stem = stem(path);
            let colliding = stem_counts.get(&stem.to_lowercase()).copied().unwrap_or(0) > 1;
            let base = if colliding {
                let name = display_name(path);
                tracing::warn!(
                    file = %path.display(),
                    output = %format!("{}.{}", name, OUTPUT_EXTENSION),
                    "Output name collides with another input; keeping the source extension"
                );
                name
            } else {
                stem
            };

            let mut candidate = format!("{}.{}", base, OUTPUT_EXTENSION);
            let mut suffix = 2;
            while !taken.insert(candidate.to_lowercase()) {
                candidate = format!("{}-{}.{}", base, suffix, OUTPUT_EXTENSION);
                suffix += 1;
            }

            PlannedFile {
                source: path.clone(),
                kind,
                output_name: Some(candidate),
            }
        })
        .collect()
}
