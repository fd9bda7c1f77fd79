//! textbatch command-line interface.
//!
//! # Commands
//!
//! - `run`: convert every file in the input folder into a `.txt` file
//! - `detect`: print how each given path would be classified
//!
//! Configuration comes from `--config`, else `textbatch.toml` found by walking
//! up from the current directory, else defaults. Flags override file values.
//!
//! The process exits with status 0 when the batch ran, even if individual
//! files failed; configuration and run-level errors exit non-zero.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use textbatch::{BatchConfig, BatchReport, BatchRunner, RasterizerKind, classify};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "textbatch=info";
const VERBOSE_LOG_FILTER: &str = "textbatch=debug,textbatch_cli=debug";

/// Batch-convert PDFs, Word documents, text files and scanned images into plain text
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert every file in the input folder
    Run {
        /// Folder holding the source files
        #[arg(short, long)]
        input_dir: Option<PathBuf>,

        /// Folder the text files are written to
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Configuration file (.toml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Path to the tesseract executable
        #[arg(long)]
        tesseract: Option<PathBuf>,

        /// OCR language, e.g. "eng" or "eng+deu"
        #[arg(long)]
        language: Option<String>,

        /// Rendering resolution for PDF pages without a text layer
        #[arg(long)]
        dpi: Option<u32>,

        /// OCR every PDF page, ignoring the text layer
        #[arg(long)]
        force_ocr: bool,

        /// Leave images embedded in text pages of PDFs unread
        #[arg(long)]
        skip_embedded_images: bool,

        /// How image-only PDF pages are turned into pixels
        #[arg(long, value_enum)]
        rasterizer: Option<RasterizerArg>,

        /// Summary format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Print the detected kind of each path
    Detect {
        /// Paths to classify
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum RasterizerArg {
    Auto,
    Pdfium,
    EmbeddedImages,
}

impl From<RasterizerArg> for RasterizerKind {
    fn from(arg: RasterizerArg) -> Self {
        match arg {
            RasterizerArg::Auto => RasterizerKind::Auto,
            RasterizerArg::Pdfium => RasterizerKind::Pdfium,
            RasterizerArg::EmbeddedImages => RasterizerKind::EmbeddedImages,
        }
    }
}

/// Overrides given on the command line.
#[derive(Debug, Default)]
struct Overrides {
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    tesseract: Option<PathBuf>,
    language: Option<String>,
    dpi: Option<u32>,
    force_ocr: bool,
    skip_embedded_images: bool,
    rasterizer: Option<RasterizerArg>,
}

impl Overrides {
    fn apply(self, config: &mut BatchConfig) {
        if let Some(input_dir) = self.input_dir {
            config.input_dir = input_dir;
        }
        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        }
        if let Some(tesseract) = self.tesseract {
            config.ocr.tesseract_path = Some(tesseract);
        }
        if let Some(language) = self.language {
            config.ocr.language = language;
        }
        if let Some(dpi) = self.dpi {
            config.pdf.dpi = dpi;
        }
        if self.force_ocr {
            config.pdf.force_ocr = true;
        }
        if self.skip_embedded_images {
            config.pdf.ocr_embedded_images = false;
        }
        if let Some(rasterizer) = self.rasterizer {
            config.pdf.rasterizer = rasterizer.into();
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(VERBOSE_LOG_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<BatchConfig> {
    if let Some(path) = path {
        return BatchConfig::from_file(path).with_context(|| format!("Failed to load config from {}", path.display()));
    }
    match BatchConfig::discover().context("Failed to discover textbatch.toml")? {
        Some(config) => Ok(config),
        None => {
            tracing::debug!("No textbatch.toml found, using defaults");
            Ok(BatchConfig::default())
        }
    }
}

fn run(config_path: Option<&Path>, overrides: Overrides, format: OutputFormat) -> Result<()> {
    let mut config = load_config(config_path)?;
    overrides.apply(&mut config);

    let runner = BatchRunner::from_config(&config).context("Cannot start batch")?;
    tracing::debug!(extractors = ?runner.registry().list(), "Registered extractors");
    let report = runner
        .run()
        .with_context(|| format!("Batch over {} failed", runner.input_dir().display()))?;

    match format {
        OutputFormat::Text => print_report(&report, runner.output_dir()),
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("Failed to serialize report to JSON")?
            );
        }
    }

    runner.shutdown().context("Failed to shut down extractors")?;
    Ok(())
}

fn print_report(report: &BatchReport, output_dir: &Path) {
    println!(
        "Converted {} of {} files into {}",
        report.written.len(),
        report.total(),
        output_dir.display()
    );
    if !report.failures.is_empty() {
        println!("Skipped {} files:", report.failures.len());
        for failure in &report.failures {
            println!("  {}: {}", failure.path.display(), failure.message);
        }
    }
}

fn detect(paths: &[PathBuf], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for path in paths {
                println!("{}\t{}", path.display(), classify(path));
            }
        }
        OutputFormat::Json => {
            let entries: Vec<serde_json::Value> = paths
                .iter()
                .map(|path| {
                    serde_json::json!({
                        "path": path.display().to_string(),
                        "kind": classify(path),
                    })
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&entries).context("Failed to serialize detection results to JSON")?
            );
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Run {
            input_dir,
            output_dir,
            config,
            tesseract,
            language,
            dpi,
            force_ocr,
            skip_embedded_images,
            rasterizer,
            format,
        } => {
            let overrides = Overrides {
                input_dir,
                output_dir,
                tesseract,
                language,
                dpi,
                force_ocr,
                skip_embedded_images,
                rasterizer,
            };
            run(config.as_deref(), overrides, format)
        }
        Command::Detect { paths, format } => detect(&paths, format),
    }
}
