//! Batch orchestration.
//!
//! - **Formats**: classifying source files by extension
//! - **Configuration**: loading and validating [`BatchConfig`]
//! - **I/O**: listing the input folder and writing outputs atomically
//! - **Batch**: the driver that ties classification, extraction and output together
//!
//! # Example
//!
//! ```rust,no_run
//! use textbatch::core::batch::BatchRunner;
//! use textbatch::core::config::BatchConfig;
//!
//! # fn example() -> textbatch::Result<()> {
//! let config = BatchConfig::discover()?.unwrap_or_default();
//! let report = BatchRunner::from_config(&config)?.run()?;
//! println!("{} written, {} failed", report.written.len(), report.failures.len());
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod config;
pub mod formats;
pub mod io;

pub use batch::{BatchRunner, PlannedFile, plan_outputs};
pub use config::{BatchConfig, OcrConfig, PdfConfig, RasterizerKind, TableConfig};
pub use formats::{FileKind, classify};
