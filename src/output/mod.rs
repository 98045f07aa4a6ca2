//! Report writers for duplicate scan results.
//!
//! This module renders a [`RunResult`] in one of four modes:
//! - `text`: `duplicates_<runid>.txt`, one block per group
//! - `csv`: `duplicates_<runid>.csv`, one row per file with its mtime
//! - `json`: `duplicates_<runid>.json`, an array of groups
//! - `print`: the text report on stdout under a run-id banner
//!
//! Groups are written in digest order and paths are sorted, so two runs over
//! the same files produce identical reports apart from the run id.
//!
//! # Example
//!
//! ```no_run
//! use dupescan::duplicates::DuplicateFinder;
//! use dupescan::output::{run_id, write_report, OutputMode};
//! use std::path::{Path, PathBuf};
//!
//! let finder = DuplicateFinder::with_defaults();
//! let result = finder.find_duplicates(&[PathBuf::from(".")]).unwrap();
//!
//! let written = write_report(&result, OutputMode::Csv, Path::new("."), &run_id()).unwrap();
//! println!("View duplicates report here: {}", written.unwrap().display());
//! ```

pub mod csv;
pub mod json;
pub mod text;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use bytesize::ByteSize;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::duplicates::RunResult;

// Re-export main types
pub use self::csv::CsvOutput;
pub use self::json::JsonOutput;
pub use self::text::TextOutput;

/// Report destination and format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Text file in the report directory
    #[default]
    Text,
    /// CSV file in the report directory
    Csv,
    /// JSON file in the report directory
    Json,
    /// Text report on stdout, no file
    Print,
}

impl OutputMode {
    /// File extension of the report, or `None` for [`OutputMode::Print`].
    #[must_use]
    pub fn file_extension(self) -> Option<&'static str> {
        match self {
            Self::Text => Some("txt"),
            Self::Csv => Some("csv"),
            Self::Json => Some("json"),
            Self::Print => None,
        }
    }

    /// Check whether this mode writes a file.
    #[must_use]
    pub fn writes_file(self) -> bool {
        self.file_extension().is_some()
    }
}

/// Errors that can occur while writing a report.
#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    /// The report file could not be created.
    #[error("couldn't create report file {path}: {source}")]
    Create {
        /// Report path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    /// Error during JSON serialization.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Run id for report names: local time as `YYMMDD_HHMMSS`.
#[must_use]
pub fn run_id() -> String {
    chrono::Local::now().format("%y%m%d_%H%M%S").to_string()
}

/// Path of the report file for `mode`, or `None` if it prints to stdout.
#[must_use]
pub fn report_path(dir: &Path, run_id: &str, mode: OutputMode) -> Option<PathBuf> {
    mode.file_extension()
        .map(|ext| dir.join(format!("duplicates_{run_id}.{ext}")))
}

/// Format a byte count with binary units.
#[must_use]
pub fn human_size(bytes: u64) -> String {
    ByteSize::b(bytes).to_string()
}

/// Banner printed above a stdout report.
#[must_use]
pub fn print_banner(run_id: &str) -> String {
    format!("\n==========================\nReport (run id {run_id})\n==========================\n")
}

/// Write the report for `result`.
///
/// Returns the path of the written file, or `None` for
/// [`OutputMode::Print`].
///
/// # Errors
///
/// Returns [`ReportError`] if the file cannot be created or written.
pub fn write_report(
    result: &RunResult,
    mode: OutputMode,
    dir: &Path,
    run_id: &str,
) -> Result<Option<PathBuf>, ReportError> {
    let Some(path) = report_path(dir, run_id, mode) else {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        out.write_all(print_banner(run_id).as_bytes())?;
        TextOutput::new(result.duplicates()).write_to(&mut out)?;
        out.flush()?;
        return Ok(None);
    };

    let file = File::create(&path).map_err(|source| ReportError::Create {
        path: path.clone(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    match mode {
        OutputMode::Text | OutputMode::Print => {
            TextOutput::new(result.duplicates()).write_to(&mut writer)?;
        }
        OutputMode::Csv => {
            CsvOutput::new(result.duplicates(), result.files()).write_to(&mut writer)?;
        }
        OutputMode::Json => {
            JsonOutput::new(result.duplicates()).write_to(&mut writer)?;
        }
    }
    writer.flush()?;

    log::debug!("Report written to {}", path.display());
    Ok(Some(path))
}
