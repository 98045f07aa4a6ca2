//! dupescan - find duplicate files by content
//!
//! Files under one or more directory trees are indexed, grouped by
//! extension and size, and only the groups with more than one member are
//! hashed. Files whose digests match are reported as duplicates along with
//! the space that removing the extra copies would reclaim.
//!
//! # Overview
//!
//! - [`scanner`] walks the roots into a [`scanner::PathIndex`] and computes
//!   per-file digests
//! - [`duplicates`] shortlists candidates, hashes them in parallel and
//!   collects the final [`duplicates::DuplicateGroups`]
//! - [`output`] writes the text, CSV, JSON or stdout report
//!
//! # Example
//!
//! ```no_run
//! use dupescan::duplicates::{DuplicateFinder, FinderConfig};
//! use dupescan::scanner::ScanConfig;
//! use std::path::PathBuf;
//!
//! let config = FinderConfig::default()
//!     .with_scan_config(ScanConfig::default().with_min_size(4096));
//! let result = DuplicateFinder::new(config)
//!     .find_duplicates(&[PathBuf::from("/home/user/Photos")])
//!     .unwrap();
//!
//! for (digest, paths) in result.duplicates() {
//!     println!("{digest}: {} copies", paths.len());
//! }
//! ```

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod duplicates;
pub mod error;
pub mod exclusions;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cli::Cli;
use crate::config::Settings;
use crate::diagnostics::{ConsoleDiagnostics, Diagnostics};
use crate::duplicates::{DuplicateFinder, FinderConfig};
use crate::error::{ExitCode, InvalidInput};
use crate::exclusions::{default_exclusions, load_exclusions};
use crate::output::{human_size, run_id, write_report};
use crate::scanner::ScanConfig;

/// Check that every argument is a readable directory and make it absolute.
///
/// # Errors
///
/// Returns [`InvalidInput`] naming the first argument (1-based) that is not
/// a directory.
pub fn validate_directories(directories: &[PathBuf]) -> Result<Vec<PathBuf>, InvalidInput> {
    directories
        .iter()
        .enumerate()
        .map(|(i, dir)| {
            let readable = std::fs::metadata(dir).is_ok_and(|m| m.is_dir());
            if !readable {
                return Err(InvalidInput(format!(
                    "input #{} \"{}\" isn't a readable directory",
                    i + 1,
                    dir.display()
                )));
            }
            Ok(std::path::absolute(dir).unwrap_or_else(|_| dir.clone()))
        })
        .collect()
}

/// Run the application logic for parsed command-line arguments.
///
/// # Errors
///
/// Returns an error for unusable arguments, a failed scan or a report that
/// could not be written. Map it to a process exit code with
/// [`error::exit_code_for`].
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    if cli.no_color {
        yansi::disable();
    }

    let shutdown = signal::install_handler().context("Failed to install Ctrl+C handler")?;

    let mut settings =
        Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;
    settings.apply_cli(&cli);
    log::debug!("Effective settings: {settings:?}");

    let roots = validate_directories(&cli.directories)?;

    if settings.output.writes_file() && !settings.report_dir.is_dir() {
        return Err(InvalidInput(format!(
            "report directory \"{}\" isn't a directory",
            settings.report_dir.display()
        ))
        .into());
    }

    let exclusions = match settings.exclusions_file {
        Some(ref path) => load_exclusions(path)?,
        None => default_exclusions(),
    };

    let diagnostics: Arc<dyn Diagnostics> =
        Arc::new(ConsoleDiagnostics::new().with_quiet(cli.quiet));
    let progress = settings
        .progress
        .into_callback(Arc::clone(&diagnostics), cli.quiet);

    let config = FinderConfig::default()
        .with_scan_config(
            ScanConfig::default()
                .with_exclusions(exclusions)
                .with_min_size(settings.min_size_bytes()),
        )
        .with_parallelism(settings.resolve_parallelism())
        .with_strategy(settings.strategy())
        .with_schedule(settings.schedule.into_schedule())
        .with_root_failure(settings.root_failure)
        .with_diagnostics(Arc::clone(&diagnostics))
        .with_progress_callback(progress)
        .with_shutdown_flag(shutdown.share())
        .with_progress_timing(
            settings.progress_initial_delay(),
            settings.progress_interval(),
        );

    let run_id = run_id();
    let result = DuplicateFinder::new(config)
        .find_duplicates(&roots)
        .context("error while finding duplicates")?;

    if result.is_empty() {
        diagnostics.info("No actions performed!");
    } else if !result.has_duplicates() {
        diagnostics.info("No duplicates found!");
    } else {
        diagnostics.info(&format!(
            "Found {} duplicates. A total of {} can be saved by removing them.",
            result.duplicate_count(),
            human_size(result.reclaimable_bytes())
        ));

        let written = write_report(&result, settings.output, &settings.report_dir, &run_id)
            .context("error while reporting to file")?;
        if let Some(path) = written {
            diagnostics.info(&format!("View duplicates report here: {}", path.display()));
        }
    }

    if result.root_errors().is_empty() {
        Ok(ExitCode::Success)
    } else {
        log::warn!(
            "{} of {} directories could not be scanned",
            result.root_errors().len(),
            roots.len()
        );
        Ok(ExitCode::PartialSuccess)
    }
}
