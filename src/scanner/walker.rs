//! Directory walker implementation using walkdir.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing one root
//! directory and adding every qualifying regular file to a shared
//! [`PathIndex`], and [`scan_roots`] for scanning several roots in order.
//!
//! # Filtering
//!
//! - Entries whose basename is on the exclusion list are skipped; an excluded
//!   directory prunes its entire subtree
//! - AppleDouble artifacts (`._*`) are always skipped
//! - Only regular files are indexed; symlinks and special files are not
//! - Files strictly smaller than the minimum size are skipped
//! - Paths already in the index (overlapping roots) are not re-processed
//!
//! Errors below the root are reported and skipped. Only a failure to walk
//! the root itself is returned to the caller.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use walkdir::{DirEntry, WalkDir};

use super::{
    FileMetadata, PathIndex, RootFailurePolicy, ScanConfig, ScanError, MAC_ARTIFACT_PREFIX,
};
use crate::diagnostics::Diagnostics;

/// Directory walker for one root.
pub struct Walker<'a> {
    /// Root path to walk
    root: PathBuf,
    /// Filters
    config: &'a ScanConfig,
    /// Sink for per-entry warnings
    diagnostics: &'a dyn Diagnostics,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl<'a> Walker<'a> {
    /// Create a new walker for the given root.
    #[must_use]
    pub fn new(root: &Path, config: &'a ScanConfig, diagnostics: &'a dyn Diagnostics) -> Self {
        Self {
            root: root.to_path_buf(),
            config,
            diagnostics,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops as soon as possible
    /// and keeps whatever it has indexed so far.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Root directory of this walker.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the root and add qualifying files to `index`.
    ///
    /// Returns the number of bytes added to the index by this root.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] if the root is missing, is not a directory, or
    /// cannot be read. Errors below the root are reported through the
    /// diagnostics sink and skipped.
    pub fn populate(&self, index: &mut PathIndex) -> Result<u64, ScanError> {
        self.check_root()?;

        let mut scanned_bytes = 0u64;
        let entries = WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.is_excluded(entry));

        for entry_result in entries {
            if self.is_shutdown_requested() {
                log::debug!("Walker: Shutdown requested, stopping iteration");
                break;
            }

            let entry = match entry_result {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => {
                    return Err(ScanError::Root {
                        root: self.root.clone(),
                        source: err.into(),
                    });
                }
                Err(err) => {
                    self.report_entry_error(err);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if index.contains_key(path) {
                log::trace!("Already indexed: {}", path.display());
                continue;
            }
            if entry
                .file_name()
                .to_string_lossy()
                .starts_with(MAC_ARTIFACT_PREFIX)
            {
                log::trace!("Skipping AppleDouble file: {}", path.display());
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(err) => {
                    self.diagnostics.error(&format!(
                        "couldn't get metadata of \"{}\": {}",
                        path.display(),
                        err
                    ));
                    continue;
                }
            };

            let size = metadata.len();
            if size < self.config.min_size {
                log::trace!(
                    "Skipping file due to size filter ({}): {}",
                    size,
                    path.display()
                );
                continue;
            }

            index.insert(path.to_path_buf(), FileMetadata::from_metadata(&metadata));
            scanned_bytes += size;
        }

        log::debug!(
            "Walked {}: {} bytes indexed",
            self.root.display(),
            scanned_bytes
        );
        Ok(scanned_bytes)
    }

    /// Validate the root before walking it.
    fn check_root(&self) -> Result<(), ScanError> {
        match std::fs::metadata(&self.root) {
            Ok(metadata) if metadata.is_dir() => Ok(()),
            Ok(_) => Err(ScanError::NotADirectory(self.root.clone())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(ScanError::RootNotFound(self.root.clone()))
            }
            Err(err) => Err(ScanError::Root {
                root: self.root.clone(),
                source: err,
            }),
        }
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        let excluded = self
            .config
            .is_excluded(entry.file_name().to_string_lossy().as_ref());
        if excluded {
            log::trace!("Excluded: {}", entry.path().display());
        }
        excluded
    }

    /// Report a non-fatal error below the root and keep walking.
    fn report_entry_error(&self, err: walkdir::Error) {
        let path = err
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);
        let error = match err.io_error().map(std::io::Error::kind) {
            Some(std::io::ErrorKind::PermissionDenied) => ScanError::PermissionDenied(path),
            _ => ScanError::Io {
                path,
                source: err.into(),
            },
        };
        self.diagnostics
            .error(&format!("skipping \"{}\": {}", error.path().display(), error));
    }
}

/// Result of scanning one or more roots.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Every indexed file across all roots
    pub index: PathIndex,
    /// Total bytes of indexed files
    pub scanned_bytes: u64,
    /// Roots that failed and were skipped under [`RootFailurePolicy::Continue`]
    pub root_errors: Vec<ScanError>,
}

/// Scan `roots` in order into one shared index.
///
/// Roots are made absolute first so that index keys are absolute and
/// overlapping roots resolve to the same keys.
///
/// # Errors
///
/// Under [`RootFailurePolicy::Abort`], returns the first root failure.
/// Under [`RootFailurePolicy::Continue`], root failures are reported, kept in
/// [`ScanOutcome::root_errors`], and never returned.
pub fn scan_roots(
    roots: &[PathBuf],
    config: &ScanConfig,
    policy: RootFailurePolicy,
    diagnostics: &dyn Diagnostics,
    shutdown_flag: Option<&Arc<AtomicBool>>,
) -> Result<ScanOutcome, ScanError> {
    let mut outcome = ScanOutcome {
        index: PathIndex::with_capacity(10_000),
        ..Default::default()
    };

    for root in roots {
        if shutdown_flag.is_some_and(|f| f.load(Ordering::SeqCst)) {
            break;
        }

        let root = std::path::absolute(root).unwrap_or_else(|_| root.clone());
        let mut walker = Walker::new(&root, config, diagnostics);
        if let Some(flag) = shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }

        match walker.populate(&mut outcome.index) {
            Ok(bytes) => outcome.scanned_bytes += bytes,
            Err(err) => match policy {
                RootFailurePolicy::Abort => return Err(err),
                RootFailurePolicy::Continue => {
                    diagnostics.error(&format!(
                        "error while scanning directory {}: {}",
                        root.display(),
                        err
                    ));
                    outcome.root_errors.push(err);
                }
            },
        }
    }

    Ok(outcome)
}
