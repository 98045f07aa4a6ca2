//! Scanner module for directory traversal and content digests.
//!
//! This module provides functionality for:
//! - Sequential directory walking with exclusion and size filters
//! - Content digests in sampled (CRC-32) or full (SHA-256) mode
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and the path → metadata index
//! - [`hasher`]: Per-file digest computation
//!
//! # Example
//!
//! ```no_run
//! use dupescan::diagnostics::NullDiagnostics;
//! use dupescan::scanner::{PathIndex, ScanConfig, Walker};
//! use std::path::Path;
//!
//! let config = ScanConfig::default().with_min_size(4096);
//! let diagnostics = NullDiagnostics;
//! let walker = Walker::new(Path::new("/home/user/Pictures"), &config, &diagnostics);
//!
//! let mut index = PathIndex::new();
//! let bytes = walker.populate(&mut index).unwrap();
//! println!("{} files, {} bytes", index.len(), bytes);
//! ```

pub mod hasher;
pub mod walker;

use std::collections::{HashMap, HashSet};
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

// Re-export main types
pub use hasher::{compute_digest, DigestStrategy, SAMPLED_PREFIX, SAMPLING_THRESHOLD, WHOLE_FILE_PREFIX};
pub use walker::{scan_roots, ScanOutcome, Walker};

/// Basename prefix of AppleDouble resource-fork files. Always skipped.
pub const MAC_ARTIFACT_PREFIX: &str = "._";

/// Size and modification time of one scanned regular file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FileMetadata {
    /// File size in bytes
    pub size: u64,
    /// Last modification time in seconds since the Unix epoch
    pub modified: i64,
}

impl FileMetadata {
    /// Create a new metadata record.
    #[must_use]
    pub fn new(size: u64, modified: i64) -> Self {
        Self { size, modified }
    }

    /// Build a record from filesystem metadata.
    ///
    /// Files with an unreadable or pre-epoch mtime get a negative or zero
    /// timestamp rather than failing the scan.
    #[must_use]
    pub fn from_metadata(metadata: &Metadata) -> Self {
        let modified = metadata
            .modified()
            .map(epoch_seconds)
            .unwrap_or_default();
        Self {
            size: metadata.len(),
            modified,
        }
    }

    /// Modification time as a [`SystemTime`].
    #[must_use]
    pub fn modified_time(&self) -> SystemTime {
        if self.modified >= 0 {
            UNIX_EPOCH + Duration::from_secs(self.modified.unsigned_abs())
        } else {
            UNIX_EPOCH - Duration::from_secs(self.modified.unsigned_abs())
        }
    }
}

fn epoch_seconds(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_secs()).unwrap_or(i64::MAX),
        Err(before) => -i64::try_from(before.duration().as_secs()).unwrap_or(i64::MAX),
    }
}

/// Absolute path → metadata for every file that survived the scan filters.
pub type PathIndex = HashMap<PathBuf, FileMetadata>;

/// Filters applied while walking.
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// File or directory basenames to skip entirely.
    /// A matching directory prunes its whole subtree.
    pub exclusions: HashSet<String>,

    /// Minimum file size to include (in bytes).
    /// Files strictly smaller than this are skipped.
    pub min_size: u64,
}

impl ScanConfig {
    /// Set the exclusion set.
    #[must_use]
    pub fn with_exclusions(mut self, exclusions: HashSet<String>) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Set the minimum file size in bytes.
    #[must_use]
    pub fn with_min_size(mut self, min_size: u64) -> Self {
        self.min_size = min_size;
        self
    }

    /// Check whether a basename is on the exclusion list.
    #[must_use]
    pub fn is_excluded(&self, name: &str) -> bool {
        self.exclusions.contains(name)
    }
}

/// What to do when an entire root directory cannot be walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootFailurePolicy {
    /// Report the failure, keep it in the run result, scan the remaining roots.
    #[default]
    Continue,
    /// Stop at the first failing root and surface its error.
    Abort,
}

/// Lowercased suffix of the file name starting at its last `.`.
///
/// A dotfile is all suffix (`".bashrc"`), a trailing dot yields `"."`, and
/// a name without any dot maps to the empty string.
#[must_use]
pub fn file_extension(path: &Path) -> String {
    let Some(name) = path.file_name() else {
        return String::new();
    };
    let name = name.to_string_lossy();
    name.rfind('.')
        .map(|dot| name[dot..].to_lowercase())
        .unwrap_or_default()
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// The root directory does not exist.
    #[error("Path not found: {0}")]
    RootNotFound(PathBuf),

    /// The root path exists but is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The root directory itself could not be walked.
    #[error("couldn't scan directory {root}: {source}")]
    Root {
        /// Root directory that failed
        root: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Permission was denied when accessing an entry below a root.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while accessing an entry below a root.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// The path this error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::RootNotFound(path) | Self::NotADirectory(path) | Self::PermissionDenied(path) => {
                path
            }
            Self::Root { root, .. } => root,
            Self::Io { path, .. } => path,
        }
    }
}

/// Errors that can occur while computing a file digest.
#[derive(thiserror::Error, Debug)]
pub enum DigestError {
    /// The path could not be stat'ed (deleted or rotated since the scan).
    #[error("couldn't stat {path}: {source}")]
    Stat {
        /// File that failed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The path is no longer a regular file.
    #[error("can't compute hash of non-regular file {0}")]
    NotRegularFile(PathBuf),

    /// Reading the file failed.
    #[error("couldn't read {path}: {source}")]
    Read {
        /// File that failed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// One of the sampling windows could not be read in full.
    #[error("couldn't read {window} bytes of {path} (maybe file is corrupted?): {source}")]
    Sample {
        /// File that failed
        path: PathBuf,
        /// Which window failed: "first", "middle" or "end"
        window: &'static str,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}
