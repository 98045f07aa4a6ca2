//! Exclusion lists.
//!
//! An exclusion list is a newline-separated set of basenames. A matching
//! directory is pruned with its whole subtree, a matching file is skipped.
//! When no list is given, the list embedded from `default_exclusions.txt`
//! is used (VCS metadata, OS artifacts, `node_modules` and similar).

use std::collections::HashSet;
use std::path::{Path, PathBuf};

const DEFAULT_EXCLUSIONS: &str = include_str!("default_exclusions.txt");

/// Errors that can occur while loading an exclusion list.
#[derive(thiserror::Error, Debug)]
pub enum ExclusionsError {
    /// The path is not a readable regular file.
    #[error("exclusions file {0} should be a readable file")]
    NotAFile(PathBuf),

    /// Reading the file failed.
    #[error("unable to read exclusions file {path}: {source}")]
    Read {
        /// File that failed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Parse a newline-separated list of basenames.
///
/// Windows line endings are accepted. Lines are trimmed and blank lines
/// dropped.
#[must_use]
pub fn parse_exclusions(text: &str) -> HashSet<String> {
    text.replace("\r\n", "\n")
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// The embedded default exclusion list.
#[must_use]
pub fn default_exclusions() -> HashSet<String> {
    parse_exclusions(DEFAULT_EXCLUSIONS)
}

/// Load an exclusion list from a file.
///
/// # Errors
///
/// Returns [`ExclusionsError`] if `path` is not a regular file or cannot be
/// read as UTF-8 text.
pub fn load_exclusions(path: &Path) -> Result<HashSet<String>, ExclusionsError> {
    let is_file = std::fs::metadata(path).is_ok_and(|m| m.is_file());
    if !is_file {
        return Err(ExclusionsError::NotAFile(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path).map_err(|source| ExclusionsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let exclusions = parse_exclusions(&text);
    log::debug!(
        "Loaded {} exclusions from {}",
        exclusions.len(),
        path.display()
    );
    Ok(exclusions)
}
