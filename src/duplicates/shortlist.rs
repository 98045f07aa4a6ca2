//! Candidate shortlisting by extension and size.
//!
//! # Overview
//!
//! Files with different sizes cannot be duplicates, so the first pass over
//! the [`PathIndex`] groups paths by [`CandidateKey`] (lowercased extension
//! plus exact size) and prunes every group with a single member. No file is
//! opened. Grouping by extension as well as size shrinks the hashing work;
//! the price is that identical files with different extensions are never
//! reported.
//!
//! # Example
//!
//! ```
//! use dupescan::duplicates::build_shortlist;
//! use dupescan::scanner::{FileMetadata, PathIndex};
//! use std::path::PathBuf;
//!
//! let mut index = PathIndex::new();
//! index.insert(PathBuf::from("/r1/a.txt"), FileMetadata::new(1024, 0));
//! index.insert(PathBuf::from("/r2/a.txt"), FileMetadata::new(1024, 0));
//! index.insert(PathBuf::from("/r1/a.md"), FileMetadata::new(1024, 0));
//!
//! let shortlist = build_shortlist(&index);
//! assert_eq!(shortlist.group_count(), 1);
//! assert_eq!(shortlist.candidate_count(), 2);
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use crate::scanner::{file_extension, PathIndex};

/// Grouping key for candidate files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CandidateKey {
    /// Lowercased extension including the dot, or empty
    pub extension: String,
    /// File size in bytes
    pub size: u64,
}

impl CandidateKey {
    /// Create a new candidate key.
    #[must_use]
    pub fn new(extension: impl Into<String>, size: u64) -> Self {
        Self {
            extension: extension.into(),
            size,
        }
    }
}

/// Candidate groups with at least two paths each.
#[derive(Debug, Clone, Default)]
pub struct Shortlist {
    groups: HashMap<CandidateKey, Vec<PathBuf>>,
}

impl Shortlist {
    /// Group the index by candidate key and drop singleton groups.
    #[must_use]
    pub fn from_index(index: &PathIndex) -> Self {
        let mut groups: HashMap<CandidateKey, Vec<PathBuf>> = HashMap::new();
        for (path, metadata) in index {
            let key = CandidateKey::new(file_extension(path), metadata.size);
            groups.entry(key).or_default().push(path.clone());
        }

        let total_keys = groups.len();
        groups.retain(|_, paths| paths.len() > 1);
        for paths in groups.values_mut() {
            paths.sort();
        }

        log::debug!(
            "Shortlist: {} of {} (extension, size) groups have candidates",
            groups.len(),
            total_keys
        );
        Self { groups }
    }

    /// Number of candidate groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Number of candidate files across all groups.
    #[must_use]
    pub fn candidate_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Check if there is nothing to hash.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Paths sharing `key`, if it is a candidate group.
    #[must_use]
    pub fn get(&self, key: &CandidateKey) -> Option<&[PathBuf]> {
        self.groups.get(key).map(Vec::as_slice)
    }

    /// Groups in key order.
    ///
    /// The order is stable across runs, so shard boundaries are too.
    #[must_use]
    pub fn groups_ordered(&self) -> Vec<(&CandidateKey, &[PathBuf])> {
        let mut ordered: Vec<_> = self
            .groups
            .iter()
            .map(|(key, paths)| (key, paths.as_slice()))
            .collect();
        ordered.sort_by(|a, b| a.0.cmp(b.0));
        ordered
    }
}

/// Build the shortlist for a completed path index.
#[must_use]
pub fn build_shortlist(index: &PathIndex) -> Shortlist {
    Shortlist::from_index(index)
}
