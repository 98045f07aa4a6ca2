//! Digest-keyed duplicate index.
//!
//! # Overview
//!
//! [`DuplicateIndex`] is the only structure written by several hash workers
//! at once. Every insertion takes one coarse lock around the whole map; the
//! critical section is a map lookup plus a `Vec::push`, so contention stays
//! low. If it ever shows up in profiles, the map can be split into N maps
//! keyed by a hash of the digest, each with its own lock.
//!
//! Once every worker has joined, [`DuplicateIndex::filter_to_duplicates_only`]
//! consumes the index and returns the frozen [`DuplicateGroups`]. Because
//! the writable index is moved into the filter, inserting after filtering
//! does not compile.
//!
//! # Example
//!
//! ```
//! use dupescan::duplicates::{Digest, DuplicateIndex};
//! use std::path::PathBuf;
//!
//! let index = DuplicateIndex::new();
//! let digest = Digest::new(".txt", 10_000, "s1a2b3c4d");
//! index.insert(digest.clone(), PathBuf::from("/r2/same.txt"));
//! index.insert(digest.clone(), PathBuf::from("/r1/same.txt"));
//! index.insert(Digest::new(".txt", 10_000, "s00000000"), PathBuf::from("/r1/other.txt"));
//!
//! let groups = index.filter_to_duplicates_only();
//! assert_eq!(groups.len(), 1);
//!
//! let stats = groups.aggregate();
//! assert_eq!(stats.duplicate_count, 1);
//! assert_eq!(stats.reclaimable_bytes, 10_000);
//! ```

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;

/// Content identity of a file: extension, size and content hash.
///
/// Two files with equal digests are treated as duplicates. Ordering is
/// total: size descending, then extension, then hash. This puts the
/// groups that waste the most space first in reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Digest {
    /// Lowercased extension including the dot, or empty
    pub extension: String,
    /// File size in bytes
    pub size: u64,
    /// Lowercase hexadecimal hash, possibly with a strategy prefix
    pub hash: String,
}

impl Digest {
    /// Create a new digest.
    #[must_use]
    pub fn new(extension: impl Into<String>, size: u64, hash: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
            size,
            hash: hash.into(),
        }
    }
}

impl Ord for Digest {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .size
            .cmp(&self.size)
            .then_with(|| self.extension.cmp(&other.extension))
            .then_with(|| self.hash.cmp(&other.hash))
    }
}

impl PartialOrd for Digest {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.extension, self.hash, self.size)
    }
}

/// Concurrently writable multimap from digest to paths.
#[derive(Debug, Default)]
pub struct DuplicateIndex {
    entries: Mutex<BTreeMap<Digest, Vec<PathBuf>>>,
}

impl DuplicateIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `path` to the entry for `digest`, creating it if absent.
    pub fn insert(&self, digest: Digest, path: PathBuf) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.entry(digest).or_default().push(path);
    }

    /// Number of distinct digests inserted so far.
    #[must_use]
    pub fn digest_count(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Freeze the index and drop every entry with fewer than two paths.
    ///
    /// Paths inside each retained entry are sorted so output does not depend
    /// on worker scheduling.
    #[must_use]
    pub fn filter_to_duplicates_only(self) -> DuplicateGroups {
        let entries = self.entries.into_inner().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();

        let entries: BTreeMap<_, _> = entries
            .into_iter()
            .filter(|(_, paths)| paths.len() > 1)
            .map(|(digest, mut paths)| {
                paths.sort();
                (digest, paths)
            })
            .collect();

        log::debug!(
            "Filtered duplicate index: {} of {} digests have duplicates",
            entries.len(),
            before
        );
        DuplicateGroups { entries }
    }
}

/// Aggregate statistics over the retained groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Aggregate {
    /// Number of retained groups
    pub group_count: usize,
    /// Σ (group size − 1)
    pub duplicate_count: usize,
    /// Σ (group size − 1) × file size
    pub reclaimable_bytes: u64,
}

/// One confirmed group of identical files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    /// Shared digest of all files in the group
    pub digest: Digest,
    /// Sorted paths, at least two
    pub paths: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Number of duplicate copies (total - 1 original).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.paths.len().saturating_sub(1)
    }

    /// Total wasted space (all copies minus one).
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.digest.size * self.duplicate_count() as u64
    }
}

/// Frozen, filtered duplicate index.
///
/// Every entry has at least two paths, sorted, and entries iterate in
/// [`Digest`] order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateGroups {
    entries: BTreeMap<Digest, Vec<PathBuf>>,
}

impl DuplicateGroups {
    /// Compute duplicate count and reclaimable bytes.
    #[must_use]
    pub fn aggregate(&self) -> Aggregate {
        self.entries
            .iter()
            .fold(Aggregate::default(), |mut acc, (digest, paths)| {
                let copies = paths.len().saturating_sub(1);
                acc.group_count += 1;
                acc.duplicate_count += copies;
                acc.reclaimable_bytes += digest.size * copies as u64;
                acc
            })
    }

    /// Iterate `(digest, sorted paths)` pairs in digest order.
    ///
    /// The iterator borrows the groups, so it can be restarted freely.
    pub fn iter(&self) -> impl Iterator<Item = (&Digest, &[PathBuf])> + '_ {
        self.entries
            .iter()
            .map(|(digest, paths)| (digest, paths.as_slice()))
    }

    /// Number of retained groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no duplicates were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check whether a digest has a retained group.
    #[must_use]
    pub fn contains(&self, digest: &Digest) -> bool {
        self.entries.contains_key(digest)
    }

    /// Paths of the group for `digest`, if retained.
    #[must_use]
    pub fn get(&self, digest: &Digest) -> Option<&[PathBuf]> {
        self.entries.get(digest).map(Vec::as_slice)
    }

    /// Check whether a path belongs to any retained group.
    #[must_use]
    pub fn contains_path(&self, path: &Path) -> bool {
        self.entries
            .values()
            .any(|paths| paths.binary_search_by(|p| p.as_path().cmp(path)).is_ok())
    }

    /// Convert into owned groups in digest order.
    #[must_use]
    pub fn into_groups(self) -> Vec<DuplicateGroup> {
        self.entries
            .into_iter()
            .map(|(digest, paths)| DuplicateGroup { digest, paths })
            .collect()
    }
}

impl<'a> IntoIterator for &'a DuplicateGroups {
    type Item = (&'a Digest, &'a Vec<PathBuf>);
    type IntoIter = std::collections::btree_map::Iter<'a, Digest, Vec<PathBuf>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
