//! Per-file content digests.
//!
//! # Overview
//!
//! Two strategies are supported, picked once per run:
//!
//! - [`DigestStrategy::Sampled`] (fast mode): files up to
//!   [`SAMPLING_THRESHOLD`] bytes are checksummed whole; larger files are
//!   checksummed over three fixed windows (head, middle, tail). The checksum
//!   is CRC-32 (IEEE). The hash string is tagged with [`WHOLE_FILE_PREFIX`] or
//!   [`SAMPLED_PREFIX`] so the two cases never compare equal.
//! - [`DigestStrategy::Full`] (thorough mode): SHA-256 over the entire file.
//!
//! Hash strings are lowercase hexadecimal; digest equality is plain string
//! equality.

use std::fs::{self, File};
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

use super::{file_extension, DigestError};
use crate::duplicates::Digest;

/// Files up to this size are checksummed whole in sampled mode.
pub const SAMPLING_THRESHOLD: u64 = 8 * 1024;

/// Hash prefix for whole-file checksums in sampled mode.
pub const WHOLE_FILE_PREFIX: &str = "f";

/// Hash prefix for windowed checksums in sampled mode.
pub const SAMPLED_PREFIX: &str = "s";

const HEAD_WINDOW: usize = (SAMPLING_THRESHOLD / 2) as usize;
const QUARTER_WINDOW: usize = (SAMPLING_THRESHOLD / 4) as usize;
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Content digest strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestStrategy {
    /// CRC-32 over the whole file (small files) or three sampled windows.
    #[default]
    Sampled,
    /// SHA-256 over the whole file.
    Full,
}

impl DigestStrategy {
    /// Map the `--thorough` flag to a strategy.
    #[must_use]
    pub fn from_thorough(thorough: bool) -> Self {
        if thorough {
            Self::Full
        } else {
            Self::Sampled
        }
    }

    /// Short name used in log output.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Sampled => "sampled",
            Self::Full => "full",
        }
    }
}

/// Compute the digest of one file.
///
/// The file is stat'ed again rather than trusting the scan metadata, so a file
/// that was deleted or replaced by something other than a regular file since
/// the scan fails here with an error instead of producing a bogus digest.
///
/// # Errors
///
/// Returns [`DigestError`] if the file cannot be stat'ed, is not a regular
/// file, or cannot be read in full.
pub fn compute_digest(path: &Path, strategy: DigestStrategy) -> Result<Digest, DigestError> {
    let metadata = fs::symlink_metadata(path).map_err(|source| DigestError::Stat {
        path: path.to_path_buf(),
        source,
    })?;
    if !metadata.file_type().is_file() {
        return Err(DigestError::NotRegularFile(path.to_path_buf()));
    }
    let size = metadata.len();

    let hash = match strategy {
        DigestStrategy::Full => full_hash(path)?,
        DigestStrategy::Sampled if size <= SAMPLING_THRESHOLD => {
            let bytes = fs::read(path).map_err(|source| DigestError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            format!("{WHOLE_FILE_PREFIX}{:08x}", crc32fast::hash(&bytes))
        }
        DigestStrategy::Sampled => {
            format!("{SAMPLED_PREFIX}{:08x}", sampled_checksum(path, size)?)
        }
    };

    log::trace!("{} digest of {}: {}", strategy.name(), path.display(), hash);
    Ok(Digest::new(file_extension(path), size, hash))
}

/// SHA-256 of the entire file, streamed.
fn full_hash(path: &Path) -> Result<String, DigestError> {
    let read_err = |source| DigestError::Read {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(read_err)?;
    let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];
    loop {
        let bytes_read = reader.read(&mut buffer).map_err(read_err)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// CRC-32 of the head, middle and tail windows of a file larger than
/// [`SAMPLING_THRESHOLD`].
///
/// Windows: the first half-threshold bytes, a quarter-threshold starting at
/// `size / 2`, and the last quarter-threshold bytes, checksummed in that order.
fn sampled_checksum(path: &Path, size: u64) -> Result<u32, DigestError> {
    let mut file = File::open(path).map_err(|source| DigestError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut hasher = crc32fast::Hasher::new();
    let windows: [(&'static str, u64, usize); 3] = [
        ("first", 0, HEAD_WINDOW),
        ("middle", size / 2, QUARTER_WINDOW),
        ("end", size - QUARTER_WINDOW as u64, QUARTER_WINDOW),
    ];

    let mut buffer = vec![0u8; HEAD_WINDOW];
    for (window, offset, len) in windows {
        read_window(&mut file, offset, &mut buffer[..len]).map_err(|source| {
            DigestError::Sample {
                path: path.to_path_buf(),
                window,
                source,
            }
        })?;
        hasher.update(&buffer[..len]);
    }
    Ok(hasher.finalize())
}

/// Fill `buffer` from `offset`. A file that shrank underneath us is an error,
/// never a silently shorter window.
fn read_window(file: &mut File, offset: u64, buffer: &mut [u8]) -> std::io::Result<()> {
    file.seek(SeekFrom::Start(offset))?;
    file.read_exact(buffer)
}
