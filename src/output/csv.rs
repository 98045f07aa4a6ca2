//! CSV output formatter for duplicate scan results.
//!
//! One row is generated for each duplicate file.
//!
//! # Columns
//!
//! - `file hash`: content hash as stored in the digest
//! - `file size`: file size in bytes
//! - `last modified`: local time as `02-Jan-2006 03:04:05 PM`
//! - `file path`: absolute path to the file

use std::io;

use chrono::{DateTime, Local};

use super::ReportError;
use crate::duplicates::DuplicateGroups;
use crate::scanner::PathIndex;

const HEADER: [&str; 4] = ["file hash", "file size", "last modified", "file path"];

/// Render an epoch timestamp as the `last modified` column.
#[must_use]
pub fn format_modified(epoch_seconds: i64) -> String {
    DateTime::from_timestamp(epoch_seconds, 0)
        .map(|utc| {
            utc.with_timezone(&Local)
                .format("%d-%b-%Y %I:%M:%S %p")
                .to_string()
        })
        .unwrap_or_default()
}

/// CSV output formatter.
pub struct CsvOutput<'a> {
    groups: &'a DuplicateGroups,
    files: &'a PathIndex,
}

impl<'a> CsvOutput<'a> {
    /// Create a new CSV output formatter.
    ///
    /// `files` supplies the modification time of each path.
    #[must_use]
    pub fn new(groups: &'a DuplicateGroups, files: &'a PathIndex) -> Self {
        Self { groups, files }
    }

    /// Write the CSV output to the given writer.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), ReportError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(HEADER)?;

        for (digest, paths) in self.groups.iter() {
            let size = digest.size.to_string();
            for path in paths {
                let modified = self
                    .files
                    .get(path)
                    .map(|meta| format_modified(meta.modified))
                    .unwrap_or_default();
                let path_text = path.to_string_lossy();
                csv_writer.write_record([
                    digest.hash.as_str(),
                    size.as_str(),
                    modified.as_str(),
                    &*path_text,
                ])?;
            }
        }

        csv_writer.flush()?;
        Ok(())
    }
}
