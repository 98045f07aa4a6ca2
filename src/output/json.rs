//! JSON output formatter for duplicate scan results.
//!
//! The report is an array of groups in digest order:
//!
//! ```json
//! [{"extension":".jpg","size":2048,"hash":"s1a2b3c4d","paths":["/a.jpg","/b.jpg"]}]
//! ```

use std::io;

use serde::Serialize;

use super::ReportError;
use crate::duplicates::DuplicateGroups;

/// A duplicate group in JSON format.
#[derive(Debug, Serialize)]
struct JsonGroup<'a> {
    extension: &'a str,
    size: u64,
    hash: &'a str,
    paths: Vec<String>,
}

/// JSON output formatter.
pub struct JsonOutput<'a> {
    groups: &'a DuplicateGroups,
}

impl<'a> JsonOutput<'a> {
    /// Create a new JSON output formatter.
    #[must_use]
    pub fn new(groups: &'a DuplicateGroups) -> Self {
        Self { groups }
    }

    fn records(&self) -> Vec<JsonGroup<'a>> {
        self.groups
            .iter()
            .map(|(digest, paths)| JsonGroup {
                extension: &digest.extension,
                size: digest.size,
                hash: &digest.hash,
                paths: paths
                    .iter()
                    .map(|p| p.to_string_lossy().into_owned())
                    .collect(),
            })
            .collect()
    }

    /// Write the JSON output to the given writer.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] if serialization or writing fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), ReportError> {
        serde_json::to_writer(writer, &self.records())?;
        Ok(())
    }

    /// Generate pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(&self.records())?)
    }
}
