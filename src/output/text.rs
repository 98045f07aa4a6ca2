//! Plain text report.
//!
//! Each group is a header line followed by its paths, tab-indented:
//!
//! ```text
//! .jpg/s1a2b3c4d/2.1 MiB: 1 duplicate(s)
//! 	/photos/2019/beach.jpg
//! 	/backup/photos/beach.jpg
//! ```

use std::io;

use super::human_size;
use crate::duplicates::DuplicateGroups;

/// Text output formatter.
pub struct TextOutput<'a> {
    groups: &'a DuplicateGroups,
}

impl<'a> TextOutput<'a> {
    /// Create a new text output formatter.
    #[must_use]
    pub fn new(groups: &'a DuplicateGroups) -> Self {
        Self { groups }
    }

    /// Write the report to the given writer.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if writing fails.
    pub fn write_to<W: io::Write>(&self, mut writer: W) -> io::Result<()> {
        for (digest, paths) in self.groups.iter() {
            writeln!(
                writer,
                "{}/{}/{}: {} duplicate(s)",
                digest.extension,
                digest.hash,
                human_size(digest.size),
                paths.len().saturating_sub(1)
            )?;
            for path in paths {
                writeln!(writer, "\t{}", path.display())?;
            }
        }
        Ok(())
    }

    /// Render the report into a string.
    #[must_use]
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_to(&mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    }
}
