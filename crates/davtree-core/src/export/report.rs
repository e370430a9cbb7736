//! Export operation reporting.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::multimap::Multimap;

/// Why a walked path did not become an archive entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SkipReason {
    /// The access check rejected the path.
    AccessDenied,
    /// The path is a directory; only files are exported.
    Directory,
    /// The path is a symbolic link, which is never followed.
    Symlink,
    /// The path is a device, socket, FIFO or similar.
    Special,
    /// The file vanished or failed to read, and the policy was to skip it.
    Unreadable,
    /// Another file was already written under the same entry name.
    DuplicateName,
    /// The exporter was told never to write this path, e.g. the archive
    /// being produced.
    Excluded,
}

impl SkipReason {
    /// Returns a short lowercase label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::AccessDenied => "access denied",
            Self::Directory => "directory",
            Self::Symlink => "symlink",
            Self::Special => "special file",
            Self::Unreadable => "unreadable",
            Self::DuplicateName => "duplicate name",
            Self::Excluded => "excluded",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Report of an export operation.
///
/// # Examples
///
/// ```
/// use davtree_core::export::ExportReport;
/// use davtree_core::export::SkipReason;
///
/// let mut report = ExportReport::new();
/// report.files_added = 2;
/// report.skip(SkipReason::Directory, "b");
///
/// assert_eq!(report.files_skipped(), 1);
/// assert!(report.skipped_for(SkipReason::Unreadable).is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    /// Number of files written to the archive.
    pub files_added: usize,

    /// Total bytes read from source files.
    pub bytes_read: u64,

    /// Duration of the export.
    pub duration: Duration,

    /// Paths left out, grouped by reason.
    pub skipped: Multimap<SkipReason, PathBuf>,
}

impl ExportReport {
    /// Creates a new empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a skipped path.
    pub fn skip(&mut self, reason: SkipReason, path: impl Into<PathBuf>) {
        self.skipped.insert(reason, path.into());
    }

    /// Returns the number of skipped paths across all reasons.
    #[must_use]
    pub fn files_skipped(&self) -> usize {
        self.skipped.total()
    }

    /// Returns the paths skipped for `reason`.
    #[must_use]
    pub fn skipped_for(&self, reason: SkipReason) -> &[PathBuf] {
        self.skipped.get(&reason)
    }

    /// Returns whether any file was dropped because it could not be read.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.skipped_for(SkipReason::Unreadable).is_empty()
    }
}
