//! Progress callbacks for export.

use std::path::Path;

/// Callback trait for progress reporting during export.
///
/// The total number of entries is not known in advance because the tree is
/// walked lazily.
///
/// # Examples
///
/// ```
/// use davtree_core::export::ExportProgress;
/// use std::path::Path;
///
/// struct Printer;
///
/// impl ExportProgress for Printer {
///     fn on_entry_start(&mut self, name: &Path, index: usize) {
///         println!("[{index}] {}", name.display());
///     }
///
///     fn on_bytes_read(&mut self, _bytes: u64) {}
///
///     fn on_entry_complete(&mut self, _name: &Path) {}
///
///     fn on_complete(&mut self) {
///         println!("done");
///     }
/// }
/// ```
pub trait ExportProgress {
    /// Called before a file is written.
    ///
    /// # Arguments
    ///
    /// * `name` - Path of the entry relative to the export root
    /// * `index` - Entry number (1-indexed)
    fn on_entry_start(&mut self, name: &Path, index: usize);

    /// Called with the number of bytes read for the current entry.
    fn on_bytes_read(&mut self, bytes: u64);

    /// Called after an entry was written.
    fn on_entry_complete(&mut self, name: &Path);

    /// Called once when the export succeeded.
    fn on_complete(&mut self);
}

/// No-op implementation of `ExportProgress`.
#[derive(Debug, Default)]
pub struct NoopProgress;

impl ExportProgress for NoopProgress {
    fn on_entry_start(&mut self, _name: &Path, _index: usize) {}

    fn on_bytes_read(&mut self, _bytes: u64) {}

    fn on_entry_complete(&mut self, _name: &Path) {}

    fn on_complete(&mut self) {}
}
