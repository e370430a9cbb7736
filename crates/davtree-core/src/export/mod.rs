//! Archive export of directory trees.
//!
//! [`ArchiveExporter`] walks a tree, filters it through an access check and
//! writes regular files into an [`ArchiveSink`]. Two sinks are provided:
//!
//! - [`ZipSink`]: ZIP with deflate compression
//! - [`TarSink`]: tar, plain or gzip compressed
//!
//! Entry names are relative to the export root and transcoded to code page
//! 437 (see [`EntryName`]).

pub mod encoding;
pub mod exporter;
pub mod format;
pub mod progress;
pub mod report;
pub mod sink;

// Re-export main types for convenience
pub use encoding::EntryName;
pub use exporter::ArchiveExporter;
pub use format::ArchiveFormat;
pub use progress::ExportProgress;
pub use progress::NoopProgress;
pub use report::ExportReport;
pub use report::SkipReason;
pub use sink::ArchiveSink;
pub use sink::EntryMeta;
pub use sink::TarSink;
pub use sink::ZipSink;
