//! Filesystem helpers for serving a directory tree over a file-sharing
//! protocol.
//!
//! `davtree-core` provides the pieces a server needs between a request path
//! and the disk:
//!
//! - root containment and an access policy with restriction patterns
//! - lazy, depth-limited tree walking
//! - glob and predicate path filters
//! - revision tags for conditional requests
//! - export of whole trees or selections into ZIP and tar archives
//!
//! # Examples
//!
//! ```no_run
//! use davtree_core::AccessPolicy;
//! use davtree_core::ArchiveExporter;
//! use davtree_core::ExportConfig;
//! use davtree_core::PatternSet;
//! use davtree_core::export::ZipSink;
//! use std::fs::File;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let policy = AccessPolicy::new("/srv/files")
//!     .with_restrict_access(PatternSet::from_globs([".git", "*.php"])?);
//!
//! let exporter = ArchiveExporter::new(policy.root(), ExportConfig::default());
//! let mut sink = ZipSink::new(File::create("files.zip")?, None);
//! let report = exporter.export(&mut sink, |path| policy.can_read(path))?;
//! sink.finish()?;
//! println!("Exported {} files", report.files_added);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod etag;
pub mod export;
pub mod filter;
pub mod io;
pub mod multimap;
pub mod path;
pub mod security;
pub mod walk;

// Re-export main API types
pub use config::ExportConfig;
pub use config::ReadFailurePolicy;
pub use error::DavError;
pub use error::Result;
pub use etag::CacheTag;
pub use etag::Preconditions;
pub use export::ArchiveExporter;
pub use export::ExportProgress;
pub use export::ExportReport;
pub use export::NoopProgress;
pub use filter::Pattern;
pub use filter::PatternSet;
pub use security::AccessMode;
pub use security::AccessPolicy;
pub use security::is_inside;
pub use walk::DepthLimit;
pub use walk::walk;
