//! Error conversion utilities for CLI.
//!
//! Converts davtree-core's typed errors (thiserror) into user-friendly
//! contextual errors (anyhow) with actionable guidance.

use anyhow::anyhow;
use davtree_core::DavError;
use davtree_core::Result;
use std::path::Path;

/// Converts `DavError` to user-friendly anyhow error with context
pub fn convert_dav_error(err: DavError, target: &Path) -> anyhow::Error {
    match err {
        DavError::Forbidden { path, reason } => {
            anyhow!(
                "Access denied to '{}' ({reason})\n\
                 HINT: Check --restrict patterns and file permissions under the root.",
                path.display()
            )
        }
        DavError::NotFound { path } => {
            anyhow!("Not found: '{}'", path.display())
        }
        DavError::Conflict { reason } => {
            anyhow!(
                "Conflict while processing '{}': {reason}\n\
                 HINT: The parent directory must exist before writing into it.",
                target.display()
            )
        }
        DavError::SourceRead { path, source } => {
            anyhow!(
                "Cannot read '{}' while exporting '{}': {source}\n\
                 HINT: Use --skip-unreadable to leave unreadable files out of the archive.",
                path.display(),
                target.display()
            )
        }
        DavError::UnsupportedFormat { path } => {
            anyhow!(
                "Archive format not supported: {}\n\
                 HINT: Supported formats: zip, tar, tar.gz, tgz",
                path.display()
            )
        }
        DavError::ContainmentViolation { path, root } => {
            anyhow!(
                "Internal error: '{}' escaped export root '{}'\n\
                 HINT: This is a bug. Please report it.",
                path.display(),
                root.display()
            )
        }
        DavError::Io(io_err) => {
            anyhow!("I/O error while processing '{}': {io_err}", target.display())
        }
        _ => anyhow::Error::from(err).context(format!("Error processing '{}'", target.display())),
    }
}

/// Adds context to a core result about the path being processed
pub fn add_path_context<T>(result: Result<T>, target: &Path) -> anyhow::Result<T> {
    result.map_err(|e| convert_dav_error(e, target))
}
