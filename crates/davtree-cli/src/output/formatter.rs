//! Output formatter trait for CLI results.

use anyhow::Result;
use davtree_core::AccessMode;
use davtree_core::CacheTag;
use davtree_core::ExportReport;
use serde::Serialize;
use std::path::Path;
use std::path::PathBuf;

/// Common output formatter trait
pub trait OutputFormatter {
    /// Format export result
    fn format_export_result(&self, output_path: &Path, report: &ExportReport) -> Result<()>;

    /// Format the paths produced by a walk
    fn format_walk(&self, root: &Path, paths: &[PathBuf]) -> Result<()>;

    /// Format a revision tag, with the precondition outcome if one was given
    fn format_etag(&self, file: &Path, tag: Option<&CacheTag>, passed: Option<bool>)
    -> Result<()>;

    /// Format a granted access check
    fn format_access(&self, request: &Path, mode: AccessMode, local: &Path) -> Result<()>;

    /// Format warning message
    fn format_warning(&self, message: &str);
}

/// Lowercase name of an access mode for output.
pub const fn mode_name(mode: AccessMode) -> &'static str {
    match mode {
        AccessMode::Read => "read",
        AccessMode::Write => "write",
    }
}

/// Generic JSON output structure
#[derive(Debug, Serialize)]
pub struct JsonOutput<T> {
    pub operation: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn success(operation: impl Into<String>, data: T) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Success,
            data: Some(data),
        }
    }
}
