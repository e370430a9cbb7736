//! Configuration for archive export.

use crate::DavError;
use crate::Result;

/// What the exporter does when a source file cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadFailurePolicy {
    /// Stop the export and return the error.
    #[default]
    Abort,
    /// Drop the entry, record it in the report and continue.
    Skip,
}

/// Configuration for [`ArchiveExporter`](crate::export::ArchiveExporter).
///
/// # Examples
///
/// ```
/// use davtree_core::ExportConfig;
/// use davtree_core::ReadFailurePolicy;
///
/// // Abort on the first unreadable file
/// let config = ExportConfig::default();
///
/// // Best effort, fastest compression
/// let lenient = ExportConfig::default()
///     .with_read_failure(ReadFailurePolicy::Skip)
///     .with_compression_level(Some(1));
/// assert!(lenient.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Compression level (1-9).
    ///
    /// `None` uses the format's default.
    ///
    /// Default: `None`.
    pub compression_level: Option<u8>,

    /// Handling of source files that fail to read.
    ///
    /// Default: [`ReadFailurePolicy::Abort`].
    pub read_failure: ReadFailurePolicy,

    /// Store Unix permission bits with each entry.
    ///
    /// Default: `true`.
    pub preserve_permissions: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            compression_level: None,
            read_failure: ReadFailurePolicy::Abort,
            preserve_permissions: true,
        }
    }
}

impl ExportConfig {
    /// Creates a new `ExportConfig` with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the compression level. Checked by [`validate`](Self::validate).
    #[must_use]
    pub const fn with_compression_level(mut self, level: Option<u8>) -> Self {
        self.compression_level = level;
        self
    }

    /// Sets the read failure policy.
    #[must_use]
    pub const fn with_read_failure(mut self, policy: ReadFailurePolicy) -> Self {
        self.read_failure = policy;
        self
    }

    /// Sets whether to store permission bits.
    #[must_use]
    pub const fn with_preserve_permissions(mut self, preserve: bool) -> Self {
        self.preserve_permissions = preserve;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `DavError::BadRequest` if the compression level is set but
    /// not in range 1-9.
    pub fn validate(&self) -> Result<()> {
        if let Some(level) = self.compression_level
            && !(1..=9).contains(&level)
        {
            return Err(DavError::BadRequest {
                reason: format!("compression level must be 1-9, got {level}"),
            });
        }
        Ok(())
    }
}
