//! Error types for tree export, access checks and cache tags.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `DavError`.
pub type Result<T> = std::result::Result<T, DavError>;

/// Errors produced by `davtree-core`.
#[derive(Error, Debug)]
pub enum DavError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Listing a directory failed while walking a tree.
    #[error("cannot traverse {path}: {source}")]
    Traversal {
        /// The path whose listing failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Access to the path is denied by policy or file mode.
    #[error("permission denied for {path}: {reason}")]
    Forbidden {
        /// The denied path.
        path: PathBuf,
        /// Why access was denied.
        reason: String,
    },

    /// The path does not exist.
    #[error("not found: {path}")]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// The request conflicts with the current state of the filesystem.
    #[error("conflict: {reason}")]
    Conflict {
        /// Description of the conflict.
        reason: String,
    },

    /// Caller-supplied input is malformed.
    #[error("bad request: {reason}")]
    BadRequest {
        /// Description of the malformed input.
        reason: String,
    },

    /// A glob pattern could not be compiled.
    #[error("invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Underlying parser error.
        #[source]
        source: globset::Error,
    },

    /// A walked path was found outside the export root.
    ///
    /// This indicates a bug in traversal or normalization, never bad input.
    #[error("internal error: {path} escaped export root {root}")]
    ContainmentViolation {
        /// The escaping path.
        path: PathBuf,
        /// The export root.
        root: PathBuf,
    },

    /// Reading a source file failed during export.
    #[error("cannot read {path}: {source}")]
    SourceRead {
        /// The file being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Output archive format cannot be determined.
    #[error("unsupported archive format: {path}")]
    UnsupportedFormat {
        /// The output path.
        path: PathBuf,
    },
}

impl DavError {
    /// Returns `true` if this error means "deny access".
    ///
    /// # Examples
    ///
    /// ```
    /// use davtree_core::DavError;
    /// use std::path::PathBuf;
    ///
    /// let err = DavError::Forbidden {
    ///     path: PathBuf::from("/srv/.git"),
    ///     reason: "restrict_access".into(),
    /// };
    /// assert!(err.is_access_denied());
    ///
    /// let err = DavError::NotFound {
    ///     path: PathBuf::from("/srv/missing"),
    /// };
    /// assert!(!err.is_access_denied());
    /// ```
    #[must_use]
    pub const fn is_access_denied(&self) -> bool {
        matches!(self, Self::Forbidden { .. })
    }

    /// Returns `true` for internal invariant violations.
    ///
    /// Fatal errors must stop the current operation and never be converted
    /// into a skipped entry.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::ContainmentViolation { .. })
    }

    /// Returns the protocol status a caller should surface for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use davtree_core::DavError;
    /// use std::path::PathBuf;
    ///
    /// let err = DavError::NotFound {
    ///     path: PathBuf::from("x"),
    /// };
    /// assert_eq!(err.status_code(), 404);
    /// ```
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Forbidden { .. } => 403,
            Self::NotFound { .. } => 404,
            Self::Conflict { .. } => 409,
            Self::BadRequest { .. } | Self::InvalidPattern { .. } => 400,
            Self::UnsupportedFormat { .. } => 415,
            Self::Io(_)
            | Self::Traversal { .. }
            | Self::ContainmentViolation { .. }
            | Self::SourceRead { .. } => 500,
        }
    }
}
