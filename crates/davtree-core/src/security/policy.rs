//! Request path resolution and access checks.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use tracing::debug;
use tracing::info;

use crate::DavError;
use crate::Result;
use crate::filter::PatternSet;
use crate::path::absolutize;
use crate::path::join_relative;
use crate::path::normalize;
use crate::security::containment::is_inside;

/// Kind of access a request needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    /// Reading or listing.
    Read,
    /// Creating, modifying or deleting.
    Write,
}

/// Decides whether paths below a served root may be read or written.
///
/// Restriction patterns are matched against the part of a path below the
/// root, so a restricted name that happens to appear in the root's own
/// location never locks out the whole tree.
///
/// # Examples
///
/// ```no_run
/// use davtree_core::filter::PatternSet;
/// use davtree_core::security::AccessMode;
/// use davtree_core::security::AccessPolicy;
///
/// let policy = AccessPolicy::new("/srv/files")
///     .with_restrict_access(PatternSet::from_globs([".git", "*.php"])?);
///
/// let local = policy.resolve("/docs/report.pdf", AccessMode::Read)?;
/// assert!(local.starts_with("/srv/files"));
/// # Ok::<(), davtree_core::DavError>(())
/// ```
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    root: PathBuf,
    restrict_access: PatternSet,
    restrict_write: PatternSet,
}

impl AccessPolicy {
    /// Creates a policy for `root` with no restrictions.
    ///
    /// The root is made absolute and normalized lexically.
    #[must_use]
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: absolutize(root.as_ref()),
            restrict_access: PatternSet::new(),
            restrict_write: PatternSet::new(),
        }
    }

    /// Sets the patterns that deny all access.
    #[must_use]
    pub fn with_restrict_access(mut self, patterns: PatternSet) -> Self {
        self.restrict_access = patterns;
        self
    }

    /// Sets the patterns that deny writes only.
    #[must_use]
    pub fn with_restrict_write(mut self, patterns: PatternSet) -> Self {
        self.restrict_write = patterns;
        self
    }

    /// Returns the served root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the patterns that deny all access.
    #[must_use]
    pub const fn restrict_access(&self) -> &PatternSet {
        &self.restrict_access
    }

    /// Returns the patterns that deny writes.
    #[must_use]
    pub const fn restrict_write(&self) -> &PatternSet {
        &self.restrict_write
    }

    /// Maps a request path onto the filesystem and checks access to it.
    ///
    /// Leading separators of `request_path` are dropped, so it is always
    /// taken relative to the root.
    ///
    /// # Errors
    ///
    /// Whatever [`assert_read`](Self::assert_read) or
    /// [`assert_write`](Self::assert_write) returns for the resolved path.
    pub fn resolve<P: AsRef<Path>>(&self, request_path: P, mode: AccessMode) -> Result<PathBuf> {
        let local = normalize(&join_relative(&self.root, request_path.as_ref()));
        debug!(
            request = %request_path.as_ref().display(),
            local = %local.display(),
            ?mode,
            "resolve"
        );

        match mode {
            AccessMode::Read => self.assert_read(&local)?,
            AccessMode::Write => self.assert_write(&local)?,
        }
        Ok(local)
    }

    /// Checks that `path` may be read.
    ///
    /// In order: it must lie inside the root, must not match a
    /// `restrict_access` pattern, must exist, and must be readable (a file
    /// can be opened, a directory can be listed).
    ///
    /// # Errors
    ///
    /// - `DavError::Forbidden` for the containment, pattern and permission
    ///   checks
    /// - `DavError::NotFound` if the path does not exist
    /// - `DavError::Io` for any other filesystem failure
    pub fn assert_read(&self, path: &Path) -> Result<()> {
        self.assert_visible(path)?;

        let metadata = fs::metadata(path).map_err(|err| self.io_denial(path, err))?;
        let opened = if metadata.is_dir() {
            fs::read_dir(path).map(drop)
        } else {
            fs::File::open(path).map(drop)
        };
        opened.map_err(|err| self.io_denial(path, err))
    }

    /// Checks that `path` may be created or modified.
    ///
    /// The path must lie inside the root and match neither `restrict_access`
    /// nor `restrict_write`. A missing path needs an existing, writable
    /// parent directory; an existing path must itself be writable.
    /// Writability is judged from the permission bits only.
    ///
    /// # Errors
    ///
    /// - `DavError::Forbidden` for the containment, pattern and read-only
    ///   checks
    /// - `DavError::Conflict` if the parent is missing or not a directory
    /// - `DavError::Io` for any other filesystem failure
    pub fn assert_write(&self, path: &Path) -> Result<()> {
        self.assert_visible(path)?;

        if self.restrict_write.matches(&self.below_root(path)) {
            return Err(deny(path, "matches restrict_write"));
        }

        match fs::metadata(path) {
            Ok(metadata) => {
                if metadata.permissions().readonly() {
                    return Err(deny(path, "target is read-only"));
                }
                Ok(())
            }
            Err(err) if is_missing(&err) => self.assert_parent_writable(path),
            Err(err) => Err(self.io_denial(path, err)),
        }
    }

    /// Returns `true` if [`assert_read`](Self::assert_read) passes.
    ///
    /// This is the access check usually handed to the archive exporter.
    #[must_use]
    pub fn can_read(&self, path: &Path) -> bool {
        self.assert_read(path).is_ok()
    }

    fn assert_visible(&self, path: &Path) -> Result<()> {
        if !is_inside(path, &self.root) {
            return Err(deny(path, "path is outside root"));
        }
        if self.restrict_access.matches(&self.below_root(path)) {
            return Err(deny(path, "matches restrict_access"));
        }
        Ok(())
    }

    fn assert_parent_writable(&self, path: &Path) -> Result<()> {
        let normalized = normalize(path);
        let parent = normalized.parent().unwrap_or(self.root.as_path());

        let metadata = match fs::metadata(parent) {
            Ok(metadata) => metadata,
            Err(err) if is_missing(&err) => {
                return Err(DavError::Conflict {
                    reason: format!("parent of {} does not exist", path.display()),
                });
            }
            Err(err) => return Err(self.io_denial(parent, err)),
        };

        if !metadata.is_dir() {
            return Err(DavError::Conflict {
                reason: format!("parent of {} is not a directory", path.display()),
            });
        }
        if metadata.permissions().readonly() {
            return Err(deny(parent, "parent directory is read-only"));
        }
        Ok(())
    }

    fn below_root(&self, path: &Path) -> PathBuf {
        let absolute = absolutize(path);
        absolute
            .strip_prefix(&self.root)
            .map_or_else(|_| absolute.clone(), Path::to_path_buf)
    }

    fn io_denial(&self, path: &Path, err: std::io::Error) -> DavError {
        match err.kind() {
            ErrorKind::NotFound | ErrorKind::NotADirectory => DavError::NotFound {
                path: path.to_path_buf(),
            },
            ErrorKind::PermissionDenied => deny(path, "permission denied by filesystem"),
            _ => {
                debug!(
                    root = %self.root.display(),
                    path = %path.display(),
                    error = %err,
                    "access check failed"
                );
                DavError::Io(err)
            }
        }
    }
}

// A file used as a directory component reports NotADirectory
fn is_missing(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory)
}

fn deny(path: &Path, reason: &str) -> DavError {
    info!(path = %path.display(), reason, "access denied");
    DavError::Forbidden {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
