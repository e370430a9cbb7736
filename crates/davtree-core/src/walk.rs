//! Lazy directory tree enumeration.
//!
//! [`walk`] yields the starting path first and then, depth first, every path
//! below it up to a [`DepthLimit`]. Nothing is read from the filesystem until
//! the iterator is advanced, so callers can stop early.

use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::trace;
use walkdir::WalkDir;

use crate::DavError;
use crate::Result;

/// Recursion bound for [`walk`].
///
/// `Bounded(0)` yields only the starting path, `Bounded(1)` adds its direct
/// children, and so on. `Unbounded` walks the whole tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DepthLimit {
    /// Descend at most this many levels.
    Bounded(u32),
    /// Descend without limit.
    #[default]
    Unbounded,
}

impl DepthLimit {
    /// Parses a depth value as sent by clients.
    ///
    /// Accepts `infinity`, the sentinel `-1` (both unbounded) and any
    /// non-negative integer.
    ///
    /// # Errors
    ///
    /// Returns `DavError::BadRequest` for anything else.
    ///
    /// # Examples
    ///
    /// ```
    /// use davtree_core::walk::DepthLimit;
    ///
    /// assert_eq!(DepthLimit::parse("1").unwrap(), DepthLimit::Bounded(1));
    /// assert_eq!(DepthLimit::parse("infinity").unwrap(), DepthLimit::Unbounded);
    /// assert_eq!(DepthLimit::parse("-1").unwrap(), DepthLimit::Unbounded);
    /// assert!(DepthLimit::parse("deep").is_err());
    /// ```
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim() {
            "infinity" | "-1" => Ok(Self::Unbounded),
            other => other
                .parse::<u32>()
                .map(Self::Bounded)
                .map_err(|_| DavError::BadRequest {
                    reason: format!("invalid depth: {value}"),
                }),
        }
    }

    /// Returns `true` for [`DepthLimit::Unbounded`].
    #[must_use]
    pub const fn is_unbounded(self) -> bool {
        matches!(self, Self::Unbounded)
    }
}

impl FromStr for DepthLimit {
    type Err = DavError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for DepthLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bounded(depth) => write!(f, "{depth}"),
            Self::Unbounded => f.write_str("infinity"),
        }
    }
}

/// Walks the tree below `root`.
///
/// - `root` itself is always yielded first, whatever the depth and whether
///   or not it exists.
/// - If the depth is `Bounded(0)` or `root` is not a directory, nothing
///   follows.
/// - Otherwise every entry below `root` is yielded, each directory before its
///   contents. Listing order within a directory is platform dependent.
///
/// Directories are recognised by the file type of the fully joined child
/// path. Symbolic links below `root` are yielded but never followed, so the
/// walk cannot leave the subtree or loop. A link passed as `root` itself is
/// followed.
///
/// The first listing error is yielded as `DavError::Traversal` and ends the
/// walk. A walk is single pass; call `walk` again to restart.
///
/// # Examples
///
/// ```no_run
/// use davtree_core::walk::DepthLimit;
/// use davtree_core::walk::walk;
///
/// for path in walk("/srv/files", DepthLimit::Bounded(1)) {
///     println!("{}", path?.display());
/// }
/// # Ok::<(), davtree_core::DavError>(())
/// ```
#[must_use]
pub fn walk<P: AsRef<Path>>(root: P, depth: DepthLimit) -> TreeWalk {
    TreeWalk {
        root: root.as_ref().to_path_buf(),
        depth,
        state: WalkState::Start,
    }
}

/// Iterator returned by [`walk`].
pub struct TreeWalk {
    root: PathBuf,
    depth: DepthLimit,
    state: WalkState,
}

enum WalkState {
    Start,
    RootYielded,
    Children(walkdir::IntoIter),
    Done,
}

impl TreeWalk {
    /// Returns the starting path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn children(&self) -> Option<walkdir::IntoIter> {
        if self.depth == DepthLimit::Bounded(0) || !self.root.is_dir() {
            return None;
        }

        let mut walker = WalkDir::new(&self.root).min_depth(1).follow_links(false);
        if let DepthLimit::Bounded(max) = self.depth {
            walker = walker.max_depth(max as usize);
        }
        Some(walker.into_iter())
    }
}

impl Iterator for TreeWalk {
    type Item = Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match &mut self.state {
                WalkState::Start => {
                    self.state = WalkState::RootYielded;
                    trace!(path = %self.root.display(), "walk start");
                    return Some(Ok(self.root.clone()));
                }
                WalkState::RootYielded => {
                    self.state = self
                        .children()
                        .map_or(WalkState::Done, WalkState::Children);
                }
                WalkState::Children(entries) => match entries.next() {
                    Some(Ok(entry)) => {
                        trace!(path = %entry.path().display(), depth = entry.depth(), "walk entry");
                        return Some(Ok(entry.into_path()));
                    }
                    Some(Err(err)) => {
                        self.state = WalkState::Done;
                        let path = err
                            .path()
                            .map_or_else(|| self.root.clone(), Path::to_path_buf);
                        return Some(Err(DavError::Traversal {
                            path,
                            source: err.into(),
                        }));
                    }
                    None => self.state = WalkState::Done,
                },
                WalkState::Done => return None,
            }
        }
    }
}

impl std::iter::FusedIterator for TreeWalk {}
