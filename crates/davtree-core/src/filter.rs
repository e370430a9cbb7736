//! Pattern-based path filtering.
//!
//! A filter is an ordered list of [`Pattern`]s. Glob patterns are tested
//! against every segment of the path independently; predicates see the whole
//! normalized path. The first pattern that matches decides.

use std::fmt;
use std::path::Component;
use std::path::Path;
use std::sync::Arc;

use globset::GlobBuilder;
use globset::GlobMatcher;

use crate::DavError;
use crate::Result;
use crate::path::normalize;

/// A compiled shell glob matched against single path segments.
///
/// Matching is case-sensitive and supports `*`, `?` and `[...]` classes.
/// A leading `*` also matches names starting with a dot.
#[derive(Clone)]
pub struct GlobPattern {
    source: String,
    matcher: GlobMatcher,
}

impl GlobPattern {
    /// Compiles a glob pattern.
    ///
    /// # Errors
    ///
    /// Returns `DavError::InvalidPattern` if the pattern is malformed
    /// (for example an unclosed `[` class).
    pub fn new(pattern: &str) -> Result<Self> {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .backslash_escape(true)
            .build()
            .map_err(|source| DavError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;

        Ok(Self {
            source: pattern.to_string(),
            matcher: glob.compile_matcher(),
        })
    }

    /// Returns the pattern text as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Tests a single path segment.
    #[must_use]
    pub fn matches_segment<S: AsRef<Path>>(&self, segment: S) -> bool {
        self.matcher.is_match(segment)
    }
}

impl fmt::Debug for GlobPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GlobPattern").field(&self.source).finish()
    }
}

/// A predicate over a complete normalized path.
#[derive(Clone)]
pub struct PathPredicate(Arc<dyn Fn(&Path) -> bool + Send + Sync>);

impl PathPredicate {
    /// Wraps a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Path) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Evaluates the predicate.
    #[must_use]
    pub fn call(&self, path: &Path) -> bool {
        (self.0)(path)
    }
}

impl fmt::Debug for PathPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PathPredicate(..)")
    }
}

/// One entry of a filter list.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Glob tested against each path segment.
    Glob(GlobPattern),
    /// Function called with the full normalized path.
    Predicate(PathPredicate),
}

impl Pattern {
    /// Compiles a glob pattern.
    ///
    /// # Errors
    ///
    /// Returns `DavError::InvalidPattern` if the glob is malformed.
    pub fn glob(pattern: &str) -> Result<Self> {
        GlobPattern::new(pattern).map(Self::Glob)
    }

    /// Wraps a predicate closure.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Path) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(PathPredicate::new(f))
    }
}

/// Returns `true` if any pattern matches `path`.
///
/// The path is normalized lexically and split into segments (separators at
/// either end are ignored). Patterns are tried in order:
/// - a predicate is called with the normalized path;
/// - a glob is tested against every segment on its own.
///
/// An empty pattern list never matches. This function has no side effects.
///
/// # Examples
///
/// ```
/// use davtree_core::filter::Pattern;
/// use davtree_core::filter::matches;
/// use std::path::Path;
///
/// # fn main() -> davtree_core::Result<()> {
/// let php = [Pattern::glob("*.php")?];
/// assert!(matches(Path::new("/tmp/hack.php"), &php));
/// assert!(!matches(Path::new("/tmp/hack.txt"), &php));
///
/// let exact = [Pattern::glob("foo")?];
/// assert!(!matches(Path::new("/tmp/foo2"), &exact));
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn matches(path: &Path, patterns: &[Pattern]) -> bool {
    if patterns.is_empty() {
        return false;
    }

    let normalized = normalize(path);
    let mut segments: Vec<&std::ffi::OsStr> = normalized
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name),
            Component::ParentDir => Some(component.as_os_str()),
            Component::Prefix(_) | Component::RootDir | Component::CurDir => None,
        })
        .collect();

    // The bare root still has one (empty) segment to match against
    if segments.is_empty() {
        segments.push(std::ffi::OsStr::new(""));
    }

    patterns.iter().any(|pattern| match pattern {
        Pattern::Predicate(predicate) => predicate.call(&normalized),
        Pattern::Glob(glob) => segments.iter().any(|segment| glob.matches_segment(segment)),
    })
}

/// An ordered, cloneable list of patterns.
///
/// # Examples
///
/// ```
/// use davtree_core::filter::PatternSet;
/// use std::path::Path;
///
/// # fn main() -> davtree_core::Result<()> {
/// let restricted = PatternSet::from_globs([".svn", ".git", "*.php"])?;
/// assert!(restricted.matches(Path::new("/srv/.svn/entries")));
/// assert!(!restricted.matches(Path::new("/srv/index.html")));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    /// Creates an empty set, which matches nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles a list of glob strings.
    ///
    /// # Errors
    ///
    /// Returns the first `DavError::InvalidPattern` encountered.
    pub fn from_globs<I, S>(globs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        globs
            .into_iter()
            .map(|glob| Pattern::glob(glob.as_ref()))
            .collect::<Result<Vec<_>>>()
            .map(|patterns| Self { patterns })
    }

    /// Appends a pattern.
    pub fn push(&mut self, pattern: Pattern) {
        self.patterns.push(pattern);
    }

    /// Appends a pattern, builder style.
    #[must_use]
    pub fn with(mut self, pattern: Pattern) -> Self {
        self.patterns.push(pattern);
        self
    }

    /// Returns `true` if any pattern matches `path`. See [`matches`].
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        matches(path, &self.patterns)
    }

    /// Returns the patterns in evaluation order.
    #[must_use]
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Returns the number of patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns `true` if the set has no patterns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl FromIterator<Pattern> for PatternSet {
    fn from_iter<T: IntoIterator<Item = Pattern>>(iter: T) -> Self {
        Self {
            patterns: iter.into_iter().collect(),
        }
    }
}
