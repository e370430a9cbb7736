//! Revision tags for cache validation.
//!
//! A [`CacheTag`] is derived from a file's modification time and size only,
//! formatted as `"<mtime>S<size>"` (quotes included). It is not a content
//! hash: two versions of a file with identical size and timestamp produce the
//! same tag.

use std::fmt;
use std::fs;
use std::fs::Metadata;
use std::path::Path;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use crate::DavError;
use crate::Result;

/// Opaque revision token for one version of a file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheTag(String);

impl CacheTag {
    /// Reads the metadata of `path` and builds its tag.
    ///
    /// Symbolic links are followed.
    ///
    /// # Errors
    ///
    /// Returns `DavError::Io` if the metadata cannot be read (missing file,
    /// permission denied) or the platform has no modification times.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use davtree_core::etag::CacheTag;
    ///
    /// let tag = CacheTag::generate("/srv/files/report.pdf")?;
    /// println!("ETag: {tag}");
    /// # Ok::<(), davtree_core::DavError>(())
    /// ```
    pub fn generate<P: AsRef<Path>>(path: P) -> Result<Self> {
        let metadata = fs::metadata(path)?;
        Self::from_metadata(&metadata)
    }

    /// Builds the tag from already loaded metadata.
    ///
    /// # Errors
    ///
    /// Returns `DavError::Io` if the modification time is unavailable.
    pub fn from_metadata(metadata: &Metadata) -> Result<Self> {
        let modified = metadata.modified()?;
        Ok(Self::from_parts(modified, metadata.len()))
    }

    /// Builds the tag from a modification time and a size.
    ///
    /// # Examples
    ///
    /// ```
    /// use davtree_core::etag::CacheTag;
    /// use std::time::Duration;
    /// use std::time::UNIX_EPOCH;
    ///
    /// let mtime = UNIX_EPOCH + Duration::new(1_700_000_000, 500_000_000);
    /// let tag = CacheTag::from_parts(mtime, 42);
    /// assert_eq!(tag.as_str(), "\"1700000000.500000000S42\"");
    /// ```
    #[must_use]
    pub fn from_parts(modified: SystemTime, size: u64) -> Self {
        Self(format!("\"{}S{size}\"", format_mtime(modified)))
    }

    /// Parses a tag received from a client.
    ///
    /// The text must be a double-quoted token without commas, since a comma
    /// would split it when the tag is later placed in a list.
    ///
    /// # Errors
    ///
    /// Returns `DavError::BadRequest` for anything else.
    ///
    /// # Examples
    ///
    /// ```
    /// use davtree_core::etag::CacheTag;
    ///
    /// let tag = CacheTag::parse(" \"12.5S3\" ").unwrap();
    /// assert_eq!(tag.as_str(), "\"12.5S3\"");
    /// assert!(CacheTag::parse("12.5S3").is_err());
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let well_formed = text.len() >= 2
            && text.starts_with('"')
            && text.ends_with('"')
            && !text[1..text.len() - 1].contains(['"', ',']);
        if well_formed {
            Ok(Self(text.to_string()))
        } else {
            Err(DavError::BadRequest {
                reason: format!("malformed entity tag: {text}"),
            })
        }
    }

    /// Returns the tag text, quotes included.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the tag and returns its text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    /// Checks this tag against a comma separated list. See [`tag_matches`].
    #[must_use]
    pub fn matches(&self, tag_list: &str) -> bool {
        tag_matches(&self.0, tag_list)
    }
}

impl fmt::Display for CacheTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheTag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Seconds since the epoch with nanosecond fraction; negative before 1970.
fn format_mtime(modified: SystemTime) -> String {
    match modified.duration_since(UNIX_EPOCH) {
        Ok(since) => format!("{}.{:09}", since.as_secs(), since.subsec_nanos()),
        Err(err) => {
            let before = err.duration();
            format!("-{}.{:09}", before.as_secs(), before.subsec_nanos())
        }
    }
}

/// Matches a tag against a tag list such as `"a", "b"` or `*`.
///
/// The list is split on commas and each entry is trimmed. A list consisting
/// of the single entry `*` matches every tag; otherwise the tag must equal
/// one of the entries exactly. Entries that themselves contain commas cannot
/// be expressed; generated tags never do.
///
/// # Examples
///
/// ```
/// use davtree_core::etag::tag_matches;
///
/// assert!(tag_matches("\"foo\"", "\"foo2\",\"foo\""));
/// assert!(tag_matches("\"foo\"", " * "));
/// assert!(!tag_matches("\"foo\"", ""));
/// ```
#[must_use]
pub fn tag_matches(tag: &str, tag_list: &str) -> bool {
    let entries: Vec<&str> = tag_list.split(',').map(str::trim).collect();
    entries == ["*"] || entries.contains(&tag)
}

/// Conditional request headers (`If-Match` / `If-None-Match`).
///
/// Empty header values count as absent.
///
/// # Examples
///
/// ```
/// use davtree_core::etag::CacheTag;
/// use davtree_core::etag::Preconditions;
/// use std::time::UNIX_EPOCH;
///
/// let current = CacheTag::from_parts(UNIX_EPOCH, 3);
///
/// let unchanged = Preconditions::new().with_if_none_match(current.as_str());
/// assert!(!unchanged.check(Some(&current))?);
///
/// let create_only = Preconditions::new().with_if_none_match("*");
/// assert!(create_only.check(None)?);
/// # Ok::<(), davtree_core::DavError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preconditions {
    /// Raw `If-Match` value.
    pub if_match: Option<String>,
    /// Raw `If-None-Match` value.
    pub if_none_match: Option<String>,
}

impl Preconditions {
    /// Creates an empty set of preconditions, which always passes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the `If-Match` list.
    #[must_use]
    pub fn with_if_match(mut self, list: impl Into<String>) -> Self {
        self.if_match = Some(list.into());
        self
    }

    /// Sets the `If-None-Match` list.
    #[must_use]
    pub fn with_if_none_match(mut self, list: impl Into<String>) -> Self {
        self.if_none_match = Some(list.into());
        self
    }

    /// Evaluates the preconditions against the current tag of a resource.
    ///
    /// `current` is `None` when the resource does not exist. Returns `false`
    /// when the caller must answer "precondition failed":
    /// - missing resource: fails only if `If-Match` is present;
    /// - `If-Match`: passes iff the tag matches the list;
    /// - otherwise: passes iff the tag does not match `If-None-Match`.
    ///
    /// # Errors
    ///
    /// Returns `DavError::BadRequest` if both headers are present.
    pub fn check(&self, current: Option<&CacheTag>) -> Result<bool> {
        let if_match = non_empty(self.if_match.as_deref());
        let if_none_match = non_empty(self.if_none_match.as_deref());

        if if_match.is_some() && if_none_match.is_some() {
            return Err(DavError::BadRequest {
                reason: "If-Match conflicts with If-None-Match".into(),
            });
        }

        let Some(tag) = current else {
            return Ok(if_match.is_none());
        };

        Ok(match if_match {
            Some(list) => tag.matches(list),
            None => !tag.matches(if_none_match.unwrap_or_default()),
        })
    }

    /// Reads the current tag of `path` and evaluates the preconditions.
    ///
    /// # Errors
    ///
    /// Returns `DavError::BadRequest` if both headers are present, or
    /// `DavError::Io` if metadata cannot be read for a reason other than the
    /// file not existing.
    pub fn evaluate<P: AsRef<Path>>(&self, path: P) -> Result<bool> {
        let current = match fs::metadata(path) {
            Ok(metadata) => Some(CacheTag::from_metadata(&metadata)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => return Err(err.into()),
        };
        self.check(current.as_ref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_tag_matches_single() {
        assert!(tag_matches("\"foo\"", "\"foo\""));
        assert!(!tag_matches("\"foo\"", "\"foo2\""));
    }

    #[test]
    fn test_tag_matches_list() {
        assert!(tag_matches("\"foo\"", "\"foo\", \"foo2\""));
        assert!(tag_matches("\"foo\"", "\"foo2\",\"foo\""));
        assert!(!tag_matches("\"foo\"", "\"foo2\", \"foo3\""));
    }

    #[test]
    fn test_tag_matches_wildcard() {
        assert!(tag_matches("\"foo\"", "*"));
        assert!(tag_matches("anything at all", "  *  "));
    }

    #[test]
    fn test_wildcard_only_counts_alone() {
        assert!(!tag_matches("\"foo\"", "*, \"bar\""));
        assert!(tag_matches("\"bar\"", "*, \"bar\""));
    }

    #[test]
    fn test_tag_matches_empty_list() {
        assert!(!tag_matches("\"foo\"", ""));
        assert!(!tag_matches("\"foo\"", "   "));
    }

    #[test]
    fn test_generate_format() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("file.txt");
        std::fs::write(&path, "12345").unwrap();

        let tag = CacheTag::generate(&path).unwrap();
        let text = tag.as_str();
        assert!(text.starts_with('"') && text.ends_with('"'));
        assert!(text.ends_with("S5\""));
        assert!(!text.contains(','));
    }

    #[test]
    fn test_generate_is_stable() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("file.txt");
        std::fs::write(&path, "content").unwrap();

        let first = CacheTag::generate(&path).unwrap();
        let second = CacheTag::generate(&path).unwrap();
        assert_eq!(first, second);
        assert!(second.matches(first.as_str()));
    }

    #[test]
    fn test_size_change_changes_tag() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("file.txt");
        let mtime = UNIX_EPOCH + Duration::from_secs(1_600_000_000);

        std::fs::write(&path, "short").unwrap();
        File::options().write(true).open(&path).unwrap().set_modified(mtime).unwrap();
        let before = CacheTag::generate(&path).unwrap();

        std::fs::write(&path, "much longer").unwrap();
        File::options().write(true).open(&path).unwrap().set_modified(mtime).unwrap();
        let after = CacheTag::generate(&path).unwrap();

        assert_ne!(before, after);
    }

    #[test]
    fn test_same_size_same_mtime_collides() {
        // Known limitation: the tag is not a content hash
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("file.txt");
        let mtime = UNIX_EPOCH + Duration::from_secs(1_600_000_000);

        std::fs::write(&path, "aaaa").unwrap();
        File::options().write(true).open(&path).unwrap().set_modified(mtime).unwrap();
        let before = CacheTag::generate(&path).unwrap();

        std::fs::write(&path, "bbbb").unwrap();
        File::options().write(true).open(&path).unwrap().set_modified(mtime).unwrap();
        let after = CacheTag::generate(&path).unwrap();

        assert_eq!(before, after);
    }

    #[test]
    fn test_generate_missing_file_fails() {
        let temp = TempDir::new().unwrap();
        let err = CacheTag::generate(temp.path().join("missing")).unwrap_err();
        assert!(matches!(err, DavError::Io(_)));
    }

    #[test]
    fn test_from_parts_before_epoch() {
        let mtime = UNIX_EPOCH - Duration::from_millis(1500);
        let tag = CacheTag::from_parts(mtime, 0);
        assert_eq!(tag.as_str(), "\"-1.500000000S0\"");
    }

    #[test]
    fn test_preconditions_empty_always_pass() {
        let current = CacheTag::from_parts(UNIX_EPOCH, 1);
        assert!(Preconditions::new().check(Some(&current)).unwrap());
        assert!(Preconditions::new().check(None).unwrap());

        let blank = Preconditions::new().with_if_match("").with_if_none_match("  ");
        assert!(blank.check(Some(&current)).unwrap());
    }

    #[test]
    fn test_preconditions_conflict() {
        let both = Preconditions::new()
            .with_if_match("\"a\"")
            .with_if_none_match("\"b\"");
        assert!(matches!(
            both.check(None),
            Err(DavError::BadRequest { .. })
        ));
    }

    #[test]
    fn test_preconditions_if_match() {
        let current = CacheTag::from_parts(UNIX_EPOCH, 1);
        let matching = Preconditions::new().with_if_match(current.as_str());
        assert!(matching.check(Some(&current)).unwrap());

        let stale = Preconditions::new().with_if_match("\"0.000000000S2\"");
        assert!(!stale.check(Some(&current)).unwrap());

        // No current entity: If-Match always fails
        assert!(!Preconditions::new().with_if_match("*").check(None).unwrap());
    }

    #[test]
    fn test_preconditions_if_none_match() {
        let current = CacheTag::from_parts(UNIX_EPOCH, 1);
        let cached = Preconditions::new().with_if_none_match(current.as_str());
        assert!(!cached.check(Some(&current)).unwrap());

        let other = Preconditions::new().with_if_none_match("\"other\"");
        assert!(other.check(Some(&current)).unwrap());

        let any = Preconditions::new().with_if_none_match("*");
        assert!(!any.check(Some(&current)).unwrap());
        assert!(any.check(None).unwrap());
    }

    #[test]
    fn test_preconditions_evaluate_on_disk() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("file.txt");

        let create_only = Preconditions::new().with_if_none_match("*");
        assert!(create_only.evaluate(&path).unwrap());

        std::fs::write(&path, "now it exists").unwrap();
        assert!(!create_only.evaluate(&path).unwrap());

        let tag = CacheTag::generate(&path).unwrap();
        let unchanged = Preconditions::new().with_if_match(tag.into_string());
        assert!(unchanged.evaluate(&path).unwrap());
    }

    #[test]
    fn test_parse_accepts_quoted_tokens() {
        let tag = CacheTag::parse("\"12.5S3\"").unwrap();
        assert_eq!(tag, CacheTag("\"12.5S3\"".into()));
        assert!(CacheTag::parse("\"\"").is_ok());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "\"", "plain", "\"a,b\"", "\"a\"b\""] {
            assert!(
                matches!(CacheTag::parse(bad), Err(DavError::BadRequest { .. })),
                "{bad} accepted"
            );
        }
    }
}
