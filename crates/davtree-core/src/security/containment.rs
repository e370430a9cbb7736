//! Root containment checks.

use std::path::Path;

use crate::path::absolutize;

/// Returns `true` if `path` resolves inside `root`.
///
/// Both arguments are made absolute and normalized lexically, then compared
/// component by component: the components of `root` must be a prefix of the
/// components of `path`. A path equal to the root is inside it. Look-alike
/// prefixes do not match (`/tmp2` is not inside `/tmp`).
///
/// This is a pure check. Symbolic links are not resolved, so a link inside
/// the root that points elsewhere is still reported as inside. Callers that
/// need protection against link escapes must canonicalize both paths first.
///
/// # Examples
///
/// ```
/// use davtree_core::security::is_inside;
///
/// assert!(is_inside("/tmp/foobar", "/tmp"));
/// assert!(is_inside("/", "/"));
/// assert!(!is_inside("/tmp2", "/tmp"));
/// assert!(!is_inside("/tmp/../tmp/..", "/tmp"));
/// assert!(!is_inside("/", "/tmp"));
/// ```
#[must_use]
pub fn is_inside<P: AsRef<Path>, R: AsRef<Path>>(path: P, root: R) -> bool {
    let path = absolutize(path.as_ref());
    let root = absolutize(root.as_ref());

    // Path::starts_with compares whole components, not bytes
    path.starts_with(&root)
}
