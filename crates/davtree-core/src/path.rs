//! Lexical path normalization.
//!
//! Nothing in this module touches the filesystem apart from reading the
//! current working directory in [`absolutize`]. Symbolic links are not
//! resolved, so `a/link/..` normalizes to `a` even if `link` points elsewhere.

use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

/// Normalizes a path lexically.
///
/// Removes `.` components and folds `..` into the preceding normal component.
/// A `..` directly under the root stays at the root; a leading `..` in a
/// relative path is preserved. An empty result becomes `.`.
///
/// # Examples
///
/// ```
/// use davtree_core::path::normalize;
/// use std::path::Path;
///
/// assert_eq!(normalize(Path::new("/tmp/../tmp/..")), Path::new("/"));
/// assert_eq!(normalize(Path::new("a/./b/../c")), Path::new("a/c"));
/// assert_eq!(normalize(Path::new("../x")), Path::new("../x"));
/// assert_eq!(normalize(Path::new("")), Path::new("."));
/// ```
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component),
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                Some(Component::ParentDir | Component::CurDir) | None => out.push(".."),
            },
            Component::Normal(name) => out.push(name),
        }
    }

    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Makes a path absolute against the current directory, then normalizes it.
///
/// If the current directory cannot be determined the path is only
/// normalized; this function never fails.
#[must_use]
pub fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return normalize(path);
    }

    match std::env::current_dir() {
        Ok(cwd) => normalize(&cwd.join(path)),
        Err(_) => normalize(path),
    }
}

/// Joins a request path onto a root without letting it become absolute.
///
/// Leading separators and drive prefixes of `rel` are dropped, so
/// `join_relative("/srv", "/etc/passwd")` yields `/srv/etc/passwd`. `..`
/// components are kept; containment must still be checked on the result.
#[must_use]
pub fn join_relative(root: &Path, rel: &Path) -> PathBuf {
    let mut joined = root.to_path_buf();
    for component in rel.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {}
            other => joined.push(other),
        }
    }
    joined
}
