//! Optional JSON configuration file.
//!
//! Command-line flags take precedence over file values. Pattern lists from
//! both sources are concatenated.

use anyhow::Context;
use anyhow::Result;
use davtree_core::PatternSet;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

/// Settings read from `--config FILE`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Served root directory.
    pub root_dir: Option<PathBuf>,
    /// Globs denying any access.
    pub restrict_access: Vec<String>,
    /// Globs denying writes.
    pub restrict_write: Vec<String>,
    /// Default archive compression level.
    pub compression_level: Option<u8>,
    /// Skip unreadable files during export.
    pub skip_unreadable: bool,
}

impl FileConfig {
    /// Loads the file at `path`, or returns defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("invalid config file '{}'", path.display()))
    }

    /// Picks the served root: flag, then `root_dir`, then the current
    /// directory.
    pub fn root(&self, flag: Option<&Path>) -> Result<PathBuf> {
        match flag.or(self.root_dir.as_deref()) {
            Some(root) => Ok(root.to_path_buf()),
            None => env::current_dir().context("failed to get current directory"),
        }
    }

    /// Compiles file patterns followed by flag patterns.
    pub fn restrict_access(&self, flags: &[String]) -> Result<PatternSet> {
        compile(&self.restrict_access, flags)
    }

    /// Compiles file write patterns followed by flag patterns.
    pub fn restrict_write(&self, flags: &[String]) -> Result<PatternSet> {
        compile(&self.restrict_write, flags)
    }
}

fn compile(file: &[String], flags: &[String]) -> Result<PatternSet> {
    PatternSet::from_globs(file.iter().chain(flags).map(String::as_str))
        .context("invalid restriction pattern")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_path_gives_defaults() {
        assert_eq!(FileConfig::load(None).unwrap(), FileConfig::default());
    }

    #[test]
    fn test_load_partial_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("davtree.json");
        fs::write(&path, r#"{"root_dir": "/srv", "restrict_access": [".git"]}"#).unwrap();

        let config = FileConfig::load(Some(&path)).unwrap();
        assert_eq!(config.root_dir, Some(PathBuf::from("/srv")));
        assert_eq!(config.restrict_access, vec![".git"]);
        assert!(config.restrict_write.is_empty());
        assert!(!config.skip_unreadable);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("davtree.json");
        fs::write(&path, r#"{"root": "/srv"}"#).unwrap();

        let err = FileConfig::load(Some(&path)).unwrap_err();
        assert!(format!("{err:?}").contains("invalid config file"));
    }

    #[test]
    fn test_flag_root_wins() {
        let config = FileConfig {
            root_dir: Some(PathBuf::from("/srv")),
            ..FileConfig::default()
        };
        assert_eq!(
            config.root(Some(Path::new("/data"))).unwrap(),
            PathBuf::from("/data")
        );
        assert_eq!(config.root(None).unwrap(), PathBuf::from("/srv"));
    }

    #[test]
    fn test_patterns_concatenate() {
        let config = FileConfig {
            restrict_access: vec![".git".into()],
            ..FileConfig::default()
        };
        let set = config.restrict_access(&["*.php".into()]).unwrap();
        assert!(set.matches(Path::new("/repo/.git/HEAD")));
        assert!(set.matches(Path::new("/site/index.php")));
        assert!(!set.matches(Path::new("/site/index.html")));
    }
}
