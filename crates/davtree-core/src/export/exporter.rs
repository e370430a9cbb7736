//! Directory tree to archive export.

use std::collections::HashSet;
use std::fs;
use std::fs::File;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::time::Instant;

use tracing::debug;
use tracing::warn;

use crate::DavError;
use crate::Result;
use crate::config::ExportConfig;
use crate::config::ReadFailurePolicy;
use crate::export::encoding::EntryName;
use crate::export::progress::ExportProgress;
use crate::export::progress::NoopProgress;
use crate::export::report::ExportReport;
use crate::export::report::SkipReason;
use crate::export::sink::ArchiveSink;
use crate::export::sink::EntryMeta;
use crate::io::CountingReader;
use crate::path::absolutize;
use crate::path::join_relative;
use crate::security::AccessMode;
use crate::security::AccessPolicy;
use crate::walk::DepthLimit;
use crate::walk::walk;

/// Writes the regular files below a root into an [`ArchiveSink`].
///
/// Every path produced by walking the tree is offered to a caller supplied
/// access check. Paths that pass and are regular files become entries named
/// by their path relative to the root, transcoded to CP437. Directories,
/// symbolic links and special files are recorded in the report and left out.
///
/// The walk never prunes: the check is asked about each path on its own, so
/// rejecting a directory does not reject the files below it. A file whose
/// entry name was already written (two names that transcode alike) is
/// skipped as [`SkipReason::DuplicateName`].
///
/// # Examples
///
/// ```no_run
/// use davtree_core::ExportConfig;
/// use davtree_core::PatternSet;
/// use davtree_core::export::ArchiveExporter;
/// use davtree_core::export::ZipSink;
/// use std::fs::File;
///
/// // Matches `.git` and everything below it
/// let hidden = PatternSet::from_globs([".git"])?;
/// let exporter = ArchiveExporter::new("/srv/files", ExportConfig::default());
/// let mut sink = ZipSink::new(File::create("files.zip")?, None);
///
/// let report = exporter.export(&mut sink, |path| !hidden.matches(path))?;
/// sink.finish()?;
/// println!("{} files", report.files_added);
/// # Ok::<(), davtree_core::DavError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ArchiveExporter {
    root: PathBuf,
    config: ExportConfig,
    excluded: Vec<PathBuf>,
}

/// Per-export state shared by every walked subtree.
struct Pass<'a, S: ?Sized, F> {
    sink: &'a mut S,
    check: F,
    progress: &'a mut dyn ExportProgress,
    report: ExportReport,
    index: usize,
    names: HashSet<EntryName>,
}

impl ArchiveExporter {
    /// Creates an exporter for `root`.
    ///
    /// The root is made absolute and normalized lexically.
    #[must_use]
    pub fn new<P: AsRef<Path>>(root: P, config: ExportConfig) -> Self {
        Self {
            root: absolutize(root.as_ref()),
            config,
            excluded: Vec::new(),
        }
    }

    /// Never writes `path`, whatever the access check says.
    ///
    /// The path is absolutized like the root and compared with walked paths
    /// as is, so it should be spelled under the exporter root.
    #[must_use]
    pub fn with_excluded<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.excluded.push(absolutize(path.as_ref()));
        self
    }

    /// Returns the export root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Exports every file below the root that passes `check`.
    ///
    /// # Errors
    ///
    /// - `DavError::BadRequest` if the configuration is invalid or the root
    ///   is not a directory
    /// - `DavError::Traversal` if a directory cannot be listed
    /// - `DavError::SourceRead` if a file cannot be read and the read failure
    ///   policy is [`ReadFailurePolicy::Abort`]
    /// - `DavError::Io` if the sink fails
    /// - `DavError::ContainmentViolation` if a walked path escapes the root
    pub fn export<S, F>(&self, sink: &mut S, check: F) -> Result<ExportReport>
    where
        S: ArchiveSink + ?Sized,
        F: Fn(&Path) -> bool,
    {
        self.export_with_progress(sink, check, &mut NoopProgress)
    }

    /// Like [`export`](Self::export), reporting progress as entries are
    /// written.
    ///
    /// # Errors
    ///
    /// See [`export`](Self::export).
    pub fn export_with_progress<S, F>(
        &self,
        sink: &mut S,
        check: F,
        progress: &mut dyn ExportProgress,
    ) -> Result<ExportReport>
    where
        S: ArchiveSink + ?Sized,
        F: Fn(&Path) -> bool,
    {
        self.config.validate()?;
        if !self.root.is_dir() {
            return Err(DavError::BadRequest {
                reason: format!("export root {} is not a directory", self.root.display()),
            });
        }

        let start = Instant::now();
        let mut pass = Pass::new(sink, check, progress);
        self.export_tree(&self.root, &mut pass)?;
        Ok(pass.complete(start))
    }

    /// Exports the entries a client selected inside one directory.
    ///
    /// Each name is joined onto `base` (a request path relative to the
    /// policy root) and must pass [`AccessPolicy::assert_read`]; a single
    /// rejected name fails the whole export. Every selected file, and every
    /// file below a selected directory that passes
    /// [`AccessPolicy::can_read`], is written with its name relative to the
    /// exporter root rather than to `base`.
    ///
    /// # Errors
    ///
    /// The errors of [`AccessPolicy::resolve`] for a rejected name, and
    /// otherwise those of [`export`](Self::export).
    pub fn export_selection<S, N>(
        &self,
        policy: &AccessPolicy,
        base: &Path,
        names: &[N],
        sink: &mut S,
        progress: &mut dyn ExportProgress,
    ) -> Result<ExportReport>
    where
        S: ArchiveSink + ?Sized,
        N: AsRef<Path>,
    {
        self.config.validate()?;

        // Reject the request before anything is written
        let selected = names
            .iter()
            .map(|name| policy.resolve(join_relative(base, name.as_ref()), AccessMode::Read))
            .collect::<Result<Vec<_>>>()?;

        let start = Instant::now();
        let mut pass = Pass::new(sink, |path: &Path| policy.can_read(path), progress);
        for path in &outermost(selected) {
            self.export_tree(path, &mut pass)?;
        }
        Ok(pass.complete(start))
    }

    fn export_tree<S, F>(&self, start: &Path, pass: &mut Pass<'_, S, F>) -> Result<()>
    where
        S: ArchiveSink + ?Sized,
        F: Fn(&Path) -> bool,
    {
        for path in walk(start, DepthLimit::Unbounded) {
            let path = path?;
            self.export_path(&path, pass)?;
        }
        Ok(())
    }

    fn export_path<S, F>(&self, path: &Path, pass: &mut Pass<'_, S, F>) -> Result<()>
    where
        S: ArchiveSink + ?Sized,
        F: Fn(&Path) -> bool,
    {
        if self.excluded.iter().any(|excluded| excluded == path) {
            debug!(path = %path.display(), "skipped: excluded");
            pass.report.skip(SkipReason::Excluded, path);
            return Ok(());
        }

        if !(pass.check)(path) {
            debug!(path = %path.display(), "skipped: access check");
            pass.report.skip(SkipReason::AccessDenied, path);
            return Ok(());
        }

        let metadata = match fs::symlink_metadata(path) {
            Ok(metadata) => metadata,
            Err(err) => return self.read_failed(path, err, pass),
        };

        let file_type = metadata.file_type();
        if !file_type.is_file() {
            let reason = if file_type.is_dir() {
                SkipReason::Directory
            } else if file_type.is_symlink() {
                SkipReason::Symlink
            } else {
                SkipReason::Special
            };
            if path != self.root {
                debug!(path = %path.display(), %reason, "skipped");
                pass.report.skip(reason, path);
            }
            return Ok(());
        }

        let relative = self.relative(path)?;
        let name = EntryName::transcode(&relative);
        if pass.names.contains(&name) {
            warn!(path = %path.display(), entry = %name, "skipped: entry name already written");
            pass.report.skip(SkipReason::DuplicateName, path);
            return Ok(());
        }
        let meta = EntryMeta::from_metadata(&metadata, self.config.preserve_permissions);

        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) => return self.read_failed(path, err, pass),
        };

        pass.index += 1;
        pass.progress.on_entry_start(&relative, pass.index);

        let mut reader = CountingReader::new(file);
        if let Err(err) = pass.sink.write_entry(&name, &meta, &mut reader) {
            if reader.failed() {
                return self.read_failed(path, err, pass);
            }
            return Err(DavError::Io(err));
        }

        let bytes = reader.total_bytes();
        debug!(entry = %name, bytes, "added");
        pass.names.insert(name);
        pass.report.files_added += 1;
        pass.report.bytes_read += bytes;
        pass.progress.on_bytes_read(bytes);
        pass.progress.on_entry_complete(&relative);
        Ok(())
    }

    /// Strips the root from a walked path.
    ///
    /// A path that is not strictly below the root means traversal or
    /// normalization is broken, so it stops the export.
    fn relative(&self, path: &Path) -> Result<PathBuf> {
        match path.strip_prefix(&self.root) {
            Ok(relative) if !relative.as_os_str().is_empty() => Ok(relative.to_path_buf()),
            _ => Err(DavError::ContainmentViolation {
                path: path.to_path_buf(),
                root: self.root.clone(),
            }),
        }
    }

    fn read_failed<S, F>(
        &self,
        path: &Path,
        err: io::Error,
        pass: &mut Pass<'_, S, F>,
    ) -> Result<()>
    where
        S: ?Sized,
    {
        match self.config.read_failure {
            ReadFailurePolicy::Abort => Err(DavError::SourceRead {
                path: path.to_path_buf(),
                source: err,
            }),
            ReadFailurePolicy::Skip => {
                warn!(path = %path.display(), error = %err, "skipped unreadable file");
                pass.report.skip(SkipReason::Unreadable, path);
                Ok(())
            }
        }
    }
}

/// Drops repeated selections and selections below another selection.
fn outermost(mut paths: Vec<PathBuf>) -> Vec<PathBuf> {
    // Sorting puts every ancestor before its descendants
    paths.sort();
    let mut kept: Vec<PathBuf> = Vec::with_capacity(paths.len());
    for path in paths {
        if !kept.iter().any(|outer| path.starts_with(outer)) {
            kept.push(path);
        }
    }
    kept
}

impl<'a, S: ?Sized, F> Pass<'a, S, F> {
    fn new(sink: &'a mut S, check: F, progress: &'a mut dyn ExportProgress) -> Self {
        Self {
            sink,
            check,
            progress,
            report: ExportReport::new(),
            index: 0,
            names: HashSet::new(),
        }
    }

    fn complete(mut self, start: Instant) -> ExportReport {
        let mut report = std::mem::take(&mut self.report);
        report.duration = start.elapsed();
        self.progress.on_complete();
        debug!(
            files = report.files_added,
            skipped = report.files_skipped(),
            bytes = report.bytes_read,
            "export complete"
        );
        report
    }
}
