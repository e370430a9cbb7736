//! Export command implementation.

use crate::cli::ExportArgs;
use crate::config::FileConfig;
use crate::error::add_path_context;
use crate::output::OutputFormatter;
use crate::progress::CliProgress;
use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use davtree_core::AccessPolicy;
use davtree_core::ArchiveExporter;
use davtree_core::ExportConfig;
use davtree_core::ExportProgress;
use davtree_core::ExportReport;
use davtree_core::NoopProgress;
use davtree_core::ReadFailurePolicy;
use davtree_core::export::ArchiveFormat;
use davtree_core::export::ArchiveSink;
use davtree_core::export::SkipReason;
use std::fs;
use std::fs::File;
use std::path::Path;
use std::path::PathBuf;
use tracing::info;

pub fn execute(
    args: &ExportArgs,
    config: &FileConfig,
    formatter: &dyn OutputFormatter,
    quiet: bool,
) -> Result<()> {
    let format = add_path_context(ArchiveFormat::detect(&args.output), &args.output)?;

    if args.output.exists() && !args.force {
        bail!(
            "Output file '{}' already exists\n\
             HINT: Use --force to overwrite.",
            args.output.display()
        );
    }

    let root = config.root(args.root.as_deref())?;
    let policy = AccessPolicy::new(&root)
        .with_restrict_access(config.restrict_access(&args.restrict)?);

    let read_failure = if args.skip_unreadable || config.skip_unreadable {
        ReadFailurePolicy::Skip
    } else {
        ReadFailurePolicy::Abort
    };
    let export_config = ExportConfig::new()
        .with_compression_level(args.compression_level.or(config.compression_level))
        .with_read_failure(read_failure);
    add_path_context(export_config.validate(), &args.output)?;

    let file = File::create(&args.output)
        .with_context(|| format!("failed to create '{}'", args.output.display()))?;

    let mut exporter = ArchiveExporter::new(policy.root(), export_config);
    if let Some(inside) = output_below_root(&args.output, exporter.root()) {
        exporter = exporter.with_excluded(inside);
    }
    info!(
        root = %exporter.root().display(),
        output = %args.output.display(),
        ?format,
        "exporting"
    );

    let mut sink = format.sink(file, exporter.config().compression_level);

    let result = if !quiet && CliProgress::should_show() {
        let mut progress = CliProgress::new("Exporting");
        run(args, &exporter, &policy, &mut *sink, &mut progress)
    } else {
        run(args, &exporter, &policy, &mut *sink, &mut NoopProgress)
    };

    let report = match result.and_then(|report| {
        sink.close()
            .with_context(|| format!("failed to finish '{}'", args.output.display()))?;
        Ok(report)
    }) {
        Ok(report) => report,
        Err(err) => {
            // Never leave a truncated archive behind
            let _ = fs::remove_file(&args.output);
            return Err(err);
        }
    };

    let unreadable = report.skipped_for(SkipReason::Unreadable);
    if !unreadable.is_empty() {
        formatter.format_warning(&format!(
            "{} unreadable file(s) left out of the archive",
            unreadable.len()
        ));
    }
    let duplicates = report.skipped_for(SkipReason::DuplicateName);
    if !duplicates.is_empty() {
        formatter.format_warning(&format!(
            "{} file(s) left out because their archive name was already taken",
            duplicates.len()
        ));
    }

    formatter.format_export_result(&args.output, &report)?;

    Ok(())
}

/// Spells the output file under `root` if it lives inside the exported
/// tree, so it is not archived into itself.
fn output_below_root(output: &Path, root: &Path) -> Option<PathBuf> {
    let output = fs::canonicalize(output).ok()?;
    let canonical_root = fs::canonicalize(root).ok()?;
    let relative = output.strip_prefix(&canonical_root).ok()?;
    Some(root.join(relative))
}

fn run(
    args: &ExportArgs,
    exporter: &ArchiveExporter,
    policy: &AccessPolicy,
    sink: &mut dyn ArchiveSink,
    progress: &mut dyn ExportProgress,
) -> Result<ExportReport> {
    let report = if args.select.is_empty() {
        exporter.export_with_progress(sink, |path| policy.can_read(path), progress)
    } else {
        exporter.export_selection(policy, &args.base, &args.select, sink, progress)
    };
    add_path_context(report, &args.output)
}
