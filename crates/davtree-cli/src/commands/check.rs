//! Check command implementation.

use crate::cli::CheckArgs;
use crate::config::FileConfig;
use crate::error::add_path_context;
use crate::output::OutputFormatter;
use anyhow::Result;
use davtree_core::AccessMode;
use davtree_core::AccessPolicy;

pub fn execute(
    args: &CheckArgs,
    config: &FileConfig,
    formatter: &dyn OutputFormatter,
) -> Result<()> {
    let root = config.root(args.root.as_deref())?;
    let policy = AccessPolicy::new(&root)
        .with_restrict_access(config.restrict_access(&args.restrict)?)
        .with_restrict_write(config.restrict_write(&args.restrict_write)?);

    let mode = if args.write {
        AccessMode::Write
    } else {
        AccessMode::Read
    };

    let local = add_path_context(policy.resolve(&args.path, mode), &args.path)?;
    formatter.format_access(&args.path, mode, &local)
}
