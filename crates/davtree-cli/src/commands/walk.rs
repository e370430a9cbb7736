//! Walk command implementation.

use crate::cli::WalkArgs;
use crate::error::add_path_context;
use crate::output::OutputFormatter;
use anyhow::Result;
use davtree_core::walk;
use std::path::PathBuf;
use tracing::debug;

pub fn execute(args: &WalkArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    if !args.path.exists() {
        anyhow::bail!("Not found: '{}'", args.path.display());
    }

    let paths = add_path_context(
        walk(&args.path, args.depth).collect::<davtree_core::Result<Vec<PathBuf>>>(),
        &args.path,
    )?;
    debug!(root = %args.path.display(), depth = %args.depth, count = paths.len(), "walked");

    formatter.format_walk(&args.path, &paths)
}
