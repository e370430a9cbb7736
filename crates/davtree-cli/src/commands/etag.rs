//! Etag command implementation.

use crate::cli::EtagArgs;
use crate::error::add_path_context;
use crate::output::OutputFormatter;
use anyhow::Result;
use anyhow::bail;
use davtree_core::CacheTag;
use davtree_core::Preconditions;
use std::fs;
use std::io;

pub fn execute(args: &EtagArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let mut conditions = Preconditions::new();
    if let Some(list) = &args.if_match {
        conditions = conditions.with_if_match(list.as_str());
    }
    if let Some(list) = &args.if_none_match {
        conditions = conditions.with_if_none_match(list.as_str());
    }

    if args.if_match.is_none() && args.if_none_match.is_none() {
        let tag = add_path_context(CacheTag::generate(&args.file), &args.file)?;
        return formatter.format_etag(&args.file, Some(&tag), None);
    }

    // A missing file has no tag; the conditions decide what that means
    let current = match fs::metadata(&args.file) {
        Ok(metadata) => Some(add_path_context(
            CacheTag::from_metadata(&metadata),
            &args.file,
        )?),
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(err) => return Err(err.into()),
    };
    let passed = add_path_context(conditions.check(current.as_ref()), &args.file)?;

    formatter.format_etag(&args.file, current.as_ref(), Some(passed))?;
    if !passed {
        bail!("Precondition failed for '{}'", args.file.display());
    }

    Ok(())
}
