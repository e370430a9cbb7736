//! CLI argument parsing using clap.

use clap::Parser;
use clap::Subcommand;
use clap_complete::Shell;
use davtree_core::DepthLimit;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "davtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Read defaults from a JSON configuration file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Export a directory tree into an archive
    Export(ExportArgs),
    /// List a directory tree
    Walk(WalkArgs),
    /// Print the revision tag of a file
    Etag(EtagArgs),
    /// Check access to a request path under a served root
    Check(CheckArgs),
    /// Generate shell completions
    Completion(CompletionArgs),
}

#[derive(clap::Args)]
pub struct ExportArgs {
    /// Output archive file path (.zip, .tar, .tar.gz, .tgz)
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Served root directory (default: config root_dir, then current
    /// directory)
    #[arg(short = 'r', long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Export only these entries of the base directory (can be repeated)
    #[arg(long = "select", short = 's', value_name = "NAME")]
    pub select: Vec<String>,

    /// Request path of the directory holding the selected entries
    #[arg(long, value_name = "PATH", default_value = "/")]
    pub base: PathBuf,

    /// Deny access to paths with a segment matching this glob (can be
    /// repeated)
    #[arg(long = "restrict", short = 'x', value_name = "PATTERN")]
    pub restrict: Vec<String>,

    /// Compression level (1-9)
    #[arg(short = 'l', long, value_parser = clap::value_parser!(u8).range(1..=9))]
    pub compression_level: Option<u8>,

    /// Skip files that cannot be read instead of aborting
    #[arg(long)]
    pub skip_unreadable: bool,

    /// Overwrite output file if exists
    #[arg(short = 'f', long)]
    pub force: bool,
}

#[derive(clap::Args)]
pub struct WalkArgs {
    /// Directory or file to walk
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Maximum depth: a number, or "infinity"
    #[arg(short, long, default_value = "infinity", value_parser = parse_depth)]
    pub depth: DepthLimit,
}

#[derive(clap::Args)]
pub struct EtagArgs {
    /// File to tag
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Fail unless the current tag is in this list
    #[arg(long, value_name = "TAGS", conflicts_with = "if_none_match")]
    pub if_match: Option<String>,

    /// Fail if the current tag is in this list
    #[arg(long, value_name = "TAGS")]
    pub if_none_match: Option<String>,
}

#[derive(clap::Args)]
pub struct CheckArgs {
    /// Request path, relative to the root
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Served root directory (default: config root_dir, then current
    /// directory)
    #[arg(short = 'r', long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Check write access instead of read access
    #[arg(short, long)]
    pub write: bool,

    /// Deny access to paths with a segment matching this glob (can be
    /// repeated)
    #[arg(long = "restrict", short = 'x', value_name = "PATTERN")]
    pub restrict: Vec<String>,

    /// Deny writes to paths with a segment matching this glob (can be
    /// repeated)
    #[arg(long, value_name = "PATTERN")]
    pub restrict_write: Vec<String>,
}

#[derive(clap::Args)]
pub struct CompletionArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,
}

fn parse_depth(s: &str) -> Result<DepthLimit, String> {
    DepthLimit::parse(s).map_err(|e| e.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_depth() {
        assert_eq!(parse_depth("2").unwrap(), DepthLimit::Bounded(2));
        assert_eq!(parse_depth("infinity").unwrap(), DepthLimit::Unbounded);
        assert!(parse_depth("deep").is_err());
    }

    #[test]
    fn test_export_args() {
        let cli = Cli::try_parse_from([
            "davtree", "export", "out.zip", "-r", "/srv", "-x", ".git", "-x", "*.php", "-l", "9",
        ])
        .unwrap();
        let Commands::Export(args) = cli.command else {
            panic!("expected export");
        };
        assert_eq!(args.root, Some(PathBuf::from("/srv")));
        assert_eq!(args.restrict, vec![".git", "*.php"]);
        assert_eq!(args.compression_level, Some(9));
        assert!(args.select.is_empty());
    }

    #[test]
    fn test_export_rejects_bad_level() {
        assert!(Cli::try_parse_from(["davtree", "export", "out.zip", "-l", "0"]).is_err());
    }

    #[test]
    fn test_etag_conditions_conflict() {
        let result = Cli::try_parse_from([
            "davtree",
            "etag",
            "f",
            "--if-match",
            "*",
            "--if-none-match",
            "*",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["davtree", "walk", ".", "--json", "-d", "1"]).unwrap();
        assert!(cli.json);
        let Commands::Walk(args) = cli.command else {
            panic!("expected walk");
        };
        assert_eq!(args.depth, DepthLimit::Bounded(1));
    }
}
