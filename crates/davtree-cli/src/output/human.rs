//! Human-readable output formatter with colors and styling.

use super::formatter::OutputFormatter;
use super::formatter::mode_name;
use anyhow::Result;
use console::Term;
use console::style;
use davtree_core::AccessMode;
use davtree_core::CacheTag;
use davtree_core::ExportReport;
use davtree_core::export::SkipReason;
use std::path::Path;
use std::path::PathBuf;

pub struct HumanFormatter {
    verbose: bool,
    quiet: bool,
    use_colors: bool,
    term: Term,
}

impl HumanFormatter {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            use_colors: console::colors_enabled(),
            term: Term::stdout(),
        }
    }

    fn format_size(bytes: u64) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        const GB: u64 = MB * 1024;

        if bytes >= GB {
            format!("{:.1} GB", bytes as f64 / GB as f64)
        } else if bytes >= MB {
            format!("{:.1} MB", bytes as f64 / MB as f64)
        } else if bytes >= KB {
            format!("{:.1} KB", bytes as f64 / KB as f64)
        } else {
            format!("{bytes} B")
        }
    }

    fn format_number(n: usize) -> String {
        let s = n.to_string();
        let mut result = String::new();
        let mut count = 0;

        for c in s.chars().rev() {
            if count == 3 {
                result.push(',');
                count = 0;
            }
            result.push(c);
            count += 1;
        }

        result.chars().rev().collect()
    }

    fn headline(&self, ok: bool, message: &str) {
        if self.use_colors {
            let mark = if ok {
                style("✓").green().bold()
            } else {
                style("✗").red().bold()
            };
            let _ = self.term.write_line(&format!("{mark} {message}"));
        } else {
            let _ = self.term.write_line(message);
        }
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_export_result(&self, output_path: &Path, report: &ExportReport) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        self.headline(
            true,
            &format!("Archive created: {}", output_path.display()),
        );

        let _ = self.term.write_line("");
        let _ = self.term.write_line(&format!(
            "  Files added:      {}",
            Self::format_number(report.files_added)
        ));
        let _ = self.term.write_line(&format!(
            "  Total size:       {}",
            Self::format_size(report.bytes_read)
        ));

        // Directory skips are expected and not listed
        for (reason, paths) in &report.skipped {
            if *reason == SkipReason::Directory {
                continue;
            }
            let _ = self.term.write_line(&format!(
                "  Skipped ({reason}): {}",
                Self::format_number(paths.len())
            ));
        }

        if self.verbose {
            for (reason, paths) in &report.skipped {
                if *reason == SkipReason::Directory {
                    continue;
                }
                for path in paths {
                    let _ = self
                        .term
                        .write_line(&format!("    [{reason}] {}", path.display()));
                }
            }
            let _ = self
                .term
                .write_line(&format!("  Duration:         {:?}", report.duration));
        }

        Ok(())
    }

    fn format_walk(&self, _root: &Path, paths: &[PathBuf]) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        for path in paths {
            let _ = self.term.write_line(&format!("{}", path.display()));
        }

        if self.verbose {
            let _ = self.term.write_line("");
            let _ = self.term.write_line(&format!(
                "Total: {} entries",
                Self::format_number(paths.len())
            ));
        }

        Ok(())
    }

    fn format_etag(
        &self,
        file: &Path,
        tag: Option<&CacheTag>,
        passed: Option<bool>,
    ) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        match passed {
            None => {
                if let Some(tag) = tag {
                    let _ = self.term.write_line(tag.as_str());
                }
            }
            Some(passed) => {
                let outcome = if passed {
                    "Precondition passed"
                } else {
                    "Precondition failed"
                };
                self.headline(passed, &format!("{outcome}: {}", file.display()));
                let current = tag.map_or("(none)", CacheTag::as_str);
                let _ = self.term.write_line(&format!("  Current tag: {current}"));
            }
        }

        Ok(())
    }

    fn format_access(&self, request: &Path, mode: AccessMode, local: &Path) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        self.headline(
            true,
            &format!("{} access granted: {}", mode_name(mode), request.display()),
        );
        if self.verbose {
            let _ = self
                .term
                .write_line(&format!("  Local path: {}", local.display()));
        }

        Ok(())
    }

    fn format_warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        if self.use_colors {
            let _ = self
                .term
                .write_line(&format!("{} {message}", style("⚠").yellow().bold()));
        } else {
            let _ = self.term.write_line(&format!("WARNING: {message}"));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size_bytes() {
        assert_eq!(HumanFormatter::format_size(0), "0 B");
        assert_eq!(HumanFormatter::format_size(512), "512 B");
        assert_eq!(HumanFormatter::format_size(1023), "1023 B");
    }

    #[test]
    fn test_format_size_larger_units() {
        assert_eq!(HumanFormatter::format_size(1536), "1.5 KB");
        assert_eq!(HumanFormatter::format_size(2 * 1024 * 1024), "2.0 MB");
        assert_eq!(HumanFormatter::format_size(1536 * 1024 * 1024), "1.5 GB");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(HumanFormatter::format_number(0), "0");
        assert_eq!(HumanFormatter::format_number(999), "999");
        assert_eq!(HumanFormatter::format_number(1000), "1,000");
        assert_eq!(HumanFormatter::format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn test_quiet_formatter_prints_nothing() {
        let formatter = HumanFormatter::new(false, true);
        let report = ExportReport::new();
        assert!(
            formatter
                .format_export_result(Path::new("out.zip"), &report)
                .is_ok()
        );
        assert!(formatter.format_walk(Path::new("."), &[]).is_ok());
    }
}
