//! Progress spinner for export.

use console::Term;
use davtree_core::ExportProgress;
use indicatif::ProgressBar;
use indicatif::ProgressState;
use indicatif::ProgressStyle;
use std::fmt::Write;
use std::path::Path;
use std::time::Duration;

/// CLI spinner implementing `ExportProgress`.
///
/// The number of entries is unknown until the walk ends, so this shows a
/// spinner with the running file count, bytes read and the current entry.
/// Automatically cleans up on drop.
pub struct CliProgress {
    bar: ProgressBar,
    bytes_read: u64,
}

impl CliProgress {
    /// Creates a new spinner with a leading message such as "Exporting".
    #[must_use]
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();

        // Template: "⠋ Exporting 42 files (15.2 MB, 5.1 MB/s) docs/report.pdf"
        bar.set_style(
            ProgressStyle::default_spinner()
                .template(
                    "{spinner:.cyan} {prefix} {pos} files ({bytes}, {bytes_per_sec}) {wide_msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .with_key("bytes", |state: &ProgressState, w: &mut dyn Write| {
                    write!(w, "{}", humanize_bytes(state.len().unwrap_or(0))).unwrap_or(());
                })
                .with_key("bytes_per_sec", |state: &ProgressState, w: &mut dyn Write| {
                    let secs = state.elapsed().as_secs_f64();
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    let per_sec = if secs > 0.0 {
                        (state.len().unwrap_or(0) as f64 / secs) as u64
                    } else {
                        0
                    };
                    write!(w, "{}/s", humanize_bytes(per_sec)).unwrap_or(());
                }),
        );
        bar.set_prefix(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar, bytes_read: 0 }
    }

    /// Checks if we should show progress (TTY detection).
    #[must_use]
    pub fn should_show() -> bool {
        Term::stderr().is_term()
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

impl ExportProgress for CliProgress {
    fn on_entry_start(&mut self, name: &Path, _index: usize) {
        self.bar.set_message(name.display().to_string());
    }

    fn on_bytes_read(&mut self, bytes: u64) {
        // Bytes ride on the bar length since the position counts files
        self.bytes_read += bytes;
        self.bar.set_length(self.bytes_read);
    }

    fn on_entry_complete(&mut self, _name: &Path) {
        self.bar.inc(1);
    }

    fn on_complete(&mut self) {
        self.bar.finish_and_clear();
    }
}

/// Converts bytes to human-readable format (KB, MB, GB, TB).
fn humanize_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.1} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humanize_bytes() {
        assert_eq!(humanize_bytes(0), "0 B");
        assert_eq!(humanize_bytes(512), "512 B");
        assert_eq!(humanize_bytes(1024), "1.0 KB");
        assert_eq!(humanize_bytes(1536), "1.5 KB");
        assert_eq!(humanize_bytes(1024 * 1024), "1.0 MB");
        assert_eq!(humanize_bytes(1024 * 1024 * 1024), "1.0 GB");
        assert_eq!(humanize_bytes(1024_u64.pow(4)), "1.0 TB");
    }

    #[test]
    fn test_progress_callback() {
        let mut progress = CliProgress::new("Testing");

        progress.on_entry_start(Path::new("test.txt"), 1);
        progress.on_bytes_read(1024);
        progress.on_entry_complete(Path::new("test.txt"));
        progress.on_bytes_read(512);

        assert_eq!(progress.bytes_read, 1536);
        assert_eq!(progress.bar.position(), 1);
        assert_eq!(progress.bar.length(), Some(1536));
    }
}
