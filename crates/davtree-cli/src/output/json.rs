//! JSON output formatter for machine-readable results.

use super::formatter::JsonOutput;
use super::formatter::OutputFormatter;
use super::formatter::mode_name;
use anyhow::Result;
use davtree_core::AccessMode;
use davtree_core::CacheTag;
use davtree_core::ExportReport;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::io::{self};
use std::path::Path;
use std::path::PathBuf;

pub struct JsonFormatter;

impl JsonFormatter {
    fn output<T: Serialize>(value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(io::stdout(), "{json}")?;
        Ok(())
    }
}

fn display_all(paths: &[PathBuf]) -> Vec<String> {
    paths.iter().map(|p| p.display().to_string()).collect()
}

impl OutputFormatter for JsonFormatter {
    fn format_export_result(&self, output_path: &Path, report: &ExportReport) -> Result<()> {
        #[derive(Serialize)]
        struct ExportOutput {
            output_path: String,
            files_added: usize,
            bytes_read: u64,
            partial: bool,
            skipped: BTreeMap<&'static str, Vec<String>>,
            duration_ms: u128,
        }

        let data = ExportOutput {
            output_path: output_path.display().to_string(),
            files_added: report.files_added,
            bytes_read: report.bytes_read,
            partial: report.is_partial(),
            skipped: report
                .skipped
                .iter()
                .map(|(reason, paths)| (reason.label(), display_all(paths)))
                .collect(),
            duration_ms: report.duration.as_millis(),
        };

        let output = JsonOutput::success("export", data);
        Self::output(&output)
    }

    fn format_walk(&self, root: &Path, paths: &[PathBuf]) -> Result<()> {
        #[derive(Serialize)]
        struct WalkOutput {
            root: String,
            total: usize,
            paths: Vec<String>,
        }

        let data = WalkOutput {
            root: root.display().to_string(),
            total: paths.len(),
            paths: display_all(paths),
        };

        let output = JsonOutput::success("walk", data);
        Self::output(&output)
    }

    fn format_etag(
        &self,
        file: &Path,
        tag: Option<&CacheTag>,
        passed: Option<bool>,
    ) -> Result<()> {
        #[derive(Serialize)]
        struct EtagOutput {
            file: String,
            etag: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            precondition_passed: Option<bool>,
        }

        let data = EtagOutput {
            file: file.display().to_string(),
            etag: tag.map(ToString::to_string),
            precondition_passed: passed,
        };

        let output = JsonOutput::success("etag", data);
        Self::output(&output)
    }

    fn format_access(&self, request: &Path, mode: AccessMode, local: &Path) -> Result<()> {
        #[derive(Serialize)]
        struct AccessOutput {
            request: String,
            mode: &'static str,
            granted: bool,
            local_path: String,
        }

        let data = AccessOutput {
            request: request.display().to_string(),
            mode: mode_name(mode),
            granted: true,
            local_path: local.display().to_string(),
        };

        let output = JsonOutput::success("check", data);
        Self::output(&output)
    }

    fn format_warning(&self, message: &str) {
        // Keep stdout a single JSON document
        eprintln!("warning: {message}");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_json_output_structure() {
        #[derive(Serialize)]
        struct TestData {
            value: String,
        }

        let output = JsonOutput::success(
            "walk",
            TestData {
                value: "test".to_string(),
            },
        );

        let json = serde_json::to_string(&output).unwrap();
        assert!(json.contains("\"operation\":\"walk\""));
        assert!(json.contains("\"status\":\"success\""));
        assert!(json.contains("\"value\":\"test\""));
    }

    #[test]
    fn test_display_all() {
        let paths = vec![PathBuf::from("a"), PathBuf::from("b/c")];
        assert_eq!(display_all(&paths), vec!["a", "b/c"]);
    }
}
