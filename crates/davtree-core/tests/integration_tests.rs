//! Integration tests for davtree-core.
//!
//! These tests export real directory trees and read the archives back.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use davtree_core::AccessMode;
use davtree_core::AccessPolicy;
use davtree_core::ArchiveExporter;
use davtree_core::CacheTag;
use davtree_core::DavError;
use davtree_core::DepthLimit;
use davtree_core::ExportConfig;
use davtree_core::NoopProgress;
use davtree_core::PatternSet;
use davtree_core::ReadFailurePolicy;
use davtree_core::export::ArchiveFormat;
use davtree_core::export::SkipReason;
use davtree_core::export::TarSink;
use davtree_core::export::ZipSink;
use davtree_core::walk;
use std::collections::BTreeMap;
use std::fs;
use std::fs::File;
use std::io::Cursor;
use std::io::Read;
use std::path::Path;
use tempfile::TempDir;

fn sample_tree() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.txt"), "alpha").unwrap();
    fs::create_dir(temp.path().join("b")).unwrap();
    fs::write(temp.path().join("b/c.txt"), "charlie").unwrap();
    temp
}

fn read_zip(bytes: Vec<u8>) -> BTreeMap<String, Vec<u8>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut entries = BTreeMap::new();
    for index in 0..archive.len() {
        let mut file = archive.by_index(index).unwrap();
        let mut content = Vec::new();
        file.read_to_end(&mut content).unwrap();
        entries.insert(file.name().to_string(), content);
    }
    entries
}

fn read_tar<R: Read>(reader: R) -> BTreeMap<String, Vec<u8>> {
    let mut archive = tar::Archive::new(reader);
    let mut entries = BTreeMap::new();
    for entry in archive.entries().unwrap() {
        let mut entry = entry.unwrap();
        let name = entry.path().unwrap().to_string_lossy().into_owned();
        let mut content = Vec::new();
        entry.read_to_end(&mut content).unwrap();
        entries.insert(name, content);
    }
    entries
}

#[test]
fn test_export_tree_to_zip() {
    let temp = sample_tree();
    let exporter = ArchiveExporter::new(temp.path(), ExportConfig::default());
    let mut sink = ZipSink::new(Cursor::new(Vec::new()), None);

    let report = exporter.export(&mut sink, |_| true).unwrap();
    let entries = read_zip(sink.finish().unwrap().into_inner());

    assert_eq!(entries.len(), 2);
    assert_eq!(entries["a.txt"], b"alpha");
    assert_eq!(entries["b/c.txt"], b"charlie");
    assert_eq!(report.files_added, 2);
    assert_eq!(report.bytes_read, 12);
}

#[test]
fn test_export_tree_to_tar_gz_file() {
    let temp = sample_tree();
    let out = TempDir::new().unwrap();
    let output = out.path().join("tree.tar.gz");

    let format = ArchiveFormat::detect(&output).unwrap();
    let mut sink = format.sink(File::create(&output).unwrap(), Some(9));
    let exporter = ArchiveExporter::new(temp.path(), ExportConfig::default());
    exporter.export(&mut *sink, |_| true).unwrap();
    sink.close().unwrap();

    let decoder = flate2::read::GzDecoder::new(File::open(&output).unwrap());
    let entries = read_tar(decoder);
    assert_eq!(entries.keys().collect::<Vec<_>>(), vec!["a.txt", "b/c.txt"]);
    assert_eq!(entries["b/c.txt"], b"charlie");
}

#[test]
fn test_export_plain_tar() {
    let temp = sample_tree();
    let exporter = ArchiveExporter::new(temp.path(), ExportConfig::default());
    let mut sink = TarSink::new(Vec::new());

    exporter.export(&mut sink, |_| true).unwrap();
    let entries = read_tar(Cursor::new(sink.finish().unwrap()));
    assert_eq!(entries.len(), 2);
}

#[test]
fn test_export_with_policy_excludes_restricted() {
    let temp = sample_tree();
    fs::create_dir(temp.path().join(".git")).unwrap();
    fs::write(temp.path().join(".git/HEAD"), "ref").unwrap();
    fs::write(temp.path().join("b/hack.php"), "<?php").unwrap();

    let policy = AccessPolicy::new(temp.path())
        .with_restrict_access(PatternSet::from_globs([".git", "*.php"]).unwrap());
    let exporter = ArchiveExporter::new(temp.path(), ExportConfig::default());
    let mut sink = ZipSink::new(Cursor::new(Vec::new()), Some(1));

    let report = exporter
        .export(&mut sink, |path| policy.can_read(path))
        .unwrap();
    let entries = read_zip(sink.finish().unwrap().into_inner());

    assert_eq!(entries.keys().collect::<Vec<_>>(), vec!["a.txt", "b/c.txt"]);
    // .git, .git/HEAD and b/hack.php
    assert_eq!(report.skipped_for(SkipReason::AccessDenied).len(), 3);
}

#[test]
fn test_export_selection_from_subdirectory() {
    let temp = sample_tree();
    fs::create_dir(temp.path().join("b/d")).unwrap();
    fs::write(temp.path().join("b/d/e.txt"), "echo").unwrap();
    fs::write(temp.path().join("b/f.txt"), "foxtrot").unwrap();

    let policy = AccessPolicy::new(temp.path());
    let exporter = ArchiveExporter::new(temp.path(), ExportConfig::default());
    let mut sink = ZipSink::new(Cursor::new(Vec::new()), None);

    exporter
        .export_selection(&policy, Path::new("/b"), &["c.txt", "d"], &mut sink, &mut NoopProgress)
        .unwrap();
    let entries = read_zip(sink.finish().unwrap().into_inner());

    assert_eq!(entries.keys().collect::<Vec<_>>(), vec!["b/c.txt", "b/d/e.txt"]);
}

#[test]
fn test_export_selection_rejects_escape() {
    let temp = sample_tree();
    let policy = AccessPolicy::new(temp.path().join("b"));
    let exporter = ArchiveExporter::new(temp.path().join("b"), ExportConfig::default());
    let mut sink = ZipSink::new(Cursor::new(Vec::new()), None);

    let err = exporter
        .export_selection(&policy, Path::new("/"), &["../a.txt"], &mut sink, &mut NoopProgress)
        .unwrap_err();
    assert!(err.is_access_denied());
    assert_eq!(err.status_code(), 403);
}

#[test]
fn test_non_ascii_names_are_transcoded() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("caf\u{e9}.txt"), "latte").unwrap();
    fs::write(temp.path().join("\u{20ac}uro.txt"), "money").unwrap();

    let exporter = ArchiveExporter::new(temp.path(), ExportConfig::default());
    let mut sink = ZipSink::new(Cursor::new(Vec::new()), None);
    exporter.export(&mut sink, |_| true).unwrap();
    let entries = read_zip(sink.finish().unwrap().into_inner());

    assert!(entries.contains_key("caf\u{e9}.txt"));
    assert!(entries.contains_key("?uro.txt"));
}

#[cfg(unix)]
#[test]
fn test_skip_policy_keeps_going() {
    use std::os::unix::fs::PermissionsExt;

    let temp = sample_tree();
    let locked = temp.path().join("b/c.txt");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    if File::open(&locked).is_ok() {
        return;
    }

    let config = ExportConfig::default().with_read_failure(ReadFailurePolicy::Skip);
    let exporter = ArchiveExporter::new(temp.path(), config);
    let mut sink = ZipSink::new(Cursor::new(Vec::new()), None);

    let report = exporter.export(&mut sink, |_| true).unwrap();
    let entries = read_zip(sink.finish().unwrap().into_inner());

    assert_eq!(entries.keys().collect::<Vec<_>>(), vec!["a.txt"]);
    assert_eq!(report.skipped_for(SkipReason::Unreadable), &[locked]);
}

#[test]
fn test_walk_and_tags_agree_with_export() {
    let temp = sample_tree();
    let files: Vec<_> = walk(temp.path(), DepthLimit::Unbounded)
        .map(Result::unwrap)
        .filter(|p| p.is_file())
        .collect();
    assert_eq!(files.len(), 2);

    for file in &files {
        let tag = CacheTag::generate(file).unwrap();
        assert!(tag.matches(&format!("\"other\", {tag}")));
    }
}

#[test]
fn test_policy_resolution_end_to_end() {
    let temp = sample_tree();
    let policy = AccessPolicy::new(temp.path())
        .with_restrict_write(PatternSet::from_globs(["b"]).unwrap());

    let local = policy.resolve("/b/c.txt", AccessMode::Read).unwrap();
    assert_eq!(fs::read_to_string(local).unwrap(), "charlie");

    assert!(policy.resolve("/new.txt", AccessMode::Write).is_ok());
    let err = policy.resolve("/b/new.txt", AccessMode::Write).unwrap_err();
    assert!(matches!(err, DavError::Forbidden { .. }));
}
