//! Archive writers.
//!
//! An [`ArchiveSink`] owns the container format. The exporter hands it one
//! file at a time together with a reader over the file's bytes.

use std::fs::Metadata;
use std::io;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::io::Write;
use std::path::PathBuf;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use flate2::write::GzEncoder;
use tar::Builder;
use tar::EntryType;
use tar::Header;
use tempfile::SpooledTempFile;
use tracing::debug;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::export::encoding::EntryName;

/// Mode stored when permissions are not preserved.
const DEFAULT_MODE: u32 = 0o644;

/// Tar entries up to this size are staged in memory, larger ones spill to
/// a temporary file.
const SPOOL_MEMORY_LIMIT: usize = 8 * 1024 * 1024;

/// Per-entry attributes stored in the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMeta {
    /// Size reported by the filesystem before reading.
    pub size: u64,
    /// Unix permission bits, if they are to be stored.
    pub mode: Option<u32>,
    /// Modification time, if known.
    pub modified: Option<SystemTime>,
}

impl EntryMeta {
    /// Extracts entry attributes from file metadata.
    #[must_use]
    pub fn from_metadata(metadata: &Metadata, preserve_permissions: bool) -> Self {
        Self {
            size: metadata.len(),
            mode: if preserve_permissions {
                unix_mode(metadata)
            } else {
                None
            },
            modified: metadata.modified().ok(),
        }
    }
}

#[cfg(unix)]
fn unix_mode(metadata: &Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(metadata.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
fn unix_mode(metadata: &Metadata) -> Option<u32> {
    Some(if metadata.permissions().readonly() {
        0o444
    } else {
        DEFAULT_MODE
    })
}

/// Destination for exported file entries.
///
/// Implementations are single writers: entries arrive one at a time, in
/// order, and the sink is never shared between exports.
pub trait ArchiveSink {
    /// Adds one file entry named `name` with the bytes read from `content`.
    ///
    /// If this returns an error, no part of the entry may remain in the
    /// archive; the sink must stay usable for further entries or fail every
    /// later call.
    ///
    /// # Errors
    ///
    /// Returns the first error from reading `content` or from writing the
    /// archive.
    fn write_entry(&mut self, name: &EntryName, meta: &EntryMeta, content: &mut dyn Read)
    -> io::Result<()>;

    /// Writes the archive trailer and flushes the output.
    ///
    /// # Errors
    ///
    /// Returns an error if the trailer cannot be written.
    fn close(self: Box<Self>) -> io::Result<()>;
}

/// ZIP archive sink.
///
/// Names are stored as the CP437 round trip of each entry name, so ASCII
/// names are written unchanged.
pub struct ZipSink<W: Write + Seek> {
    zip: ZipWriter<W>,
    options: SimpleFileOptions,
    poisoned: bool,
}

impl<W: Write + Seek> ZipSink<W> {
    /// Creates a sink deflating entries at `compression_level` (1-9, or the
    /// default when `None`).
    #[must_use]
    pub fn new(writer: W, compression_level: Option<u8>) -> Self {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(compression_level.map(i64::from));

        Self {
            zip: ZipWriter::new(writer),
            options,
            poisoned: false,
        }
    }

    /// Writes the central directory and returns the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive cannot be completed.
    pub fn finish(self) -> io::Result<W> {
        self.check_usable()?;
        self.zip.finish().map_err(io::Error::other)
    }

    fn check_usable(&self) -> io::Result<()> {
        if self.poisoned {
            return Err(io::Error::other(
                "zip archive is unusable after a failed rollback",
            ));
        }
        Ok(())
    }
}

impl<W: Write + Seek> ArchiveSink for ZipSink<W> {
    fn write_entry(
        &mut self,
        name: &EntryName,
        meta: &EntryMeta,
        content: &mut dyn Read,
    ) -> io::Result<()> {
        self.check_usable()?;

        let mut options = self.options.large_file(meta.size >= u64::from(u32::MAX));
        if let Some(mode) = meta.mode {
            options = options.unix_permissions(mode);
        }

        self.zip
            .start_file(name.to_unicode_lossy(), options)
            .map_err(io::Error::other)?;

        if let Err(err) = io::copy(content, &mut self.zip) {
            if let Err(abort) = self.zip.abort_file() {
                self.poisoned = true;
                return Err(io::Error::other(abort));
            }
            return Err(err);
        }
        Ok(())
    }

    fn close(self: Box<Self>) -> io::Result<()> {
        let mut writer = self.finish()?;
        writer.flush()
    }
}

enum TarOutput<W: Write> {
    Plain(W),
    Gzip(GzEncoder<W>),
}

impl<W: Write> Write for TarOutput<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(w) => w.write(buf),
            Self::Gzip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(w) => w.flush(),
            Self::Gzip(w) => w.flush(),
        }
    }
}

/// Tar archive sink, optionally gzip compressed.
///
/// Each entry is read into a spool before its header is written, so a read
/// failure never leaves a truncated entry behind. The spool stays in memory
/// for small files and moves to a temporary file past 8 MiB.
///
/// On Unix the header holds the raw CP437 bytes of the entry name.
pub struct TarSink<W: Write> {
    builder: Builder<TarOutput<W>>,
}

impl<W: Write> TarSink<W> {
    /// Creates an uncompressed tar sink.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self::with_output(TarOutput::Plain(writer))
    }

    /// Creates a gzip-compressed tar sink.
    #[must_use]
    pub fn gzip(writer: W, compression_level: Option<u8>) -> Self {
        let level = compression_level_to_flate2(compression_level);
        Self::with_output(TarOutput::Gzip(GzEncoder::new(writer, level)))
    }

    fn with_output(output: TarOutput<W>) -> Self {
        Self {
            builder: Builder::new(output),
        }
    }

    /// Writes the end-of-archive marker and returns the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns an error if the trailer or the compressed stream cannot be
    /// written.
    pub fn finish(self) -> io::Result<W> {
        match self.builder.into_inner()? {
            TarOutput::Plain(writer) => Ok(writer),
            TarOutput::Gzip(encoder) => encoder.finish(),
        }
    }
}

impl<W: Write> ArchiveSink for TarSink<W> {
    fn write_entry(
        &mut self,
        name: &EntryName,
        meta: &EntryMeta,
        content: &mut dyn Read,
    ) -> io::Result<()> {
        let mut spool = SpooledTempFile::new(SPOOL_MEMORY_LIMIT);
        let size = io::copy(content, &mut spool)?;
        spool.seek(SeekFrom::Start(0))?;

        // The reader is authoritative; the file may have changed since stat
        if size != meta.size {
            debug!(entry = %name, expected = meta.size, size, "size changed while reading");
        }

        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Regular);
        header.set_size(size);
        header.set_mode(meta.mode.unwrap_or(DEFAULT_MODE));
        header.set_mtime(
            meta.modified
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map_or(0, |d| d.as_secs()),
        );

        self.builder
            .append_data(&mut header, tar_path(name), &mut spool)
    }

    fn close(self: Box<Self>) -> io::Result<()> {
        let mut writer = self.finish()?;
        writer.flush()
    }
}

#[cfg(unix)]
fn tar_path(name: &EntryName) -> PathBuf {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(OsStr::from_bytes(name.as_bytes()))
}

#[cfg(not(unix))]
fn tar_path(name: &EntryName) -> PathBuf {
    PathBuf::from(name.to_unicode_lossy())
}

/// Converts compression level (1-9) to flate2 compression level.
fn compression_level_to_flate2(level: Option<u8>) -> flate2::Compression {
    level.map_or_else(flate2::Compression::default, |n| {
        flate2::Compression::new(u32::from(n))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::Path;

    struct BrokenReader;

    impl Read for BrokenReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("vanished"))
        }
    }

    fn meta(size: u64) -> EntryMeta {
        EntryMeta {
            size,
            mode: Some(0o600),
            modified: None,
        }
    }

    fn name(text: &str) -> EntryName {
        EntryName::transcode(Path::new(text))
    }

    #[test]
    fn test_zip_sink_writes_entries() {
        let mut sink = ZipSink::new(Cursor::new(Vec::new()), Some(9));
        sink.write_entry(&name("a.txt"), &meta(5), &mut &b"hello"[..])
            .unwrap();
        sink.write_entry(&name("b/c.txt"), &meta(2), &mut &b"hi"[..])
            .unwrap();
        let bytes = sink.finish().unwrap().into_inner();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);
        let mut content = String::new();
        archive
            .by_name("b/c.txt")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "hi");
    }

    #[test]
    fn test_zip_sink_rolls_back_failed_entry() {
        let mut sink = ZipSink::new(Cursor::new(Vec::new()), None);
        assert!(
            sink.write_entry(&name("bad.txt"), &meta(1), &mut BrokenReader)
                .is_err()
        );
        sink.write_entry(&name("good.txt"), &meta(2), &mut &b"ok"[..])
            .unwrap();
        let bytes = sink.finish().unwrap().into_inner();

        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<_> = archive.file_names().collect();
        assert_eq!(names, vec!["good.txt"]);
    }

    #[test]
    fn test_tar_sink_writes_entries() {
        let mut sink = TarSink::new(Vec::new());
        sink.write_entry(&name("a.txt"), &meta(5), &mut &b"hello"[..])
            .unwrap();
        let bytes = sink.finish().unwrap();

        let mut archive = tar::Archive::new(Cursor::new(bytes));
        let mut entries = archive.entries().unwrap();
        let mut entry = entries.next().unwrap().unwrap();
        assert_eq!(entry.path().unwrap(), Path::new("a.txt"));
        assert_eq!(entry.header().mode().unwrap(), 0o600);
        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        assert_eq!(content, "hello");
        drop(entry);
        assert!(entries.next().is_none());
    }

    #[test]
    fn test_tar_sink_skips_failed_entry() {
        let mut sink = TarSink::new(Vec::new());
        assert!(
            sink.write_entry(&name("bad.txt"), &meta(1), &mut BrokenReader)
                .is_err()
        );
        sink.write_entry(&name("good.txt"), &meta(2), &mut &b"ok"[..])
            .unwrap();
        let bytes = sink.finish().unwrap();

        let mut archive = tar::Archive::new(Cursor::new(bytes));
        let paths: Vec<_> = archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().into_owned())
            .collect();
        assert_eq!(paths, vec![Path::new("good.txt").to_path_buf()]);
    }

    #[test]
    fn test_tar_sink_spills_large_entry() {
        let big = vec![b'x'; SPOOL_MEMORY_LIMIT + 1];
        let mut sink = TarSink::new(Vec::new());
        sink.write_entry(&name("big.bin"), &meta(big.len() as u64), &mut big.as_slice())
            .unwrap();
        let bytes = sink.finish().unwrap();

        let mut archive = tar::Archive::new(Cursor::new(bytes));
        let mut entry = archive.entries().unwrap().next().unwrap().unwrap();
        assert_eq!(entry.header().size().unwrap(), big.len() as u64);
        let mut content = Vec::new();
        entry.read_to_end(&mut content).unwrap();
        assert_eq!(content, big);
    }

    #[cfg(unix)]
    #[test]
    fn test_tar_sink_stores_cp437_name_bytes() {
        let mut sink = TarSink::new(Vec::new());
        sink.write_entry(&name("p\u{e4}iv\u{e4}.txt"), &meta(2), &mut &b"ok"[..])
            .unwrap();
        let bytes = sink.finish().unwrap();

        let mut archive = tar::Archive::new(Cursor::new(bytes));
        let entry = archive.entries().unwrap().next().unwrap().unwrap();
        assert_eq!(&*entry.path_bytes(), b"p\x84iv\x84.txt");
    }

    #[test]
    fn test_tar_gz_sink_round_trip() {
        let mut sink = TarSink::gzip(Vec::new(), Some(1));
        sink.write_entry(&name("a.txt"), &meta(3), &mut &b"abc"[..])
            .unwrap();
        let bytes = sink.finish().unwrap();

        let decoder = flate2::read::GzDecoder::new(Cursor::new(bytes));
        let mut archive = tar::Archive::new(decoder);
        assert_eq!(archive.entries().unwrap().count(), 1);
    }

    #[test]
    fn test_compression_level_to_flate2() {
        assert_eq!(compression_level_to_flate2(None), flate2::Compression::default());
        assert_eq!(compression_level_to_flate2(Some(9)).level(), 9);
    }
}
