//! Output format detection.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::DavError;
use crate::Result;
use crate::export::sink::ArchiveSink;
use crate::export::sink::TarSink;
use crate::export::sink::ZipSink;

/// Archive formats the exporter can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// ZIP archive, deflate compressed.
    Zip,
    /// Tar archive (uncompressed).
    Tar,
    /// Gzip-compressed tar archive.
    TarGz,
}

impl ArchiveFormat {
    /// Detects the format from the output file name.
    ///
    /// Recognised: `.zip`, `.tar`, `.tar.gz` and `.tgz`, in any case.
    ///
    /// # Errors
    ///
    /// Returns `DavError::UnsupportedFormat` for anything else.
    ///
    /// # Examples
    ///
    /// ```
    /// use davtree_core::export::ArchiveFormat;
    /// use std::path::Path;
    ///
    /// assert_eq!(ArchiveFormat::detect(Path::new("out.ZIP"))?, ArchiveFormat::Zip);
    /// assert_eq!(ArchiveFormat::detect(Path::new("out.tgz"))?, ArchiveFormat::TarGz);
    /// assert!(ArchiveFormat::detect(Path::new("out.rar")).is_err());
    /// # Ok::<(), davtree_core::DavError>(())
    /// ```
    pub fn detect(path: &Path) -> Result<Self> {
        let unsupported = || DavError::UnsupportedFormat {
            path: path.to_path_buf(),
        };

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(unsupported)?
            .to_ascii_lowercase();

        match extension.as_str() {
            "zip" => Ok(Self::Zip),
            "tar" => Ok(Self::Tar),
            "tgz" => Ok(Self::TarGz),
            "gz" => {
                let stem = path.file_stem().map(|s| s.to_string_lossy().to_ascii_lowercase());
                match stem {
                    Some(stem) if stem.ends_with(".tar") => Ok(Self::TarGz),
                    _ => Err(unsupported()),
                }
            }
            _ => Err(unsupported()),
        }
    }

    /// Returns the canonical file extension.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::Tar => "tar",
            Self::TarGz => "tar.gz",
        }
    }

    /// Creates a sink of this format writing to `file`.
    #[must_use]
    pub fn sink(self, file: File, compression_level: Option<u8>) -> Box<dyn ArchiveSink> {
        let writer = BufWriter::new(file);
        match self {
            Self::Zip => Box::new(ZipSink::new(writer, compression_level)),
            Self::Tar => Box::new(TarSink::new(writer)),
            Self::TarGz => Box::new(TarSink::gzip(writer, compression_level)),
        }
    }
}
