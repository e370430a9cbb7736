//! Counting reader for tracking bytes read.
//!
//! This module provides a `CountingReader` that wraps any `Read`
//! implementation, tracks the total number of bytes read and remembers
//! whether the source failed.

use std::io::Read;

/// Wrapper reader that tracks bytes read and read failures.
///
/// When a copy from a source into an archive fails, the error alone does not
/// say which side broke. `CountingReader` records a failure of the source, so
/// the caller can tell an unreadable input from a broken output.
///
/// # Examples
///
/// ```
/// use davtree_core::io::CountingReader;
/// use std::io::Read;
///
/// let mut reader = CountingReader::new(&b"Hello, World!"[..]);
/// let mut out = String::new();
/// reader.read_to_string(&mut out)?;
///
/// assert_eq!(reader.total_bytes(), 13);
/// assert!(!reader.failed());
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct CountingReader<R> {
    inner: R,
    bytes_read: u64,
    failed: bool,
}

impl<R> CountingReader<R> {
    /// Creates a new counting reader.
    #[must_use]
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            bytes_read: 0,
            failed: false,
        }
    }

    /// Returns the total number of bytes successfully read.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.bytes_read
    }

    /// Returns `true` if any read from the inner reader returned an error.
    ///
    /// Interrupted reads are retried by callers and are not counted as
    /// failures.
    #[must_use]
    pub fn failed(&self) -> bool {
        self.failed
    }

    /// Consumes the counting reader and returns the inner reader.
    #[must_use]
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self.inner.read(buf) {
            Ok(bytes) => {
                self.bytes_read += bytes as u64;
                Ok(bytes)
            }
            Err(err) => {
                if err.kind() != std::io::ErrorKind::Interrupted {
                    self.failed = true;
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct FailingReader {
        remaining: usize,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.remaining == 0 {
                return Err(std::io::Error::other("disk vanished"));
            }
            let n = self.remaining.min(buf.len());
            buf[..n].fill(b'x');
            self.remaining -= n;
            Ok(n)
        }
    }

    #[test]
    fn test_counting_reader_basic() {
        let mut reader = CountingReader::new(Cursor::new(b"Hello".to_vec()));
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(reader.total_bytes(), 5);
        assert!(!reader.failed());
        assert_eq!(out, b"Hello");
    }

    #[test]
    fn test_counting_reader_empty() {
        let mut reader = CountingReader::new(Cursor::new(Vec::new()));
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(reader.total_bytes(), 0);
    }

    #[test]
    fn test_counting_reader_records_failure() {
        let mut reader = CountingReader::new(FailingReader { remaining: 10 });
        let mut out = Vec::new();
        assert!(reader.read_to_end(&mut out).is_err());
        assert!(reader.failed());
        assert_eq!(reader.total_bytes(), 10);
    }

    #[test]
    fn test_into_inner() {
        let reader = CountingReader::new(Cursor::new(vec![1, 2, 3]));
        let inner = reader.into_inner();
        assert_eq!(inner.into_inner(), vec![1, 2, 3]);
    }
}
