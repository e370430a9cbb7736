//! Archive entry names in code page 437.
//!
//! Classic unzip tools read entry names as CP437 unless told otherwise, so
//! names are reduced to what CP437 can express before they are written.

use std::fmt;
use std::path::Component;
use std::path::Path;

use codepage_437::CP437_CONTROL;

/// Byte written for characters CP437 cannot represent (`?`).
pub const REPLACEMENT: u8 = b'?';

/// An entry name transcoded to CP437.
///
/// # Examples
///
/// ```
/// use davtree_core::export::EntryName;
/// use std::path::Path;
///
/// let ascii = EntryName::transcode(Path::new("b/c.txt"));
/// assert_eq!(ascii.as_bytes(), b"b/c.txt");
///
/// let euro = EntryName::transcode(Path::new("price\u{20ac}.txt"));
/// assert_eq!(euro.to_unicode_lossy(), "price?.txt");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryName {
    bytes: Vec<u8>,
}

impl EntryName {
    /// Transcodes a relative path into a `/`-separated CP437 name.
    ///
    /// Only normal components are kept. Characters with no CP437 code, and
    /// any invalid Unicode in the file name, become [`REPLACEMENT`].
    #[must_use]
    pub fn transcode(relative: &Path) -> Self {
        let mut bytes = Vec::new();

        let names = relative.components().filter_map(|component| match component {
            Component::Normal(name) => Some(name),
            _ => None,
        });
        for (index, name) in names.enumerate() {
            if index > 0 {
                bytes.push(b'/');
            }
            bytes.extend(name.to_string_lossy().chars().map(encode_char));
        }

        Self { bytes }
    }

    /// Returns the CP437 bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Decodes the CP437 bytes back to text.
    ///
    /// Archive writers that only accept Unicode names store this string;
    /// it differs from the source name exactly where characters were
    /// replaced.
    #[must_use]
    pub fn to_unicode_lossy(&self) -> String {
        self.bytes.iter().map(|&b| CP437_CONTROL.decode(b)).collect()
    }

    /// Returns `true` if the name is plain ASCII.
    #[must_use]
    pub fn is_ascii(&self) -> bool {
        self.bytes.is_ascii()
    }

    /// Returns `true` if the name has no components.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Encodes one character, refusing the look-alike fallbacks of the
/// encoding table: a byte is kept only if it decodes back to `c`.
fn encode_char(c: char) -> u8 {
    CP437_CONTROL
        .encode(c)
        .filter(|&b| CP437_CONTROL.decode(b) == c)
        .unwrap_or(REPLACEMENT)
}

impl fmt::Display for EntryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_unicode_lossy())
    }
}
