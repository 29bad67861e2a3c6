//! Emoji span and content hash types.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Upper bound, in UTF-8 bytes, of a single emoji cluster.
///
/// Classifiers never report a span longer than this, and the chunked
/// rewriter holds back at least this many bytes between chunks.
pub const MAX_CLUSTER_BYTES: usize = 64;

/// A contiguous run of bytes that renders as one emoji.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmojiSpan {
    /// Byte offset of the first byte of the span.
    pub offset: u64,
    /// Length of the span in bytes.
    pub len: usize,
    /// The matched text.
    pub text: CompactString,
}

impl EmojiSpan {
    /// Create a span starting at `offset` covering `text`.
    pub fn new(offset: u64, text: &str) -> Self {
        Self {
            offset,
            len: text.len(),
            text: CompactString::new(text),
        }
    }

    /// Byte offset one past the end of the span.
    pub fn end(&self) -> u64 {
        self.offset + self.len as u64
    }

    /// Return the same span moved forward by `base` bytes.
    pub fn shifted(mut self, base: u64) -> Self {
        self.offset += base;
        self
    }
}

/// BLAKE3 digest of file contents, used to detect stale scan results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Create a new ContentHash from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the hash as a hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}
