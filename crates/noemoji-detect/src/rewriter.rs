//! Emoji removal for single files.
//!
//! Files up to the streaming threshold are read whole. Larger files are
//! read in fixed-size chunks; the tail of each chunk is held back and
//! classified again together with the next one, so a cluster is never split
//! across a chunk boundary.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use noemoji_core::{
    ContentHash, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_STREAMING_THRESHOLD,
    EmojiSpan, FileError, FileResult, FileTask, MAX_CLUSTER_BYTES, ScanConfig,
};
use tracing::{debug, trace};

use crate::classifier::EmojiClassifier;

/// Result of rewriting one file.
#[derive(Debug, Clone)]
pub struct RewriteOutcome {
    /// Removed spans, with offsets into the original content.
    pub spans: Vec<EmojiSpan>,
    /// Bytes read from the source.
    pub bytes_read: u64,
    /// Bytes written to the destination.
    pub bytes_written: u64,
    /// Hash of the bytes read.
    pub hash: ContentHash,
    /// Whether the chunked path was used.
    pub streamed: bool,
}

/// Removes emoji from a file while copying it to a writer.
#[derive(Debug, Clone, Copy)]
pub struct StreamRewriter {
    threshold: u64,
    chunk_size: usize,
    overlap: usize,
}

impl Default for StreamRewriter {
    fn default() -> Self {
        Self::new(
            DEFAULT_STREAMING_THRESHOLD,
            DEFAULT_CHUNK_SIZE,
            DEFAULT_CHUNK_OVERLAP,
        )
    }
}

impl StreamRewriter {
    /// Create a rewriter.
    ///
    /// The overlap is raised to [`MAX_CLUSTER_BYTES`] if smaller.
    pub fn new(threshold: u64, chunk_size: usize, overlap: usize) -> Self {
        Self {
            threshold,
            chunk_size: chunk_size.max(1),
            overlap: overlap.max(MAX_CLUSTER_BYTES),
        }
    }

    /// Create a rewriter from the streaming settings of a scan.
    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(
            config.streaming_threshold,
            config.chunk_size,
            config.chunk_overlap,
        )
    }

    /// Whether a file of `size` bytes goes through the chunked path.
    pub fn is_streamed(&self, size: u64) -> bool {
        size > self.threshold
    }

    /// Scan a task without writing anything.
    pub fn process(&self, task: &FileTask, classifier: &dyn EmojiClassifier) -> FileResult {
        match self.rewrite(&task.path, classifier, &mut io::sink()) {
            Ok(outcome) => {
                trace!(
                    path = %task.path.display(),
                    count = outcome.spans.len(),
                    streamed = outcome.streamed,
                    "processed file"
                );
                FileResult::new(
                    &task.path,
                    outcome.spans,
                    outcome.bytes_read,
                    outcome.streamed,
                    outcome.hash,
                )
            }
            Err(err) => {
                debug!(path = %task.path.display(), error = %err, "failed to process file");
                FileResult::failed(&task.path, task.size, err)
            }
        }
    }

    /// Copy `path` to `out` with every emoji cluster removed.
    ///
    /// Bytes that are not valid UTF-8 are copied unchanged. Content
    /// containing NUL bytes is rejected as undecodable.
    pub fn rewrite<W: Write>(
        &self,
        path: &Path,
        classifier: &dyn EmojiClassifier,
        out: &mut W,
    ) -> Result<RewriteOutcome, FileError> {
        let mut file = File::open(path).map_err(|e| FileError::read(path, &e))?;
        let size = file
            .metadata()
            .map_err(|e| FileError::read(path, &e))?
            .len();

        if self.is_streamed(size) {
            self.rewrite_chunked(path, &mut file, classifier, out)
        } else {
            Self::rewrite_whole(path, &mut file, size, classifier, out)
        }
    }

    fn rewrite_whole<R: Read, W: Write>(
        path: &Path,
        reader: &mut R,
        size: u64,
        classifier: &dyn EmojiClassifier,
        out: &mut W,
    ) -> Result<RewriteOutcome, FileError> {
        let mut content = Vec::with_capacity(size as usize);
        reader
            .read_to_end(&mut content)
            .map_err(|e| FileError::read(path, &e))?;

        let spans = classify(path, &content, classifier)?;
        let bytes_written =
            write_without(&content, &spans, out).map_err(|e| FileError::write(path, &e))?;

        Ok(RewriteOutcome {
            spans,
            bytes_read: content.len() as u64,
            bytes_written,
            hash: ContentHash::new(*blake3::hash(&content).as_bytes()),
            streamed: false,
        })
    }

    fn rewrite_chunked<R: Read, W: Write>(
        &self,
        path: &Path,
        reader: &mut R,
        classifier: &dyn EmojiClassifier,
        out: &mut W,
    ) -> Result<RewriteOutcome, FileError> {
        let mut hasher = blake3::Hasher::new();
        let mut buf = vec![0u8; self.chunk_size];
        let mut pending: Vec<u8> = Vec::with_capacity(self.chunk_size + self.overlap);
        let mut spans = Vec::new();
        let mut consumed = 0u64;
        let mut bytes_read = 0u64;
        let mut bytes_written = 0u64;

        loop {
            let n = read_full(reader, &mut buf).map_err(|e| FileError::read(path, &e))?;
            let eof = n < self.chunk_size;
            let chunk = &buf[..n];

            hasher.update(chunk);
            bytes_read += n as u64;
            pending.extend_from_slice(chunk);

            let local = classify(path, &pending, classifier)?;
            let cut = if eof {
                pending.len()
            } else {
                safe_cut(&pending, self.overlap, &local)
            };

            let emitted: Vec<EmojiSpan> = local
                .into_iter()
                .take_while(|span| (span.offset as usize) < cut)
                .collect();
            bytes_written += write_without(&pending[..cut], &emitted, out)
                .map_err(|e| FileError::write(path, &e))?;
            spans.extend(emitted.into_iter().map(|span| span.shifted(consumed)));

            pending.drain(..cut);
            consumed += cut as u64;

            if eof {
                break;
            }
        }

        debug!(
            path = %path.display(),
            bytes = bytes_read,
            count = spans.len(),
            "streamed large file"
        );

        Ok(RewriteOutcome {
            spans,
            bytes_read,
            bytes_written,
            hash: ContentHash::new(*hasher.finalize().as_bytes()),
            streamed: true,
        })
    }
}

/// Find spans in raw bytes, classifying each valid UTF-8 run.
fn classify(
    path: &Path,
    bytes: &[u8],
    classifier: &dyn EmojiClassifier,
) -> Result<Vec<EmojiSpan>, FileError> {
    if bytes.contains(&0) {
        return Err(FileError::decode(path, "content contains NUL bytes"));
    }

    let mut spans = Vec::new();
    let mut pos = 0u64;
    for chunk in bytes.utf8_chunks() {
        let valid = chunk.valid();
        spans.extend(
            classifier
                .find_spans(valid)
                .into_iter()
                .map(|span| span.shifted(pos)),
        );
        pos += (valid.len() + chunk.invalid().len()) as u64;
    }
    Ok(spans)
}

/// Pick where to split `pending`: at least `overlap` bytes before the end,
/// on a character boundary, and never inside a span.
fn safe_cut(pending: &[u8], overlap: usize, spans: &[EmojiSpan]) -> usize {
    let mut cut = pending.len().saturating_sub(overlap);

    let mut steps = 0;
    while cut > 0 && steps < 3 && is_continuation(pending[cut]) {
        cut -= 1;
        steps += 1;
    }

    if let Some(span) = spans
        .iter()
        .find(|span| (span.offset as usize) < cut && span.end() as usize > cut)
    {
        cut = span.offset as usize;
    }
    cut
}

fn is_continuation(byte: u8) -> bool {
    byte & 0xC0 == 0x80
}

/// Write `bytes` minus the ranges covered by `spans` (offsets local to `bytes`).
fn write_without<W: Write>(bytes: &[u8], spans: &[EmojiSpan], out: &mut W) -> io::Result<u64> {
    let mut written = 0u64;
    let mut last = 0usize;
    for span in spans {
        let start = span.offset as usize;
        out.write_all(&bytes[last..start])?;
        written += (start - last) as u64;
        last = start + span.len;
    }
    out.write_all(&bytes[last..])?;
    written += (bytes.len() - last) as u64;
    Ok(written)
}

/// Read until `buf` is full or the reader is exhausted.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::PatternClassifier;
    use std::fs;
    use tempfile::TempDir;

    fn rewrite_bytes(rewriter: StreamRewriter, content: &[u8]) -> (Vec<u8>, RewriteOutcome) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("input.txt");
        fs::write(&path, content).unwrap();

        let mut out = Vec::new();
        let outcome = rewriter
            .rewrite(&path, &PatternClassifier::new(), &mut out)
            .unwrap();
        (out, outcome)
    }

    #[test]
    fn test_whole_file_removal() {
        let (out, outcome) =
            rewrite_bytes(StreamRewriter::default(), "Hello \u{1F600} World \u{2B50}!".as_bytes());

        assert_eq!(out, b"Hello  World !");
        assert!(!outcome.streamed);
        assert_eq!(outcome.spans.len(), 2);
        assert_eq!(outcome.spans[0].offset, 6);
        assert_eq!(outcome.bytes_written, out.len() as u64);
    }

    #[test]
    fn test_chunked_matches_whole_file() {
        let mut text = String::new();
        for i in 0..200 {
            text.push_str(&format!("line {i} \u{1F468}\u{200D}\u{1F469}\u{200D}\u{1F467} "));
            text.push_str("\u{1F1EF}\u{1F1F5}\u{1F1FA}\u{1F1F8} caf\u{e9} \u{2764}\u{FE0F}\n");
        }
        let content = text.as_bytes();

        let (whole_out, whole) = rewrite_bytes(StreamRewriter::default(), content);

        for chunk_size in [1, 3, 7, 64, 100, 4096] {
            let rewriter = StreamRewriter::new(0, chunk_size, 64);
            let (out, outcome) = rewrite_bytes(rewriter, content);

            assert!(outcome.streamed);
            assert_eq!(out, whole_out, "chunk size {chunk_size}");
            assert_eq!(outcome.spans, whole.spans, "chunk size {chunk_size}");
            assert_eq!(outcome.hash, whole.hash);
            assert_eq!(outcome.bytes_read, content.len() as u64);
        }
    }

    #[test]
    fn test_invalid_bytes_pass_through() {
        let mut content = b"abc\xff\xfe ".to_vec();
        content.extend_from_slice("\u{1F600}".as_bytes());
        content.extend_from_slice(b" \xc3 end");

        let (out, outcome) = rewrite_bytes(StreamRewriter::default(), &content);
        assert_eq!(out, b"abc\xff\xfe  \xc3 end");
        assert_eq!(outcome.spans.len(), 1);
        assert_eq!(outcome.spans[0].offset, 6);
    }

    #[test]
    fn test_nul_bytes_are_decode_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bin.txt");
        fs::write(&path, b"text\x00more").unwrap();

        let err = StreamRewriter::default()
            .rewrite(&path, &PatternClassifier::new(), &mut io::sink())
            .unwrap_err();
        assert!(matches!(err, FileError::Decode { .. }));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = TempDir::new().unwrap();
        let err = StreamRewriter::default()
            .rewrite(&dir.path().join("nope.txt"), &PatternClassifier::new(), &mut io::sink())
            .unwrap_err();
        assert!(matches!(err, FileError::Read { .. }));
    }

    #[test]
    fn test_process_builds_result() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.md");
        fs::write(&path, "one \u{1F389} two").unwrap();
        let task = FileTask::new(&path, 12, true);

        let result = StreamRewriter::default().process(&task, &PatternClassifier::new());
        assert_eq!(result.count, 1);
        assert_eq!(result.sample, "\u{1F389}");
        assert!(result.content_hash.is_some());
        assert!(!result.is_error());
    }

    #[test]
    fn test_safe_cut_backs_off_spans_and_characters() {
        let text = "ab\u{1F600}cd";
        let spans = PatternClassifier::new().find_spans(text);

        // cut would land inside the 4-byte emoji
        assert_eq!(safe_cut(text.as_bytes(), 4, &spans), 2);
        assert_eq!(safe_cut(b"short", 64, &[]), 0);
    }

    #[test]
    fn test_overlap_is_clamped() {
        let rewriter = StreamRewriter::new(0, 0, 1);
        assert_eq!(rewriter.overlap, MAX_CLUSTER_BYTES);
        assert_eq!(rewriter.chunk_size, 1);
    }
}
