//! Classifier backed by the curated Unicode emoji database.

use noemoji_core::{EmojiSpan, MAX_CLUSTER_BYTES};
use unicode_segmentation::UnicodeSegmentation;

use crate::classifier::{EmojiClassifier, PatternClassifier};

/// Matches extended grapheme clusters against the `emojis` database.
///
/// More accurate than [`PatternClassifier`] for new or unusual sequences;
/// falls back to the pattern rules where the database has no match.
///
/// Clusters are segmented from each candidate position rather than from the
/// start of the text, and only inside a short fixed window, so
/// a span never depends on the text before it or far after it.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatabaseClassifier;

/// Bytes of text a database lookup may see. Kept below
/// [`MAX_CLUSTER_BYTES`] so a truncated trailing character at a chunk end
/// never shifts the window.
const LOOKUP_WINDOW: usize = MAX_CLUSTER_BYTES - 8;

impl DatabaseClassifier {
    /// Create a new database classifier.
    pub fn new() -> Self {
        Self
    }

    fn is_known(grapheme: &str) -> bool {
        emojis::get(grapheme).is_some()
            || emojis::get(grapheme.trim_end_matches('\u{FE0F}')).is_some()
    }

    /// Length of the known emoji grapheme at the start of `text`, if any.
    fn known_len(text: &str) -> Option<usize> {
        let mut end = text.len().min(LOOKUP_WINDOW);
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        let window = &text[..end];
        let grapheme = window.graphemes(true).next()?;

        // the cluster must be closed by a following character unless the
        // text really ends here
        let closed = grapheme.len() < window.len() || window.len() == text.len();
        (closed && Self::is_known(grapheme)).then_some(grapheme.len())
    }
}

impl EmojiClassifier for DatabaseClassifier {
    fn find_spans(&self, text: &str) -> Vec<EmojiSpan> {
        let mut spans = Vec::new();
        let mut pos = 0;

        while let Some(c) = text[pos..].chars().next() {
            let rest = &text[pos..];
            match Self::known_len(rest).or_else(|| PatternClassifier::cluster_len(rest)) {
                Some(len) => {
                    spans.push(EmojiSpan::new(pos as u64, &rest[..len]));
                    pos += len;
                }
                None => pos += c.len_utf8(),
            }
        }

        spans
    }

    fn name(&self) -> &'static str {
        "emoji-db"
    }
}
