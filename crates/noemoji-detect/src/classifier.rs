//! Emoji classification.
//!
//! A classifier maps decoded text to the ordered list of emoji clusters it
//! contains. The built-in [`PatternClassifier`] works from a fixed table of
//! code-point ranges plus a few cluster rules (flags, modifiers, keycaps and
//! zero-width-joiner sequences). With the `emoji-db` feature a database
//! backed classifier is available and preferred by [`default_classifier`].
//!
//! Chunked rewriting relies on two properties every classifier must have:
//! a span depends only on the text from its first byte onwards, and no span
//! is longer than [`MAX_CLUSTER_BYTES`].

use std::cmp::Ordering;
use std::sync::Arc;

use noemoji_core::{EmojiSpan, MAX_CLUSTER_BYTES};

/// Finds emoji clusters in text.
pub trait EmojiClassifier: Send + Sync {
    /// Return the emoji spans in `text`, ordered and non-overlapping.
    ///
    /// Offsets are byte offsets relative to the start of `text`.
    fn find_spans(&self, text: &str) -> Vec<EmojiSpan>;

    /// Short name used in reports.
    fn name(&self) -> &'static str;
}

/// Pick the most accurate classifier compiled into this build.
pub fn default_classifier() -> Arc<dyn EmojiClassifier> {
    #[cfg(feature = "emoji-db")]
    {
        Arc::new(crate::DatabaseClassifier::new())
    }
    #[cfg(not(feature = "emoji-db"))]
    {
        Arc::new(PatternClassifier::new())
    }
}

/// Concatenate the parts of `text` not covered by `spans`.
pub fn remove_spans(text: &str, spans: &[EmojiSpan]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for span in spans {
        let start = span.offset as usize;
        out.push_str(&text[cursor..start]);
        cursor = start + span.len;
    }
    out.push_str(&text[cursor..]);
    out
}

/// Remove every emoji `classifier` finds in `text`.
pub fn strip_emoji(classifier: &dyn EmojiClassifier, text: &str) -> String {
    remove_spans(text, &classifier.find_spans(text))
}

/// Emoji code-point ranges, sorted and non-overlapping.
const EMOJI_RANGES: &[(u32, u32)] = &[
    (0x231A, 0x231B), // watch, hourglass
    (0x23E9, 0x23F3), // media controls
    (0x23F8, 0x23FA),
    (0x25B6, 0x25B6), // play
    (0x25C0, 0x25C0), // reverse
    (0x2600, 0x2604), // weather
    (0x2611, 0x2611), // ballot box with check
    (0x2614, 0x2615),
    (0x2618, 0x2618),
    (0x261D, 0x261D),
    (0x2620, 0x2620),
    (0x2622, 0x2623),
    (0x2626, 0x2626),
    (0x262A, 0x262A),
    (0x262E, 0x262F),
    (0x2638, 0x263A),
    (0x2640, 0x2640),
    (0x2642, 0x2642),
    (0x2648, 0x2653), // zodiac
    (0x2668, 0x2668),
    (0x267B, 0x267B),
    (0x267E, 0x267F),
    (0x2692, 0x2697),
    (0x2699, 0x2699),
    (0x269B, 0x269C),
    (0x26A0, 0x26A1), // warning, high voltage
    (0x26A7, 0x26A7),
    (0x26AA, 0x26AB),
    (0x26B0, 0x26B1),
    (0x26BD, 0x26BE),
    (0x26C4, 0x26C5),
    (0x26C8, 0x26C8),
    (0x26CE, 0x26CF),
    (0x26D1, 0x26D1),
    (0x26D3, 0x26D4),
    (0x26E9, 0x26EA),
    (0x26F0, 0x26F5),
    (0x26F7, 0x26FA),
    (0x26FD, 0x26FD),
    (0x2702, 0x2705), // scissors .. check mark button
    (0x2708, 0x270D),
    (0x270F, 0x270F),
    (0x2712, 0x2712),
    (0x2714, 0x2714), // heavy check mark
    (0x2716, 0x2716),
    (0x271D, 0x271D),
    (0x2721, 0x2721),
    (0x2728, 0x2728), // sparkles
    (0x2733, 0x2734),
    (0x2744, 0x2744),
    (0x2747, 0x2747),
    (0x274C, 0x274C), // cross mark
    (0x274E, 0x274E),
    (0x2753, 0x2755),
    (0x2757, 0x2757),
    (0x2763, 0x2764), // hearts
    (0x2795, 0x2797),
    (0x27A1, 0x27A1),
    (0x27B0, 0x27B0),
    (0x27BF, 0x27BF),
    (0x2B05, 0x2B07),
    (0x2B1B, 0x2B1C),
    (0x2B50, 0x2B50), // star
    (0x2B55, 0x2B55),
    (0x3030, 0x3030),
    (0x303D, 0x303D),
    (0x1F004, 0x1F004),
    (0x1F0CF, 0x1F0CF),
    (0x1F170, 0x1F171),
    (0x1F17E, 0x1F17F),
    (0x1F18E, 0x1F18E),
    (0x1F191, 0x1F19A),
    (0x1F1E6, 0x1F1FF), // regional indicators
    (0x1F201, 0x1F202),
    (0x1F21A, 0x1F21A),
    (0x1F22F, 0x1F22F),
    (0x1F232, 0x1F23A),
    (0x1F250, 0x1F251),
    (0x1F300, 0x1F64F), // pictographs, emoticons
    (0x1F680, 0x1F6FF), // transport and map
    (0x1F900, 0x1F9FF), // supplemental symbols
    (0x1FA00, 0x1FA6F), // chess symbols
    (0x1FA70, 0x1FAFF), // symbols and pictographs extended-A
];

const ZWJ: char = '\u{200D}';
const KEYCAP: char = '\u{20E3}';
const VS16: char = '\u{FE0F}';

/// Whether `c` is an emoji base symbol.
pub(crate) fn is_pictographic(c: char) -> bool {
    let cp = c as u32;
    EMOJI_RANGES
        .binary_search_by(|&(lo, hi)| {
            if cp < lo {
                Ordering::Greater
            } else if cp > hi {
                Ordering::Less
            } else {
                Ordering::Equal
            }
        })
        .is_ok()
}

fn is_regional_indicator(c: char) -> bool {
    ('\u{1F1E6}'..='\u{1F1FF}').contains(&c)
}

/// Code points that attach to the preceding emoji.
fn is_modifier(c: char) -> bool {
    matches!(c,
        '\u{FE0E}' | '\u{FE0F}'        // variation selectors
        | '\u{1F3FB}'..='\u{1F3FF}'    // skin tones
        | '\u{20E3}'                   // keycap
        | '\u{E0020}'..='\u{E007F}'    // tags
    )
}

fn is_keycap_base(c: char) -> bool {
    c.is_ascii_digit() || c == '#' || c == '*'
}

/// Baseline classifier backed by a fixed code-point table.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternClassifier;

impl PatternClassifier {
    /// Create a new pattern classifier.
    pub fn new() -> Self {
        Self
    }

    /// Length in bytes of the emoji cluster starting at the beginning of
    /// `text`, or `None` if `text` does not start with an emoji.
    pub(crate) fn cluster_len(text: &str) -> Option<usize> {
        let mut chars = text.chars();
        let first = chars.next()?;

        if is_keycap_base(first) {
            return keycap_len(text);
        }
        if is_regional_indicator(first) {
            let len = match chars.next() {
                Some(second) if is_regional_indicator(second) => 8,
                _ => 4,
            };
            return Some(len);
        }
        if !is_pictographic(first) {
            return None;
        }
        Some(extend_cluster(text, first.len_utf8()))
    }
}

impl EmojiClassifier for PatternClassifier {
    fn find_spans(&self, text: &str) -> Vec<EmojiSpan> {
        let mut spans = Vec::new();
        let mut pos = 0;

        while let Some(c) = text[pos..].chars().next() {
            match Self::cluster_len(&text[pos..]) {
                Some(len) => {
                    spans.push(EmojiSpan::new(pos as u64, &text[pos..pos + len]));
                    pos += len;
                }
                None => pos += c.len_utf8(),
            }
        }

        spans
    }

    fn name(&self) -> &'static str {
        "pattern"
    }
}

/// `[0-9#*] U+FE0F? U+20E3`
fn keycap_len(text: &str) -> Option<usize> {
    let mut chars = text.chars().skip(1);
    match (chars.next(), chars.next()) {
        (Some(KEYCAP), _) => Some(1 + KEYCAP.len_utf8()),
        (Some(VS16), Some(KEYCAP)) => Some(1 + VS16.len_utf8() + KEYCAP.len_utf8()),
        _ => None,
    }
}

/// Grow a cluster whose base occupies `text[..end]`.
fn extend_cluster(text: &str, mut end: usize) -> usize {
    loop {
        let mut rest = text[end..].chars();
        let Some(next) = rest.next() else { break };

        if is_modifier(next) {
            if end + next.len_utf8() > MAX_CLUSTER_BYTES {
                break;
            }
            end += next.len_utf8();
            continue;
        }

        if next == ZWJ {
            let joined = end + ZWJ.len_utf8();
            if joined > MAX_CLUSTER_BYTES {
                break;
            }
            match rest.next() {
                Some(after) if is_pictographic(after) => {
                    if joined + after.len_utf8() > MAX_CLUSTER_BYTES {
                        // keep the joiner with the cluster rather than orphan it
                        end = joined;
                        break;
                    }
                    end = joined + after.len_utf8();
                    continue;
                }
                _ => {
                    end = joined;
                    break;
                }
            }
        }

        break;
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(spans: &[EmojiSpan]) -> Vec<&str> {
        spans.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn test_ranges_sorted() {
        for pair in EMOJI_RANGES.windows(2) {
            assert!(pair[0].0 <= pair[0].1);
            assert!(pair[0].1 < pair[1].0, "{:x?} overlaps {:x?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_hello_world_scenario() {
        let text = "Hello 😀 World ⭐!";
        let spans = PatternClassifier::new().find_spans(text);

        assert_eq!(texts(&spans), vec!["😀", "⭐"]);
        assert_eq!(spans[0].offset, 6);
        assert_eq!(remove_spans(text, &spans), "Hello  World !");
    }

    #[test]
    fn test_plain_text_has_no_spans() {
        let classifier = PatternClassifier::new();
        for text in [
            "",
            "plain ascii text\r\n",
            "中文文本和日本語のテキスト",
            "∑ ∫ √ ≤ ≥ → ←",
            "Numbers 123 # and *",
            "Café naïve",
        ] {
            assert!(classifier.find_spans(text).is_empty(), "{text}");
        }
    }

    #[test]
    fn test_entities_are_inert() {
        let text = "&amp; &lt;b&gt; &#128512; &#x1F600; &hearts;";
        assert!(PatternClassifier::new().find_spans(text).is_empty());
    }

    #[test]
    fn test_flag_is_one_span() {
        let spans = PatternClassifier::new().find_spans("go 🇺🇸🇬🇧!");
        assert_eq!(texts(&spans), vec!["🇺🇸", "🇬🇧"]);
    }

    #[test]
    fn test_lone_regional_indicator() {
        let spans = PatternClassifier::new().find_spans("x🇺y");
        assert_eq!(texts(&spans), vec!["🇺"]);
    }

    #[test]
    fn test_variation_selector_and_skin_tone() {
        let text = "\u{2764}\u{FE0F} \u{1F44D}\u{1F3FD} \u{2600}\u{FE0E}";
        let spans = PatternClassifier::new().find_spans(text);
        assert_eq!(
            texts(&spans),
            vec!["\u{2764}\u{FE0F}", "\u{1F44D}\u{1F3FD}", "\u{2600}\u{FE0E}"]
        );
        assert_eq!(remove_spans(text, &spans), "  ");
    }

    #[test]
    fn test_zwj_sequence_is_one_span() {
        let family = "👨\u{200D}👩\u{200D}👧\u{200D}👦";
        let text = format!("a{family}b");
        let spans = PatternClassifier::new().find_spans(&text);

        assert_eq!(texts(&spans), vec![family]);
        assert_eq!(strip_emoji(&PatternClassifier::new(), &text), "ab");
    }

    #[test]
    fn test_trailing_joiner_is_not_orphaned() {
        let text = "😀\u{200D}x";
        let spans = PatternClassifier::new().find_spans(text);
        assert_eq!(texts(&spans), vec!["😀\u{200D}"]);
        assert_eq!(remove_spans(text, &spans), "x");
    }

    #[test]
    fn test_chess_and_extended_symbols() {
        let spans = PatternClassifier::new().find_spans("a\u{1FA00} b\u{1FA70} c");
        assert_eq!(texts(&spans), vec!["\u{1FA00}", "\u{1FA70}"]);
    }

    #[test]
    fn test_keycap_sequences() {
        let spans = PatternClassifier::new().find_spans("1\u{FE0F}\u{20E3} #\u{20E3} 42");
        assert_eq!(texts(&spans), vec!["1\u{FE0F}\u{20E3}", "#\u{20E3}"]);
    }

    #[test]
    fn test_subdivision_flag_with_tags() {
        let scotland = "🏴\u{E0067}\u{E0062}\u{E0073}\u{E0063}\u{E0074}\u{E007F}";
        let spans = PatternClassifier::new().find_spans(scotland);
        assert_eq!(texts(&spans), vec![scotland]);
    }

    #[test]
    fn test_cluster_is_bounded() {
        let text = format!("\u{1F600}{}", "\u{FE0F}".repeat(40));
        let spans = PatternClassifier::new().find_spans(&text);

        // 4-byte base plus 20 three-byte selectors fills the cluster limit;
        // the rest are bare selectors, which are not emoji
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].len, MAX_CLUSTER_BYTES);
    }

    #[test]
    fn test_spans_ordered_and_disjoint() {
        let text = "✅ done ✨✨ ❌ 🚀🔥 🇯🇵 end";
        let spans = PatternClassifier::new().find_spans(text);
        assert_eq!(spans.len(), 7);
        for pair in spans.windows(2) {
            assert!(pair[0].end() <= pair[1].offset);
        }
    }

    #[test]
    fn test_concatenation_property() {
        let text = "Line 1 🎉\r\nLine 2 ✔ ok\n🌍 end";
        let spans = PatternClassifier::new().find_spans(text);

        let removed: String = spans.iter().map(|s| s.text.as_str()).collect();
        let kept = remove_spans(text, &spans);
        assert_eq!(kept, "Line 1 \r\nLine 2  ok\n end");
        assert_eq!(kept.len() + removed.len(), text.len());
    }
}
