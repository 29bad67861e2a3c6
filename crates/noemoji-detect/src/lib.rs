//! Emoji detection and removal for noemoji.
//!
//! This crate provides the per-file half of the engine:
//!
//! - **Classification** - find emoji clusters in decoded text
//! - **Filtering** - decide which files are worth opening at all
//! - **Rewriting** - strip matched clusters from a file, streaming large
//!   files in bounded chunks
//!
//! # Classification
//!
//! ```rust
//! use noemoji_detect::{EmojiClassifier, PatternClassifier};
//!
//! let spans = PatternClassifier::new().find_spans("Hello 😀 World ⭐!");
//! assert_eq!(spans.len(), 2);
//! ```
//!
//! # Rewriting
//!
//! ```rust,no_run
//! use std::path::Path;
//! use noemoji_detect::{StreamRewriter, default_classifier};
//!
//! let classifier = default_classifier();
//! let rewriter = StreamRewriter::default();
//! let mut cleaned = Vec::new();
//! let outcome = rewriter
//!     .rewrite(Path::new("notes.md"), classifier.as_ref(), &mut cleaned)
//!     .unwrap();
//!
//! println!("removed {} emoji", outcome.spans.len());
//! ```

mod classifier;
#[cfg(feature = "emoji-db")]
mod database;
mod filter;
mod ignore_rules;
mod rewriter;

pub use classifier::{
    EmojiClassifier, PatternClassifier, default_classifier, remove_spans, strip_emoji,
};
#[cfg(feature = "emoji-db")]
pub use database::DatabaseClassifier;
pub use filter::{FileFilter, looks_binary};
pub use ignore_rules::{GitignoreRules, IgnoreRules};
pub use rewriter::{RewriteOutcome, StreamRewriter};

// Re-export core types
pub use noemoji_core::{EmojiSpan, FileResult, FileTask, MAX_CLUSTER_BYTES, SkipReason};
