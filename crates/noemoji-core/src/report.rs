//! Per-file results and the reports built from them.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::error::FileError;
use crate::span::{ContentHash, EmojiSpan};

/// Number of matched emoji shown in a result's sample.
pub const SAMPLE_LIMIT: usize = 10;

/// A file found during the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    /// Absolute path to the file.
    pub path: PathBuf,
    /// Lower-case extension without the dot.
    pub extension: Option<CompactString>,
    /// Size in bytes at walk time.
    pub size: u64,
    /// Whether the file passed the filter.
    pub eligible: bool,
}

impl FileTask {
    /// Create a task for a path, deriving its extension.
    pub fn new(path: impl Into<PathBuf>, size: u64, eligible: bool) -> Self {
        let path = path.into();
        let extension = extension_of(&path);
        Self {
            path,
            extension,
            size,
            eligible,
        }
    }
}

/// Lower-case extension of a path, if any.
pub(crate) fn extension_of(path: &Path) -> Option<CompactString> {
    path.extension()
        .map(|ext| CompactString::new(ext.to_string_lossy().to_lowercase()))
}

/// Why a file did not contribute to the match report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum SkipReason {
    /// Matched an ignore rule.
    Ignored,
    /// Extension not in the whitelist.
    NotWhitelisted,
    /// Extension in the blacklist.
    Blacklisted,
    /// Known binary or media extension.
    DefaultSkipped,
    /// Content sniff found binary data.
    Binary,
    /// Content could not be decoded as text.
    DecodeFailed,
    /// File could not be read.
    ReadFailed,
}

impl SkipReason {
    /// Whether the file was rejected for its type rather than for an error
    /// or an ignore rule.
    pub fn is_type_skip(self) -> bool {
        matches!(
            self,
            Self::NotWhitelisted | Self::Blacklisted | Self::DefaultSkipped | Self::Binary
        )
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ignored => write!(f, "ignored"),
            Self::NotWhitelisted => write!(f, "not in whitelist"),
            Self::Blacklisted => write!(f, "excluded"),
            Self::DefaultSkipped => write!(f, "binary/media type"),
            Self::Binary => write!(f, "binary content"),
            Self::DecodeFailed => write!(f, "not decodable"),
            Self::ReadFailed => write!(f, "unreadable"),
        }
    }
}

/// Outcome of processing one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResult {
    /// Path of the processed file.
    pub path: PathBuf,
    /// Matched spans, ordered by offset.
    pub spans: Vec<EmojiSpan>,
    /// Number of matched spans.
    pub count: usize,
    /// First few matched emoji, for display.
    pub sample: String,
    /// Size of the file in bytes when it was processed.
    pub size: u64,
    /// Whether the chunked path was used.
    pub streamed: bool,
    /// Hash of the bytes the spans were computed from.
    pub content_hash: Option<ContentHash>,
    /// Set when the file could not be processed.
    pub error: Option<FileError>,
}

impl FileResult {
    /// Create a successful result.
    pub fn new(
        path: impl Into<PathBuf>,
        spans: Vec<EmojiSpan>,
        size: u64,
        streamed: bool,
        content_hash: ContentHash,
    ) -> Self {
        let sample = build_sample(&spans);
        Self {
            path: path.into(),
            count: spans.len(),
            spans,
            sample,
            size,
            streamed,
            content_hash: Some(content_hash),
            error: None,
        }
    }

    /// Create a result for a file that could not be processed.
    pub fn failed(path: impl Into<PathBuf>, size: u64, error: FileError) -> Self {
        Self {
            path: path.into(),
            spans: Vec::new(),
            count: 0,
            sample: String::new(),
            size,
            streamed: false,
            content_hash: None,
            error: Some(error),
        }
    }

    /// Whether any emoji were found.
    pub fn has_matches(&self) -> bool {
        self.count > 0
    }

    /// Whether processing failed.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

fn build_sample(spans: &[EmojiSpan]) -> String {
    let mut sample: String = spans
        .iter()
        .take(SAMPLE_LIMIT)
        .map(|s| s.text.as_str())
        .collect();
    if spans.len() > SAMPLE_LIMIT {
        sample.push_str("...");
    }
    sample
}

/// Aggregated result of a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// Root directory that was scanned.
    pub root: PathBuf,
    /// Files with at least one match, sorted by path.
    pub files: Vec<FileResult>,
    /// Files processed without error, with or without matches.
    pub files_scanned: u64,
    /// Files rejected by the filter because of their type or content.
    pub files_skipped_by_type: u64,
    /// Total emoji across all files.
    pub total_emoji: u64,
    /// Bytes read by the scan.
    pub bytes_scanned: u64,
    /// Skipped files by reason.
    pub skipped: BTreeMap<SkipReason, u64>,
    /// Extensions of skipped files.
    pub skipped_extensions: BTreeSet<String>,
    /// Per-file failures.
    pub errors: Vec<FileError>,
    /// Whether the scan was cancelled before all files were processed.
    pub interrupted: bool,
    /// Name of the classifier used.
    pub classifier: String,
    /// Wall-clock time of the scan.
    pub duration: Duration,
}

impl ScanReport {
    /// Whether any emoji were found.
    pub fn has_matches(&self) -> bool {
        !self.files.is_empty()
    }

    /// Total number of skipped files, all reasons included.
    pub fn total_skipped(&self) -> u64 {
        self.skipped.values().sum()
    }

    /// Number of files skipped for a reason.
    pub fn skipped_for(&self, reason: SkipReason) -> u64 {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }
}

/// Incrementally accumulates file results into a [`ScanReport`].
///
/// Owned by the coordinator; workers never touch it.
#[derive(Debug)]
pub struct ReportBuilder {
    report: ScanReport,
}

impl ReportBuilder {
    /// Start an empty report.
    pub fn new(root: impl Into<PathBuf>, classifier: impl Into<String>) -> Self {
        Self {
            report: ScanReport {
                root: root.into(),
                files: Vec::new(),
                files_scanned: 0,
                files_skipped_by_type: 0,
                total_emoji: 0,
                bytes_scanned: 0,
                skipped: BTreeMap::new(),
                skipped_extensions: BTreeSet::new(),
                errors: Vec::new(),
                interrupted: false,
                classifier: classifier.into(),
                duration: Duration::ZERO,
            },
        }
    }

    /// Record a file rejected before processing.
    pub fn record_skip(&mut self, path: &Path, reason: SkipReason) {
        *self.report.skipped.entry(reason).or_default() += 1;
        if reason.is_type_skip() {
            self.report.files_skipped_by_type += 1;
        }
        if reason == SkipReason::Ignored {
            return;
        }
        if let Some(ext) = extension_of(path) {
            self.report.skipped_extensions.insert(ext.to_string());
        }
    }

    /// Record a processed file.
    pub fn record_result(&mut self, result: FileResult) {
        if let Some(error) = &result.error {
            self.record_skip(&result.path, error.skip_reason());
            self.report.errors.push(error.clone());
            return;
        }

        self.report.files_scanned += 1;
        self.report.bytes_scanned += result.size;
        if result.has_matches() {
            self.report.total_emoji += result.count as u64;
            self.report.files.push(result);
        }
    }

    /// Mark the scan as cancelled.
    pub fn mark_interrupted(&mut self) {
        self.report.interrupted = true;
    }

    /// Files with matches so far.
    pub fn files_with_emoji(&self) -> usize {
        self.report.files.len()
    }

    /// Emoji found so far.
    pub fn emoji_found(&self) -> u64 {
        self.report.total_emoji
    }

    /// Finalize the report.
    pub fn finish(mut self, duration: Duration) -> ScanReport {
        self.report.files.sort_by(|a, b| a.path.cmp(&b.path));
        self.report.errors.sort_by(|a, b| a.path().cmp(b.path()));
        self.report.duration = duration;
        self.report
    }
}

/// What happened to one file during commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommitStatus {
    /// Emoji were removed and the file rewritten.
    Cleaned { removed: usize },
    /// The file no longer contained emoji; nothing was written.
    AlreadyClean,
    /// The file could not be committed.
    Failed(FileError),
}

/// Commit status for one path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitOutcome {
    /// File that was committed.
    pub path: PathBuf,
    /// Result of the commit.
    pub status: CommitStatus,
}

/// Aggregated result of a commit pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitReport {
    /// Per-file outcomes, in report order.
    pub outcomes: Vec<CommitOutcome>,
    /// Files rewritten.
    pub files_cleaned: usize,
    /// Emoji removed across all files.
    pub emoji_removed: usize,
    /// Files that had nothing left to remove.
    pub already_clean: usize,
    /// Files that failed.
    pub failed: usize,
}

impl CommitReport {
    /// Create an empty commit report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome for one file.
    pub fn push(&mut self, outcome: CommitOutcome) {
        match &outcome.status {
            CommitStatus::Cleaned { removed } => {
                self.files_cleaned += 1;
                self.emoji_removed += removed;
            }
            CommitStatus::AlreadyClean => self.already_clean += 1,
            CommitStatus::Failed(_) => self.failed += 1,
        }
        self.outcomes.push(outcome);
    }

    /// Errors of the failed files.
    pub fn errors(&self) -> impl Iterator<Item = &FileError> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            CommitStatus::Failed(err) => Some(err),
            _ => None,
        })
    }

    /// Check if every file was committed.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Get a human-readable summary of the commit.
    pub fn summary(&self) -> String {
        if self.failed == 0 {
            format!(
                "Cleaned {} files, removed {} emoji",
                self.files_cleaned, self.emoji_removed
            )
        } else {
            format!(
                "Cleaned {} files, removed {} emoji, {} failed",
                self.files_cleaned, self.emoji_removed, self.failed
            )
        }
    }
}
