//! Core types for noemoji.
//!
//! This crate provides the data model shared by the detection, scanning and
//! commit crates: emoji spans, per-file results, scan and commit reports,
//! the scan configuration and the error taxonomy.

mod config;
mod error;
mod report;
mod span;

pub use config::{
    DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_SNIFF_BYTES, DEFAULT_STREAMING_THRESHOLD,
    ScanConfig, ScanConfigBuilder, default_skip_extensions, normalize_extension,
};
pub use error::{ConfigError, FileError, ScanError};
pub use report::{
    CommitOutcome, CommitReport, CommitStatus, FileResult, FileTask, ReportBuilder, SAMPLE_LIMIT,
    ScanReport, SkipReason,
};
pub use span::{ContentHash, EmojiSpan, MAX_CLUSTER_BYTES};
