//! Commit engine for noemoji.
//!
//! This crate applies a [`ScanReport`] to disk: every file listed in the
//! report is rewritten without its emoji. Files are committed one at a time
//! in report order, and a failure on one file never stops the rest.
//!
//! The async entry point, [`start_commit`], reports progress via channels,
//! following the same pattern as the other long-running operations.
//!
//! ```rust,no_run
//! use noemoji_core::ScanConfig;
//! use noemoji_detect::default_classifier;
//! use noemoji_ops::Committer;
//! # let report: noemoji_core::ScanReport = unimplemented!();
//!
//! let committer = Committer::new(&ScanConfig::new("."), default_classifier());
//! let outcome = committer.commit(&report);
//! println!("{}", outcome.summary());
//! ```

mod commit;
mod progress;

pub use commit::{CommitEvent, Committer, start_commit};
pub use progress::CommitProgress;

// Re-export core types
pub use noemoji_core::{CommitOutcome, CommitReport, CommitStatus, FileError, ScanReport};

/// Default channel buffer size for commit progress updates.
pub const COMMIT_CHANNEL_SIZE: usize = 100;
