//! Directory scanning engine for noemoji.
//!
//! This crate walks a directory tree with jwalk, filters the files found and
//! runs emoji detection over the survivors, optionally on a rayon worker
//! pool.
//!
//! # Overview
//!
//! `noemoji-scan` is the read-only half of a cleanup. Key features:
//!
//! - **Parallel processing** on a bounded rayon pool
//! - **Progress updates** via a callback and broadcast channels
//! - **Cancellation** between files, keeping partial results
//! - **Deterministic reports** sorted by path
//!
//! # Example
//!
//! ```rust,no_run
//! use noemoji_scan::{ScanConfig, Scanner};
//! use noemoji_detect::default_classifier;
//!
//! let config = ScanConfig::new("/path/to/project");
//! let scanner = Scanner::new(config, default_classifier());
//! let report = scanner.scan().unwrap();
//!
//! println!("Files with emoji: {}", report.files.len());
//! println!("Total emoji: {}", report.total_emoji);
//! ```
//!
//! # Progress Monitoring
//!
//! Subscribe to real-time progress updates:
//!
//! ```rust,no_run
//! use noemoji_scan::{ScanConfig, Scanner};
//! use noemoji_detect::default_classifier;
//!
//! let scanner = Scanner::new(ScanConfig::new("."), default_classifier());
//! let mut progress_rx = scanner.subscribe();
//!
//! // Handle progress in a separate task
//! tokio::spawn(async move {
//!     while let Ok(progress) = progress_rx.recv().await {
//!         println!("Processed {}/{} files", progress.completed, progress.total);
//!     }
//! });
//! ```

mod progress;
mod scanner;

pub use progress::ScanProgress;
pub use scanner::Scanner;

// Re-export core types for convenience
pub use noemoji_core::{
    ConfigError, FileResult, FileTask, ScanConfig, ScanError, ScanReport, SkipReason,
};
pub use tokio_util::sync::CancellationToken;
