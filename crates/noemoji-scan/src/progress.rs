//! Scan progress reporting.

use std::path::PathBuf;
use std::time::Duration;

/// Progress information during a scan.
///
/// Sent after every completed file, whether files are processed
/// sequentially or on the worker pool.
#[derive(Debug, Clone)]
pub struct ScanProgress {
    /// Number of files processed so far.
    pub completed: usize,
    /// Number of files that passed the filter.
    pub total: usize,
    /// Most recently completed file.
    pub current_path: PathBuf,
    /// Emoji found so far.
    pub emoji_found: u64,
    /// Files with at least one emoji so far.
    pub files_with_emoji: usize,
    /// Time elapsed since the scan started.
    pub elapsed: Duration,
}

impl ScanProgress {
    /// Create initial progress state for `total` files.
    pub fn new(total: usize) -> Self {
        Self {
            completed: 0,
            total,
            current_path: PathBuf::new(),
            emoji_found: 0,
            files_with_emoji: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Completed share in `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }

    /// Calculate processing rate in files per second.
    pub fn files_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.completed as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Whether every file has been processed.
    pub fn is_complete(&self) -> bool {
        self.completed >= self.total
    }
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction_and_rate() {
        let mut progress = ScanProgress::new(4);
        assert_eq!(progress.fraction(), 0.0);
        assert_eq!(progress.files_per_second(), 0.0);

        progress.completed = 2;
        progress.elapsed = Duration::from_secs(1);
        assert_eq!(progress.fraction(), 0.5);
        assert_eq!(progress.files_per_second(), 2.0);
        assert!(!progress.is_complete());

        assert!(ScanProgress::default().is_complete());
    }
}
