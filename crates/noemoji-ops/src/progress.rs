//! Progress reporting for commits.

use std::path::PathBuf;

/// Progress information for an ongoing commit.
#[derive(Debug, Clone, Default)]
pub struct CommitProgress {
    /// Number of files handled so far.
    pub files_completed: usize,
    /// Total number of files to commit.
    pub files_total: usize,
    /// Emoji removed so far.
    pub emoji_removed: usize,
    /// Files that failed so far.
    pub failed: usize,
    /// The file currently being committed.
    pub current_file: Option<PathBuf>,
}

impl CommitProgress {
    /// Create a new progress tracker.
    pub fn new(files_total: usize) -> Self {
        Self {
            files_total,
            ..Default::default()
        }
    }

    /// Get the progress as a percentage (0.0 to 100.0).
    pub fn percentage(&self) -> f64 {
        if self.files_total > 0 {
            (self.files_completed as f64 / self.files_total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Set the current file being committed.
    pub fn set_current_file(&mut self, path: Option<PathBuf>) {
        self.current_file = path;
    }

    /// Record a finished file.
    pub fn complete_file(&mut self, removed: usize, failed: bool) {
        self.files_completed += 1;
        self.emoji_removed += removed;
        if failed {
            self.failed += 1;
        }
    }
}
