//! Rewriting scanned files in place.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use noemoji_core::{
    CommitOutcome, CommitReport, CommitStatus, FileError, FileResult, ScanConfig, ScanReport,
};
use noemoji_detect::{EmojiClassifier, StreamRewriter};

use crate::COMMIT_CHANNEL_SIZE;
use crate::progress::CommitProgress;

/// Result sent through the channel during an async commit.
#[derive(Debug)]
pub enum CommitEvent {
    /// Progress update.
    Progress(CommitProgress),
    /// The commit completed.
    Complete(CommitReport),
}

/// Applies the matches of a scan report to disk.
#[derive(Clone)]
pub struct Committer {
    classifier: Arc<dyn EmojiClassifier>,
    rewriter: StreamRewriter,
}

impl Committer {
    /// Create a committer using the streaming settings of `config`.
    pub fn new(config: &ScanConfig, classifier: Arc<dyn EmojiClassifier>) -> Self {
        Self {
            classifier,
            rewriter: StreamRewriter::from_config(config),
        }
    }

    /// Commit every file in the report.
    pub fn commit(&self, report: &ScanReport) -> CommitReport {
        self.commit_with(report, |_| {})
    }

    /// Commit every file in the report, calling `on_progress` before and
    /// after each file.
    pub fn commit_with<F>(&self, report: &ScanReport, mut on_progress: F) -> CommitReport
    where
        F: FnMut(&CommitProgress),
    {
        let files = pending_files(report);
        let mut progress = CommitProgress::new(files.len());
        let mut outcome = CommitReport::new();

        for file in files {
            progress.set_current_file(Some(file.path.clone()));
            on_progress(&progress);

            let status = self.commit_file(file);
            record(&mut progress, &mut outcome, &file.path, status);
            on_progress(&progress);
        }

        info!(
            cleaned = outcome.files_cleaned,
            removed = outcome.emoji_removed,
            already_clean = outcome.already_clean,
            failed = outcome.failed,
            "commit complete"
        );
        outcome
    }

    /// Rewrite one file without its emoji.
    ///
    /// The file is re-read and compared against the scan-time hash. A file
    /// that no longer has any emoji is left alone.
    pub fn commit_file(&self, result: &FileResult) -> CommitStatus {
        match self.try_commit(result) {
            Ok(status) => status,
            Err(err) => CommitStatus::Failed(err),
        }
    }

    fn try_commit(&self, result: &FileResult) -> Result<CommitStatus, FileError> {
        let path = result.path.as_path();
        let mut temp =
            NamedTempFile::new_in(parent_dir(path)).map_err(|e| FileError::write(path, &e))?;

        let outcome = {
            let mut writer = BufWriter::new(temp.as_file_mut());
            let outcome = self
                .rewriter
                .rewrite(path, self.classifier.as_ref(), &mut writer)?;
            writer.flush().map_err(|e| FileError::write(path, &e))?;
            outcome
        };

        if outcome.spans.is_empty() {
            return Ok(CommitStatus::AlreadyClean);
        }
        if result.content_hash != Some(outcome.hash) {
            return Err(FileError::stale(path));
        }

        let permissions = fs::metadata(path)
            .map_err(|e| FileError::read(path, &e))?
            .permissions();
        temp.as_file()
            .set_permissions(permissions)
            .map_err(|e| FileError::write(path, &e))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| FileError::write(path, &e))?;
        temp.persist(path)
            .map_err(|e| FileError::write(path, &e.error))?;

        Ok(CommitStatus::Cleaned {
            removed: outcome.spans.len(),
        })
    }
}

/// Start an async commit of every file in `report`.
///
/// Files are committed one at a time on the blocking pool; a progress event
/// is sent before each file and a single `Complete` event at the end.
pub fn start_commit(committer: Committer, report: ScanReport) -> mpsc::Receiver<CommitEvent> {
    let (tx, rx) = mpsc::channel(COMMIT_CHANNEL_SIZE);

    tokio::spawn(async move {
        commit_impl(committer, report, tx).await;
    });

    rx
}

/// Internal implementation of the async commit.
async fn commit_impl(committer: Committer, report: ScanReport, tx: mpsc::Sender<CommitEvent>) {
    let files: Vec<FileResult> = pending_files(&report).into_iter().cloned().collect();
    let mut progress = CommitProgress::new(files.len());
    let mut outcome = CommitReport::new();

    for file in files {
        progress.set_current_file(Some(file.path.clone()));
        let _ = tx.send(CommitEvent::Progress(progress.clone())).await;

        let path = file.path.clone();
        let worker = committer.clone();
        let status = tokio::task::spawn_blocking(move || worker.commit_file(&file))
            .await
            .unwrap_or_else(|e| {
                CommitStatus::Failed(FileError::Write {
                    path: path.clone(),
                    message: format!("Task failed: {e}"),
                })
            });

        record(&mut progress, &mut outcome, &path, status);
    }

    progress.set_current_file(None);
    let _ = tx.send(CommitEvent::Progress(progress)).await;
    let _ = tx.send(CommitEvent::Complete(outcome)).await;
}

/// Files in the report that still need a commit.
fn pending_files(report: &ScanReport) -> Vec<&FileResult> {
    report
        .files
        .iter()
        .filter(|f| f.has_matches() && !f.is_error())
        .collect()
}

fn record(
    progress: &mut CommitProgress,
    outcome: &mut CommitReport,
    path: &Path,
    status: CommitStatus,
) {
    match &status {
        CommitStatus::Cleaned { removed } => {
            debug!(path = %path.display(), removed, "cleaned file");
            progress.complete_file(*removed, false);
        }
        CommitStatus::AlreadyClean => {
            debug!(path = %path.display(), "already clean");
            progress.complete_file(0, false);
        }
        CommitStatus::Failed(err) => {
            warn!(error = %err, "commit failed");
            progress.complete_file(0, true);
        }
    }

    outcome.push(CommitOutcome {
        path: path.to_path_buf(),
        status,
    });
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
