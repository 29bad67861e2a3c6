//! JWalk-based directory scanner with a rayon worker pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use jwalk::{Parallelism, WalkDir};
use rayon::prelude::*;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use noemoji_core::{
    ConfigError, FileError, FileResult, FileTask, ReportBuilder, ScanConfig, ScanError,
    ScanReport,
};
use noemoji_detect::{EmojiClassifier, FileFilter, GitignoreRules, IgnoreRules, StreamRewriter};

use crate::progress::ScanProgress;

/// Walks a directory, filters its files and finds emoji in the survivors.
pub struct Scanner {
    config: ScanConfig,
    classifier: Arc<dyn EmojiClassifier>,
    rewriter: StreamRewriter,
    ignore_rules: Option<Arc<dyn IgnoreRules>>,
    progress_tx: broadcast::Sender<ScanProgress>,
    cancel: CancellationToken,
}

impl Scanner {
    /// Create a new scanner.
    pub fn new(config: ScanConfig, classifier: Arc<dyn EmojiClassifier>) -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self {
            rewriter: StreamRewriter::from_config(&config),
            config,
            classifier,
            ignore_rules: None,
            progress_tx,
            cancel: CancellationToken::new(),
        }
    }

    /// Use `rules` instead of the `.gitignore` / `.noemojiignore` files.
    pub fn with_ignore_rules(mut self, rules: Arc<dyn IgnoreRules>) -> Self {
        self.ignore_rules = Some(rules);
        self
    }

    /// Configuration this scanner runs with.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Subscribe to scan progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Token that stops the scan between files when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Perform a scan.
    pub fn scan(&self) -> Result<ScanReport, ScanError> {
        self.scan_with(|_| {})
    }

    /// Perform a scan, calling `on_progress` after every completed file.
    pub fn scan_with<F>(&self, mut on_progress: F) -> Result<ScanReport, ScanError>
    where
        F: FnMut(&ScanProgress),
    {
        let start = Instant::now();
        self.check_root()?;

        let root = &self.config.root;
        let filter = self.build_filter();
        let mut builder = ReportBuilder::new(root, self.classifier.name());

        let tasks = self.collect_tasks(&filter, &mut builder);
        let walk_cancelled = self.cancel.is_cancelled();
        let total = tasks.len();
        info!(root = %root.display(), files = total, "walk complete");

        let mut completed = 0usize;
        {
            let mut complete = |result: FileResult| {
                completed += 1;
                if let Some(ref err) = result.error {
                    warn!(error = %err, "skipping file");
                } else if result.has_matches() {
                    debug!(path = %result.path.display(), count = result.count, "found emoji");
                }

                let current_path = result.path.clone();
                builder.record_result(result);

                let progress = ScanProgress {
                    completed,
                    total,
                    current_path,
                    emoji_found: builder.emoji_found(),
                    files_with_emoji: builder.files_with_emoji(),
                    elapsed: start.elapsed(),
                };
                on_progress(&progress);
                let _ = self.progress_tx.send(progress);
            };

            if self.config.parallel && total > 1 {
                self.dispatch_parallel(&tasks, &mut complete)?;
            } else {
                self.dispatch_sequential(&tasks, &mut complete);
            }
        }

        if walk_cancelled || completed < total {
            warn!(completed, total, "scan cancelled");
            builder.mark_interrupted();
        }

        let report = builder.finish(start.elapsed());
        info!(
            scanned = report.files_scanned,
            with_emoji = report.files.len(),
            emoji = report.total_emoji,
            skipped = report.total_skipped(),
            "scan complete"
        );
        Ok(report)
    }

    fn check_root(&self) -> Result<(), ConfigError> {
        self.config.validate()?;

        let root = &self.config.root;
        if !root.exists() {
            return Err(ConfigError::RootNotFound { path: root.clone() });
        }
        if !root.is_dir() {
            return Err(ConfigError::NotADirectory { path: root.clone() });
        }
        Ok(())
    }

    fn build_filter(&self) -> FileFilter {
        let filter = FileFilter::new(&self.config);
        match (&self.ignore_rules, self.config.respect_ignore) {
            (Some(rules), _) => filter.with_ignore(Arc::clone(rules)),
            (None, true) => filter.with_ignore(Arc::new(GitignoreRules::load(&self.config.root))),
            (None, false) => filter,
        }
    }

    /// Walk the root and turn every accepted file into a task.
    ///
    /// Stops early, keeping the tasks found so far, once cancelled.
    fn collect_tasks(&self, filter: &FileFilter, builder: &mut ReportBuilder) -> Vec<FileTask> {
        let parallelism = match (self.config.parallel, self.config.threads) {
            (false, _) => Parallelism::Serial,
            (true, 0) => Parallelism::RayonDefaultPool {
                busy_timeout: Duration::from_millis(100),
            },
            (true, n) => Parallelism::RayonNewPool(n),
        };

        let walker = WalkDir::new(&self.config.root)
            .parallelism(parallelism)
            .sort(true)
            .skip_hidden(!self.config.include_hidden)
            .follow_links(self.config.follow_symlinks);

        let mut tasks = Vec::new();
        for entry_result in walker {
            if self.cancel.is_cancelled() {
                debug!(found = tasks.len(), "walk cancelled");
                break;
            }
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    record_walk_error(builder, path, err.to_string());
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if let Err(reason) = filter.evaluate(&path) {
                debug!(path = %path.display(), %reason, "skipped");
                builder.record_skip(&path, reason);
                continue;
            }

            match entry.metadata() {
                Ok(metadata) => tasks.push(FileTask::new(path, metadata.len(), true)),
                Err(err) => record_walk_error(builder, path, err.to_string()),
            }
        }

        tasks
    }

    fn dispatch_sequential(&self, tasks: &[FileTask], complete: &mut impl FnMut(FileResult)) {
        for task in tasks {
            if self.cancel.is_cancelled() {
                break;
            }
            complete(self.rewriter.process(task, self.classifier.as_ref()));
        }
    }

    /// Process tasks on a worker pool.
    ///
    /// Workers only send results back; `complete` runs on the calling thread.
    fn dispatch_parallel(
        &self,
        tasks: &[FileTask],
        complete: &mut impl FnMut(FileResult),
    ) -> Result<(), ScanError> {
        let threads = self.config.effective_threads();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("noemoji-worker-{i}"))
            .build()
            .map_err(|e| ScanError::WorkerPool {
                message: e.to_string(),
            })?;
        debug!(threads, "started worker pool");

        let (tx, mut rx) = mpsc::unbounded_channel();
        let rewriter = self.rewriter;
        let classifier = self.classifier.as_ref();
        let cancel = &self.cancel;

        std::thread::scope(|scope| {
            scope.spawn(move || {
                pool.install(|| {
                    tasks.par_iter().for_each_with(tx, |tx, task| {
                        if cancel.is_cancelled() {
                            return;
                        }
                        let _ = tx.send(rewriter.process(task, classifier));
                    });
                });
            });

            while let Some(result) = rx.blocking_recv() {
                complete(result);
            }
        });

        Ok(())
    }
}

fn record_walk_error(builder: &mut ReportBuilder, path: PathBuf, message: String) {
    warn!(path = %path.display(), %message, "cannot read entry");
    let error = FileError::Read {
        path: path.clone(),
        message,
    };
    builder.record_result(FileResult::failed(path, 0, error));
}

#[cfg(test)]
mod tests {
    use super::*;
    use noemoji_core::SkipReason;
    use noemoji_detect::PatternClassifier;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        fs::create_dir(root.join("docs")).unwrap();
        fs::write(root.join("README.md"), "Hello \u{1F600} World \u{2B50}!").unwrap();
        fs::write(root.join("docs/guide.txt"), "Step one \u{2705}\n").unwrap();
        fs::write(root.join("docs/plain.txt"), "nothing to see\n").unwrap();
        fs::write(root.join("logo.png"), "\u{1F600}").unwrap();

        dir
    }

    fn scanner(config: ScanConfig) -> Scanner {
        Scanner::new(config, Arc::new(PatternClassifier::new()))
    }

    #[test]
    fn test_basic_scan() {
        let dir = create_test_tree();
        let report = scanner(ScanConfig::new(dir.path())).scan().unwrap();

        assert_eq!(report.files_scanned, 3);
        assert_eq!(report.files.len(), 2);
        assert_eq!(report.total_emoji, 3);
        assert_eq!(report.skipped_for(SkipReason::DefaultSkipped), 1);
        assert!(report.skipped_extensions.contains("png"));
        assert_eq!(report.classifier, "pattern");
        assert!(!report.interrupted);
    }

    #[test]
    fn test_results_sorted_by_path() {
        let dir = create_test_tree();
        let report = scanner(ScanConfig::new(dir.path())).scan().unwrap();

        let paths: Vec<_> = report.files.iter().map(|f| f.path.clone()).collect();
        let mut sorted = paths.clone();
        sorted.sort();
        assert_eq!(paths, sorted);
    }

    #[test]
    fn test_conflicting_filters_fail_before_walk() {
        let mut config = ScanConfig::new("/definitely/not/here");
        config.whitelist = vec!["md".into()];
        config.blacklist = vec!["txt".into()];

        let err = scanner(config).scan().unwrap_err();
        assert!(matches!(err, ScanError::Config(ConfigError::ConflictingFilters)));
    }

    #[test]
    fn test_missing_root() {
        let dir = TempDir::new().unwrap();
        let err = scanner(ScanConfig::new(dir.path().join("missing")))
            .scan()
            .unwrap_err();
        assert!(matches!(err, ScanError::Config(ConfigError::RootNotFound { .. })));
    }

    #[test]
    fn test_root_is_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();

        let err = scanner(ScanConfig::new(&file)).scan().unwrap_err();
        assert!(matches!(err, ScanError::Config(ConfigError::NotADirectory { .. })));
    }

    #[test]
    fn test_cancelled_scan_is_interrupted() {
        let dir = create_test_tree();
        let mut config = ScanConfig::new(dir.path());
        config.parallel = false;

        let scanner = scanner(config);
        scanner.cancellation_token().cancel();
        let report = scanner.scan().unwrap();

        assert!(report.interrupted);
        assert_eq!(report.files_scanned, 0);
    }

    #[test]
    fn test_cancelled_walk_stops_before_filtering() {
        let dir = create_test_tree();
        let scanner = scanner(ScanConfig::new(dir.path()));
        scanner.cancellation_token().cancel();

        let filter = scanner.build_filter();
        let mut builder = ReportBuilder::new(dir.path(), "pattern");
        let tasks = scanner.collect_tasks(&filter, &mut builder);
        assert!(tasks.is_empty());

        let report = scanner.scan().unwrap();
        assert!(report.interrupted);
        assert_eq!(report.total_skipped(), 0);
        assert!(report.skipped_extensions.is_empty());
    }

    #[test]
    fn test_cancel_during_scan_marks_interrupted() {
        let dir = create_test_tree();
        let mut config = ScanConfig::new(dir.path());
        config.parallel = false;

        let scanner = scanner(config);
        let token = scanner.cancellation_token();
        let report = scanner.scan_with(|_| token.cancel()).unwrap();

        assert!(report.interrupted);
        assert_eq!(report.files_scanned, 1);
    }

    #[test]
    fn test_progress_callback_sees_every_file() {
        let dir = create_test_tree();
        let mut seen = Vec::new();
        let report = scanner(ScanConfig::new(dir.path()))
            .scan_with(|p| seen.push((p.completed, p.total)))
            .unwrap();

        assert_eq!(seen.len() as u64, report.files_scanned);
        assert_eq!(seen.last(), Some(&(3, 3)));
    }
}
