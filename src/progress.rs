//! Terminal progress bars for the scan and commit phases.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Minimum number of files before a bar is drawn.
const MIN_FILES_FOR_PROGRESS: usize = 10;

const SCAN_TEMPLATE: &str =
    "Scanning {bar:40} {pos:>5}/{len:5} files ({percent:>3}%) {msg} [{elapsed_precise}]";
const COMMIT_TEMPLATE: &str =
    "Cleaning {bar:40} {pos:>5}/{len:5} files ({percent:>3}%) [{elapsed_precise}]";

/// Progress bar drawn on stderr, or nothing when output is not interactive.
pub struct ProgressDisplay {
    bar: Option<ProgressBar>,
}

impl ProgressDisplay {
    /// Bar for the scan phase. The length is set once the walk is done.
    pub fn scan(enabled: bool) -> Self {
        Self::with_template(enabled, SCAN_TEMPLATE)
    }

    /// Bar for the commit phase.
    pub fn commit(enabled: bool) -> Self {
        Self::with_template(enabled, COMMIT_TEMPLATE)
    }

    fn with_template(enabled: bool, template: &str) -> Self {
        let bar = enabled.then(|| {
            let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr());
            if let Ok(style) = ProgressStyle::with_template(template) {
                bar.set_style(style.progress_chars("⣿⣀ "));
            }
            bar
        });
        Self { bar }
    }

    /// Move the bar to `completed` of `total`.
    pub fn update(&self, completed: usize, total: usize, message: String) {
        let Some(bar) = &self.bar else {
            return;
        };
        if !should_show_progress(total) {
            return;
        }
        bar.set_length(total as u64);
        bar.set_position(completed as u64);
        bar.set_message(message);
    }

    /// Finish and clear the bar.
    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

fn should_show_progress(total: usize) -> bool {
    total >= MIN_FILES_FOR_PROGRESS
}
