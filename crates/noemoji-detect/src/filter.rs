//! File eligibility checks.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use noemoji_core::{ScanConfig, SkipReason, normalize_extension};

use crate::ignore_rules::IgnoreRules;

/// Share of invalid UTF-8 in the sniff window above which a file counts as
/// binary, in percent.
const MAX_INVALID_PERCENT: usize = 30;

/// Decides whether a file should be scanned.
///
/// Checks run in order: ignore rules, whitelist, blacklist, default-skipped
/// extensions, then a sniff of the leading bytes. There is no size limit;
/// large files are streamed instead.
pub struct FileFilter {
    whitelist: HashSet<String>,
    blacklist: HashSet<String>,
    default_skip: HashSet<String>,
    sniff_bytes: usize,
    ignore: Option<Arc<dyn IgnoreRules>>,
}

impl FileFilter {
    /// Build a filter from the extension lists in `config`.
    pub fn new(config: &ScanConfig) -> Self {
        let normalize = |list: &[String]| -> HashSet<String> {
            list.iter()
                .map(|ext| normalize_extension(ext))
                .filter(|ext| !ext.is_empty())
                .collect()
        };

        Self {
            whitelist: normalize(&config.whitelist),
            blacklist: normalize(&config.blacklist),
            default_skip: normalize(&config.default_skip),
            sniff_bytes: config.sniff_bytes,
            ignore: None,
        }
    }

    /// Consult `rules` before any other check.
    pub fn with_ignore(mut self, rules: Arc<dyn IgnoreRules>) -> Self {
        self.ignore = Some(rules);
        self
    }

    /// Check if a file should be scanned.
    pub fn is_eligible(&self, path: &Path) -> bool {
        self.evaluate(path).is_ok()
    }

    /// Check a file, returning why it was rejected.
    pub fn evaluate(&self, path: &Path) -> Result<(), SkipReason> {
        if let Some(ref rules) = self.ignore {
            if rules.is_ignored(path) {
                return Err(SkipReason::Ignored);
            }
        }

        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase());
        self.check_extension(extension.as_deref())?;

        self.sniff(path)
    }

    /// Apply the whitelist, blacklist and default-skip rules to an extension.
    pub fn check_extension(&self, extension: Option<&str>) -> Result<(), SkipReason> {
        if !self.whitelist.is_empty() {
            return match extension {
                Some(ext) if self.whitelist.contains(ext) => Ok(()),
                _ => Err(SkipReason::NotWhitelisted),
            };
        }

        let Some(ext) = extension else {
            return Ok(());
        };
        if self.blacklist.contains(ext) {
            return Err(SkipReason::Blacklisted);
        }
        if self.default_skip.contains(ext) {
            return Err(SkipReason::DefaultSkipped);
        }
        Ok(())
    }

    fn sniff(&self, path: &Path) -> Result<(), SkipReason> {
        let file = File::open(path).map_err(|_| SkipReason::ReadFailed)?;
        let mut window = Vec::with_capacity(self.sniff_bytes);
        file.take(self.sniff_bytes as u64)
            .read_to_end(&mut window)
            .map_err(|_| SkipReason::ReadFailed)?;

        if looks_binary(&window) {
            Err(SkipReason::Binary)
        } else {
            Ok(())
        }
    }
}

/// Heuristic binary check on a leading window of file content.
///
/// A NUL byte, or too large a share of invalid UTF-8, marks the content as
/// binary. An incomplete sequence at the very end of the window is allowed,
/// since the window may cut a character in half.
pub fn looks_binary(window: &[u8]) -> bool {
    if window.contains(&0) {
        return true;
    }

    let mut invalid = 0;
    let mut seen = 0;
    for chunk in window.utf8_chunks() {
        seen += chunk.valid().len() + chunk.invalid().len();
        let truncated_tail = seen == window.len() && chunk.invalid().len() < 4;
        if !truncated_tail {
            invalid += chunk.invalid().len();
        }
    }

    invalid * 100 > window.len() * MAX_INVALID_PERCENT
}
