//! Ignore-rule predicates.

use std::path::{Component, Path};

use ignore::gitignore::{Gitignore, GitignoreBuilder};

/// Decides whether a path is excluded by ignore rules.
pub trait IgnoreRules: Send + Sync {
    /// Check if `path` is ignored.
    fn is_ignored(&self, path: &Path) -> bool;
}

impl<F> IgnoreRules for F
where
    F: Fn(&Path) -> bool + Send + Sync,
{
    fn is_ignored(&self, path: &Path) -> bool {
        self(path)
    }
}

/// Ignore rules read from `.gitignore` and `.noemojiignore` at the scan root.
///
/// Anything inside a `.git` directory is always ignored.
#[derive(Debug, Default)]
pub struct GitignoreRules {
    gitignore: Option<Gitignore>,
}

impl GitignoreRules {
    /// Load the ignore files found directly under `root`.
    pub fn load(root: &Path) -> Self {
        let mut builder = GitignoreBuilder::new(root);
        let mut has_patterns = false;

        for name in [".gitignore", ".noemojiignore"] {
            let file = root.join(name);
            if !file.is_file() {
                continue;
            }
            match builder.add(&file) {
                None => has_patterns = true,
                Some(err) => tracing::warn!("Ignoring malformed {}: {err}", file.display()),
            }
        }

        let gitignore = if has_patterns {
            builder
                .build()
                .inspect_err(|err| tracing::warn!("Failed to build ignore rules: {err}"))
                .ok()
        } else {
            None
        };

        Self { gitignore }
    }

    /// Whether any ignore file was loaded.
    pub fn has_patterns(&self) -> bool {
        self.gitignore.is_some()
    }
}

impl IgnoreRules for GitignoreRules {
    fn is_ignored(&self, path: &Path) -> bool {
        if is_vcs_path(path) {
            return true;
        }

        match self.gitignore {
            Some(ref gitignore) => {
                // paths outside the root cannot be matched
                if !path.starts_with(gitignore.path()) {
                    return false;
                }
                gitignore
                    .matched_path_or_any_parents(path, path.is_dir())
                    .is_ignore()
            }
            None => false,
        }
    }
}

fn is_vcs_path(path: &Path) -> bool {
    path.components()
        .any(|c| matches!(c, Component::Normal(name) if name == ".git"))
}
