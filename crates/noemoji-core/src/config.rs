//! Scan configuration types.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::span::MAX_CLUSTER_BYTES;

/// Files larger than this are processed in chunks (10 MiB).
pub const DEFAULT_STREAMING_THRESHOLD: u64 = 10 * 1024 * 1024;

/// Chunk size used when streaming (10 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 10 * 1024 * 1024;

/// Bytes held back between chunks so clusters are never split.
pub const DEFAULT_CHUNK_OVERLAP: usize = MAX_CLUSTER_BYTES;

/// Number of leading bytes inspected by the binary sniff.
pub const DEFAULT_SNIFF_BYTES: usize = 8192;

/// Configuration for a scan and the commit that follows it.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Root directory to scan.
    pub root: PathBuf,

    /// Only files with these extensions are processed.
    #[builder(default)]
    #[serde(default)]
    pub whitelist: Vec<String>,

    /// Files with these extensions are skipped.
    #[builder(default)]
    #[serde(default)]
    pub blacklist: Vec<String>,

    /// Binary and media extensions skipped unless whitelisted.
    #[builder(default = "default_skip_extensions()")]
    #[serde(default = "default_skip_extensions")]
    pub default_skip: Vec<String>,

    /// Honour `.gitignore` / `.noemojiignore` rules.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub respect_ignore: bool,

    /// Process files on a worker pool.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub parallel: bool,

    /// Number of worker threads (0 = available parallelism).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,

    /// Include hidden files (starting with .).
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub include_hidden: bool,

    /// Follow symbolic links while walking.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Files above this size are streamed in chunks.
    #[builder(default = "DEFAULT_STREAMING_THRESHOLD")]
    #[serde(default = "default_streaming_threshold")]
    pub streaming_threshold: u64,

    /// Chunk size for streaming.
    #[builder(default = "DEFAULT_CHUNK_SIZE")]
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Bytes carried over between chunks.
    #[builder(default = "DEFAULT_CHUNK_OVERLAP")]
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Leading bytes inspected by the binary sniff.
    #[builder(default = "DEFAULT_SNIFF_BYTES")]
    #[serde(default = "default_sniff_bytes")]
    pub sniff_bytes: usize,
}

fn default_true() -> bool {
    true
}

fn default_streaming_threshold() -> u64 {
    DEFAULT_STREAMING_THRESHOLD
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_chunk_overlap() -> usize {
    DEFAULT_CHUNK_OVERLAP
}

fn default_sniff_bytes() -> usize {
    DEFAULT_SNIFF_BYTES
}

/// Extensions of binary and media formats that are never scanned by default.
pub fn default_skip_extensions() -> Vec<String> {
    [
        // images
        "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "tiff", "tif", "psd", "heic",
        // audio / video
        "mp3", "wav", "flac", "ogg", "m4a", "aac", "mp4", "mkv", "avi", "mov", "webm", "wmv",
        // archives
        "zip", "tar", "gz", "tgz", "bz2", "xz", "7z", "rar", "zst", "jar", "war",
        // binaries
        "exe", "dll", "so", "dylib", "bin", "o", "a", "lib", "obj", "class", "pyc", "wasm",
        // documents and fonts
        "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "woff", "woff2", "ttf", "otf", "eot",
        // databases and disk images
        "db", "sqlite", "iso", "dmg",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Normalize a user-supplied extension: lower-case, without leading dots.
///
/// `".MD"`, `"md"` and `"..md"` all become `"md"`.
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.root {
            Some(ref root) if root.as_os_str().is_empty() => {
                return Err("Root path cannot be empty".to_string());
            }
            None => return Err("Root path is required".to_string()),
            _ => {}
        }

        let whitelisted = self.whitelist.as_ref().is_some_and(|w| !w.is_empty());
        let blacklisted = self.blacklist.as_ref().is_some_and(|b| !b.is_empty());
        if whitelisted && blacklisted {
            return Err(ConfigError::ConflictingFilters.to_string());
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a config with default settings for scanning a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            whitelist: Vec::new(),
            blacklist: Vec::new(),
            default_skip: default_skip_extensions(),
            respect_ignore: true,
            parallel: true,
            threads: 0,
            include_hidden: true,
            follow_symlinks: false,
            streaming_threshold: DEFAULT_STREAMING_THRESHOLD,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            sniff_bytes: DEFAULT_SNIFF_BYTES,
        }
    }

    /// Check the settings that do not need the filesystem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.root.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                message: "root path cannot be empty".to_string(),
            });
        }
        if !self.whitelist.is_empty() && !self.blacklist.is_empty() {
            return Err(ConfigError::ConflictingFilters);
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid {
                message: "chunk size must be greater than zero".to_string(),
            });
        }
        if self.chunk_overlap < MAX_CLUSTER_BYTES {
            return Err(ConfigError::Invalid {
                message: format!("chunk overlap must be at least {MAX_CLUSTER_BYTES} bytes"),
            });
        }
        Ok(())
    }

    /// Number of worker threads to use for the scan phase.
    pub fn effective_threads(&self) -> usize {
        if !self.parallel {
            return 1;
        }
        match self.threads {
            0 => std::thread::available_parallelism().map_or(1, |n| n.get()),
            n => n,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(".")
    }
}
