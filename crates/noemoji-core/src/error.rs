//! Error types for scanning and committing.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::report::SkipReason;

/// Configuration problems detected before any file is touched.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Whitelist and blacklist were both given.
    #[error("Extension whitelist and blacklist cannot be used together")]
    ConflictingFilters,

    /// Root path does not exist.
    #[error("Target directory not found: {path}")]
    RootNotFound { path: PathBuf },

    /// Root path is not a directory.
    #[error("Target is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Any other invalid setting.
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

/// Errors fatal to a whole scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The worker pool could not be started.
    #[error("Failed to start worker pool: {message}")]
    WorkerPool { message: String },
}

/// A failure confined to a single file.
///
/// These are captured into that file's result and never abort the
/// surrounding scan or commit.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum FileError {
    /// Content is not text in any supported encoding.
    #[error("Cannot decode {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },

    /// The file could not be read.
    #[error("Cannot read {}: {message}", path.display())]
    Read { path: PathBuf, message: String },

    /// The cleaned content could not be written.
    #[error("Cannot write {}: {message}", path.display())]
    Write { path: PathBuf, message: String },

    /// The file changed between scan and commit.
    #[error("{} changed since it was scanned", path.display())]
    Stale { path: PathBuf },
}

impl FileError {
    /// Create a decode error.
    pub fn decode(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a read error from an I/O error.
    pub fn read(path: impl Into<PathBuf>, source: &std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            message: io_message(source),
        }
    }

    /// Create a write error from an I/O error.
    pub fn write(path: impl Into<PathBuf>, source: &std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            message: io_message(source),
        }
    }

    /// Create a stale-result error.
    pub fn stale(path: impl Into<PathBuf>) -> Self {
        Self::Stale { path: path.into() }
    }

    /// Path the error refers to.
    pub fn path(&self) -> &Path {
        match self {
            Self::Decode { path, .. }
            | Self::Read { path, .. }
            | Self::Write { path, .. }
            | Self::Stale { path } => path,
        }
    }

    /// Report category for a file that failed during scanning.
    pub fn skip_reason(&self) -> SkipReason {
        match self {
            Self::Decode { .. } => SkipReason::DecodeFailed,
            _ => SkipReason::ReadFailed,
        }
    }
}

fn io_message(source: &std::io::Error) -> String {
    match source.kind() {
        std::io::ErrorKind::PermissionDenied => "permission denied".to_string(),
        std::io::ErrorKind::NotFound => "not found".to_string(),
        _ => source.to_string(),
    }
}
