//! Error types
//!
//! Provider failures are swallowed by lookups and surfaced as misses; transfer
//! failures are carried inside `TransferOutcome::Failed`.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure reported by a storage provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("document not found: {0}")]
    NotFound(String),

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("is a directory: {0}")]
    IsADirectory(String),

    #[error("invalid document name: {0:?}")]
    InvalidName(String),

    #[error("invalid open mode: {0}")]
    InvalidMode(String),

    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("operation not supported by provider: {0}")]
    Unsupported(&'static str),

    #[error("I/O error on {handle}: {source}")]
    Io {
        handle: String,
        #[source]
        source: io::Error,
    },
}

impl ProviderError {
    pub(crate) fn io(handle: impl ToString, source: io::Error) -> Self {
        ProviderError::Io {
            handle: handle.to_string(),
            source,
        }
    }
}

/// Reason a transfer ended in `TransferOutcome::Failed`.
#[derive(Debug, Error)]
pub enum TransferError {
    /// An archive entry would land outside the destination root.
    #[error("archive entry attempted path traversal: {entry}")]
    PathTraversal { entry: String },

    #[error("type mismatch at {}: expected {expected}", .path.display())]
    TypeMismatch { path: PathBuf, expected: &'static str },

    #[error("source not found: {path}")]
    NotFound { path: String },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TransferError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        TransferError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors surfaced by the command-line layer, configuration and logging.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error("path not found: {0}")]
    PathNotFound(String),

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("archive {} would be written inside {}", .output.display(), .source_dir.display())]
    OutputInsideSource { output: PathBuf, source_dir: PathBuf },

    #[error("transfer cancelled")]
    Cancelled,

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
