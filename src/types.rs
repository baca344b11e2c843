//! Core types shared by the provider, tree, and transfer layers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ProviderError;

/// Mime type providers report for directories.
pub const DIRECTORY_MIME_TYPE: &str = "vnd.android.document/directory";

/// Fallback mime type for documents without a better match.
pub const APPLICATION_OCTET_STREAM: &str = "application/octet-stream";

pub const TEXT_PLAIN: &str = "text/plain";

/// Opaque reference to a provider document. Not a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle(String);

impl Handle {
    pub fn new(raw: impl Into<String>) -> Self {
        Handle(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Handle {
    fn from(raw: &str) -> Self {
        Handle(raw.to_string())
    }
}

impl From<String> for Handle {
    fn from(raw: String) -> Self {
        Handle(raw)
    }
}

/// How a document is opened for I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    WriteTruncate,
    WriteAppend,
    ReadWrite,
}

impl OpenMode {
    pub fn is_write(self) -> bool {
        !matches!(self, OpenMode::Read)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OpenMode::Read => "r",
            OpenMode::WriteTruncate => "wt",
            OpenMode::WriteAppend => "wa",
            OpenMode::ReadWrite => "rw",
        }
    }
}

impl FromStr for OpenMode {
    type Err = ProviderError;

    /// Parses the mode strings native callers pass across the boundary.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "r" => Ok(OpenMode::Read),
            "w" | "wt" => Ok(OpenMode::WriteTruncate),
            "wa" => Ok(OpenMode::WriteAppend),
            "rw" | "rwt" => Ok(OpenMode::ReadWrite),
            other => Err(ProviderError::InvalidMode(other.to_string())),
        }
    }
}

/// Mime type a new document named `name` is created with.
pub fn mime_for_name(name: &str) -> &'static str {
    if name.ends_with(".txt") {
        TEXT_PLAIN
    } else {
        APPLICATION_OCTET_STREAM
    }
}
