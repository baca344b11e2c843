//! Configuration
//!
//! Layered settings for the `docfs` tool: serde defaults, then an optional
//! TOML file, then `DOCFS__SECTION__KEY` environment variables.

pub mod facade;
pub mod merge;
pub mod sources;

pub use facade::ConfigLoader;

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::transfer::ArchiveOptions;
use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocfsConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub transfer: TransferConfig,
}

impl DocfsConfig {
    pub fn validate(&self) -> Result<(), ApiError> {
        self.transfer.validate()
    }
}

/// Archive settings applied by `zip`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Store entries uncompressed
    #[serde(default)]
    pub store_only: bool,

    /// Deflate level 0-9; unset means the library default
    #[serde(default)]
    pub compression_level: Option<i64>,
}

impl TransferConfig {
    pub fn validate(&self) -> Result<(), ApiError> {
        match self.compression_level {
            Some(level) if !(0..=9).contains(&level) => Err(ApiError::ConfigError(format!(
                "Invalid compression level: {} (must be 0-9)",
                level
            ))),
            _ => Ok(()),
        }
    }
}

impl From<&TransferConfig> for ArchiveOptions {
    fn from(config: &TransferConfig) -> Self {
        ArchiveOptions {
            store_only: config.store_only,
            compression_level: config.compression_level,
        }
    }
}
