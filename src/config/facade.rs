//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::sources::environment;
use super::DocfsConfig;
use crate::error::ApiError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the global file (if any) and environment.
    /// An explicit `path` replaces the global file and must exist.
    pub fn load(path: Option<&Path>) -> Result<DocfsConfig, ApiError> {
        let config = MergeService::load(path, environment::source())?;
        config.validate()?;
        Ok(config)
    }

    /// Create default configuration.
    pub fn default() -> DocfsConfig {
        DocfsConfig::default()
    }
}
