//! MergeService: orchestrates sources and deserializes to DocfsConfig.

use crate::config::sources::file;
use crate::config::DocfsConfig;
use config::{Config, Environment};
use std::path::Path;

/// Merge service for config composition.
pub struct MergeService;

impl MergeService {
    /// Precedence: serde defaults (lowest) -> file -> environment (highest).
    pub fn load(path: Option<&Path>, environment: Environment) -> Result<DocfsConfig, config::ConfigError> {
        let builder = Config::builder();
        let builder = match path {
            Some(path) => file::add_explicit(builder, path),
            None => file::add_global(builder),
        };
        let config = builder.add_source(environment).build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::Map;
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix("DOCFS")
            .separator("__")
            .try_parsing(true)
            .source(Some(map))
    }

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_file_values_load() {
        let file = write_config(
            "[transfer]\nstore_only = true\ncompression_level = 4\n\n[logging]\nlevel = \"debug\"\n",
        );
        let config = MergeService::load(Some(file.path()), env(&[])).unwrap();
        assert!(config.transfer.store_only);
        assert_eq!(config.transfer.compression_level, Some(4));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "text");
    }

    #[test]
    fn test_environment_overrides_file() {
        let file = write_config("[transfer]\nstore_only = false\n");
        let config = MergeService::load(
            Some(file.path()),
            env(&[
                ("DOCFS__TRANSFER__STORE_ONLY", "true"),
                ("DOCFS__TRANSFER__COMPRESSION_LEVEL", "1"),
            ]),
        )
        .unwrap();
        assert!(config.transfer.store_only);
        assert_eq!(config.transfer.compression_level, Some(1));
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let temp = tempfile::tempdir().unwrap();
        let missing = temp.path().join("nope.toml");
        assert!(MergeService::load(Some(&missing), env(&[])).is_err());
    }
}
