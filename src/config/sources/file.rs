//! TOML file sources.

use config::builder::DefaultState;
use config::{ConfigBuilder, File, FileFormat};
use std::path::{Path, PathBuf};

/// Global config location (`<config dir>/docfs/config.toml` on Linux).
pub fn global_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "docfs", "docfs")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Add the global file if one exists.
pub fn add_global(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    match global_path() {
        Some(path) => builder.add_source(
            File::from(path)
                .format(FileFormat::Toml)
                .required(false),
        ),
        None => builder,
    }
}

/// Add an explicitly requested file; missing files are an error.
pub fn add_explicit(builder: ConfigBuilder<DefaultState>, path: &Path) -> ConfigBuilder<DefaultState> {
    builder.add_source(File::from(path).format(FileFormat::Toml).required(true))
}
