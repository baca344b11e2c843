//! CLI Tooling
//!
//! Command-line access to a `DocumentTree` bound to a local directory. Every
//! path argument except archive and mirror destinations is a virtual,
//! slash-delimited path below `--root`.

use crate::config::DocfsConfig;
use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::provider::LocalProvider;
use crate::transfer::{self, ArchiveOptions, TransferOutcome};
use crate::tree::{DocumentTree, NodeInfo};
use crate::types::Handle;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// docfs - browse and archive a document tree
#[derive(Parser)]
#[command(name = "docfs")]
#[command(about = "Resolve virtual paths and stream zip archives over a document tree")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory the virtual tree is bound to
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Apply the `--log-*` flags on top of the configured logging settings.
    pub fn logging_config(&self, base: &LoggingConfig) -> LoggingConfig {
        let mut config = base.clone();
        if let Some(level) = &self.log_level {
            config.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            config.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            config.file = Some(file.clone());
        }
        config
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List a directory
    Ls {
        /// Virtual directory path (default: root)
        #[arg(default_value = "")]
        path: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show what a path resolves to
    Stat {
        path: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Compress a directory into a zip archive
    Zip {
        /// Virtual directory path to compress
        source: String,
        /// Archive file to create
        output: PathBuf,
        /// Store entries without compression
        #[arg(long)]
        store: bool,
        /// Name entries relative to the source's parent so the archive keeps
        /// the directory itself
        #[arg(long)]
        include_dir: bool,
    },
    /// Extract a zip archive into a directory
    Unzip {
        /// Archive file to extract
        archive: PathBuf,
        /// Virtual destination directory (created if missing)
        #[arg(default_value = "")]
        dest: String,
    },
    /// Copy a directory and its contents out of the tree
    Mirror {
        /// Virtual directory path
        path: String,
        /// Local destination directory
        dest: PathBuf,
    },
}

/// One row of `ls` output.
#[derive(Debug, Serialize)]
pub struct ListingEntry {
    pub name: String,
    pub is_directory: bool,
    pub size: i64,
}

/// Result of `stat`.
#[derive(Debug, Serialize)]
pub struct StatReport {
    pub path: String,
    pub name: String,
    pub extension: String,
    pub parent: String,
    pub is_directory: bool,
    pub size: i64,
    pub handle: Option<Handle>,
}

/// CLI context for executing commands
pub struct CliContext {
    tree: DocumentTree,
    config: DocfsConfig,
}

impl CliContext {
    /// Bind a tree over the local directory `root`.
    pub fn new(root: &Path, config: DocfsConfig) -> Result<Self, ApiError> {
        let handle = LocalProvider::handle_for(root)?;
        let tree = DocumentTree::bound(Arc::new(LocalProvider::new()), handle);
        Ok(Self { tree, config })
    }

    pub fn tree(&self) -> &DocumentTree {
        &self.tree
    }

    /// Execute a CLI command
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Ls { path, format } => self.handle_ls(path, format),
            Commands::Stat { path, format } => self.handle_stat(path, format),
            Commands::Zip {
                source,
                output,
                store,
                include_dir,
            } => self.handle_zip(source, output, *store, *include_dir),
            Commands::Unzip { archive, dest } => self.handle_unzip(archive, dest),
            Commands::Mirror { path, dest } => self.handle_mirror(path, dest),
        }
    }

    fn handle_ls(&self, path: &str, format: &str) -> Result<String, ApiError> {
        let node = self.directory(path)?;
        let entries: Vec<ListingEntry> = self
            .tree
            .children(node.id)
            .into_iter()
            .map(|child| {
                let size = if child.is_directory {
                    0
                } else {
                    self.tree.file_size(&join_virtual(path, &child.name))
                };
                ListingEntry {
                    name: child.name,
                    is_directory: child.is_directory,
                    size,
                }
            })
            .collect();

        if format == "json" {
            return Ok(serde_json::to_string_pretty(&entries)?);
        }
        Ok(format_listing(&entries))
    }

    fn handle_stat(&self, path: &str, format: &str) -> Result<String, ApiError> {
        let node = self
            .tree
            .resolve(path)
            .ok_or_else(|| ApiError::PathNotFound(path.to_string()))?;
        let report = StatReport {
            path: path.to_string(),
            name: self.tree.filename(path),
            extension: self.tree.extension(path),
            parent: self.tree.parent_directory(path),
            is_directory: node.is_directory,
            size: self.tree.file_size(path),
            handle: node.handle,
        };

        if format == "json" {
            return Ok(serde_json::to_string_pretty(&report)?);
        }
        Ok(format_stat(&report))
    }

    fn handle_zip(
        &self,
        source: &str,
        output: &Path,
        store: bool,
        include_dir: bool,
    ) -> Result<String, ApiError> {
        let node = self.directory(source)?;
        let source_dir = local_path(&node, source)?;
        let root = if include_dir {
            source_dir.parent().unwrap_or(source_dir.as_path()).to_path_buf()
        } else {
            source_dir.clone()
        };

        let mut options = ArchiveOptions::from(&self.config.transfer);
        if store {
            options.store_only = true;
        }

        let resolved = resolve_output(output)?;
        let canonical_source = dunce::canonicalize(&source_dir)?;
        if resolved.starts_with(&canonical_source) {
            return Err(ApiError::OutputInsideSource {
                output: resolved,
                source_dir: canonical_source,
            });
        }

        let sink = File::create(output)?;
        info!("Compressing {} into {}", source_dir.display(), output.display());
        let outcome = transfer::compress_relative_to(&source_dir, &root, sink, options, log_progress);
        finish(outcome)?;
        Ok(format!("Created {}", output.display()))
    }

    fn handle_unzip(&self, archive: &Path, dest: &str) -> Result<String, ApiError> {
        let node = match self.tree.resolve(dest) {
            Some(node) => node,
            None => {
                let (parent, name) = split_virtual(dest);
                self.tree
                    .create_directory(parent, name)
                    .ok_or_else(|| ApiError::PathNotFound(dest.to_string()))?
            }
        };
        if !node.is_directory {
            return Err(ApiError::NotADirectory(dest.to_string()));
        }
        let destination = local_path(&node, dest)?;

        let outcome = transfer::extract_file(archive, &destination, log_progress);
        // Extraction writes behind the tree's back.
        self.tree.invalidate(node.id);
        finish(outcome)?;
        Ok(format!(
            "Extracted {} into {}",
            archive.display(),
            destination.display()
        ))
    }

    fn handle_mirror(&self, path: &str, dest: &Path) -> Result<String, ApiError> {
        finish(self.tree.mirror(path, dest, log_progress))?;
        Ok(format!("Mirrored {} into {}", path, dest.display()))
    }

    fn directory(&self, path: &str) -> Result<NodeInfo, ApiError> {
        let node = self
            .tree
            .resolve(path)
            .ok_or_else(|| ApiError::PathNotFound(path.to_string()))?;
        if !node.is_directory {
            return Err(ApiError::NotADirectory(path.to_string()));
        }
        Ok(node)
    }
}

fn log_progress(total: u64, completed: u64) -> bool {
    debug!("Progress {}/{}", completed, total);
    false
}

fn finish(outcome: TransferOutcome) -> Result<(), ApiError> {
    match outcome {
        TransferOutcome::Completed => Ok(()),
        TransferOutcome::Cancelled => Err(ApiError::Cancelled),
        TransferOutcome::Failed(e) => Err(e.into()),
    }
}

/// Absolute form of an archive output path, resolved through its parent
/// since the file itself may not exist yet.
fn resolve_output(output: &Path) -> Result<PathBuf, ApiError> {
    let Some(name) = output.file_name() else {
        return Ok(dunce::canonicalize(output)?);
    };
    let parent = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Ok(dunce::canonicalize(parent)?.join(name))
}

/// Local filesystem path behind a node of a `LocalProvider` tree.
fn local_path(node: &NodeInfo, path: &str) -> Result<PathBuf, ApiError> {
    node.handle
        .as_ref()
        .map(|handle| PathBuf::from(handle.as_str()))
        .ok_or_else(|| ApiError::PathNotFound(path.to_string()))
}

fn join_virtual(parent: &str, name: &str) -> String {
    let parent = parent.trim_end_matches('/');
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Split a virtual path into its parent path and last segment.
fn split_virtual(path: &str) -> (&str, &str) {
    let path = path.trim_end_matches('/');
    path.rsplit_once('/').unwrap_or(("", path))
}

fn format_listing(entries: &[ListingEntry]) -> String {
    if entries.is_empty() {
        return "(empty)".to_string();
    }
    use comfy_table::Table;
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Name", "Type", "Size"]);
    for entry in entries {
        let kind = if entry.is_directory { "dir" } else { "file" };
        let size = if entry.is_directory {
            "-".to_string()
        } else {
            entry.size.to_string()
        };
        table.add_row(vec![entry.name.as_str(), kind, size.as_str()]);
    }
    table.to_string()
}

fn format_stat(report: &StatReport) -> String {
    let mut output = String::new();
    output.push_str(&format!("Path:      {}\n", report.path));
    output.push_str(&format!("Name:      {}\n", report.name));
    output.push_str(&format!(
        "Type:      {}\n",
        if report.is_directory { "directory" } else { "file" }
    ));
    output.push_str(&format!("Size:      {}\n", report.size));
    if !report.extension.is_empty() {
        output.push_str(&format!("Extension: {}\n", report.extension));
    }
    output.push_str(&format!("Parent:    {}\n", report.parent));
    if let Some(handle) = &report.handle {
        output.push_str(&format!("Handle:    {}\n", handle));
    }
    output
}
