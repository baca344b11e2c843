//! Zip compression of a local directory tree.

use super::progress::{ProgressTracker, TransferOutcome};
use crate::error::TransferError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, Seek, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Entries at or above this size need zip64 headers.
const LARGE_FILE_THRESHOLD: u64 = u32::MAX as u64;

/// Options applied to every entry of one archive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveOptions {
    /// Store entries without deflation, trading size for speed.
    #[serde(default)]
    pub store_only: bool,
    /// Deflate level; `None` uses the library default.
    #[serde(default)]
    pub compression_level: Option<i64>,
}

impl ArchiveOptions {
    pub fn store_only() -> Self {
        Self {
            store_only: true,
            compression_level: None,
        }
    }

    fn entry_options(&self, size: u64) -> SimpleFileOptions {
        let options = if self.store_only {
            SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
        } else {
            SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .compression_level(self.compression_level)
        };
        options.large_file(size >= LARGE_FILE_THRESHOLD)
    }
}

/// Zip every file below `source` into `sink`, naming entries relative to
/// `source`.
pub fn compress<W, F>(
    source: &Path,
    sink: W,
    options: ArchiveOptions,
    on_progress: F,
) -> TransferOutcome
where
    W: Write + Seek,
    F: FnMut(u64, u64) -> bool,
{
    compress_relative_to(source, source, sink, options, on_progress)
}

/// Zip every file below `source` into `sink`, naming entries relative to
/// `root` (which must contain `source`).
///
/// Only files become entries. The progress callback runs before each file;
/// when it returns `true` the compression stops and `sink` may hold an
/// unterminated archive. Partial output after a failure is left to the
/// caller as well.
pub fn compress_relative_to<W, F>(
    source: &Path,
    root: &Path,
    sink: W,
    options: ArchiveOptions,
    on_progress: F,
) -> TransferOutcome
where
    W: Write + Seek,
    F: FnMut(u64, u64) -> bool,
{
    let outcome: TransferOutcome = run_compress(source, root, sink, options, on_progress).into();
    if let Some(e) = outcome.error() {
        warn!("Compressing {} failed: {}", source.display(), e);
    }
    outcome
}

fn run_compress<W, F>(
    source: &Path,
    root: &Path,
    sink: W,
    options: ArchiveOptions,
    on_progress: F,
) -> Result<TransferOutcome, TransferError>
where
    W: Write + Seek,
    F: FnMut(u64, u64) -> bool,
{
    // A missing source is reported by the walk.
    if source.exists() && !source.is_dir() {
        return Err(TransferError::TypeMismatch {
            path: source.to_path_buf(),
            expected: "directory",
        });
    }
    let files = collect_files(source)?;
    let total = files.len() as u64;
    let mut tracker = ProgressTracker::new(total, on_progress);
    let mut writer = ZipWriter::new(sink);

    for path in files {
        if tracker.should_cancel() {
            info!(
                "Compression of {} cancelled after {} of {} files",
                source.display(),
                tracker.progress().completed,
                total
            );
            return Ok(TransferOutcome::Cancelled);
        }

        let name = entry_name(&path, root);
        let mut input = File::open(&path).map_err(|e| TransferError::io(&path, e))?;
        let size = input
            .metadata()
            .map_err(|e| TransferError::io(&path, e))?
            .len();

        writer.start_file(name.as_str(), options.entry_options(size))?;
        io::copy(&mut input, &mut writer).map_err(|e| TransferError::io(&path, e))?;
        debug!("Compressed {} as {}", path.display(), name);
        tracker.advance();
    }

    writer.finish()?;
    info!("Compressed {} files from {}", total, source.display());
    Ok(TransferOutcome::Completed)
}

/// Files below `source`, top-down in a stable order.
fn collect_files(source: &Path) -> Result<Vec<PathBuf>, TransferError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Path of `path` relative to `root`, slash separated with no leading
/// separator.
fn entry_name(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|component| match component {
            std::path::Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
