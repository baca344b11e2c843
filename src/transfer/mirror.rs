//! Copying provider documents onto local storage.

use super::extract::{contained_path, ensure_directory};
use super::progress::{ProgressTracker, TransferOutcome};
use crate::error::TransferError;
use crate::provider::contract::validate_name;
use crate::provider::StorageProvider;
use crate::tree::DocumentTree;
use crate::types::Handle;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One document found by the planning pass.
#[derive(Debug)]
struct PlannedEntry {
    handle: Handle,
    relative: PathBuf,
    is_directory: bool,
}

/// Copy the directory `source` and everything below it into `destination`.
///
/// A planning pass enumerates every provider directory once to fix the
/// total (files plus directories). Entries are then copied top-down, one
/// per progress call: directories are created and files are streamed,
/// replacing whatever file is already there. A directory landing on an
/// existing file, or the reverse, fails with `TransferError::TypeMismatch`.
/// A target that resolves outside `destination` through an existing symlink
/// fails with `TransferError::PathTraversal`.
pub fn mirror_tree<F>(
    provider: &dyn StorageProvider,
    source: &Handle,
    destination: &Path,
    on_progress: F,
) -> TransferOutcome
where
    F: FnMut(u64, u64) -> bool,
{
    let outcome: TransferOutcome = run_mirror(provider, source, destination, on_progress).into();
    if let Some(e) = outcome.error() {
        warn!("Mirroring {} into {} failed: {}", source, destination.display(), e);
    }
    outcome
}

fn run_mirror<F>(
    provider: &dyn StorageProvider,
    source: &Handle,
    destination: &Path,
    on_progress: F,
) -> Result<TransferOutcome, TransferError>
where
    F: FnMut(u64, u64) -> bool,
{
    let metadata = provider.metadata(source)?;
    if !metadata.is_directory() {
        return Err(TransferError::TypeMismatch {
            path: PathBuf::from(source.as_str()),
            expected: "directory",
        });
    }
    ensure_directory(destination)?;
    let root = dunce::canonicalize(destination).map_err(|e| TransferError::io(destination, e))?;

    let mut plan = Vec::new();
    plan_directory(provider, source, Path::new(""), &mut plan)?;
    let total = plan.len() as u64;
    let mut tracker = ProgressTracker::new(total, on_progress);

    for entry in plan {
        if tracker.should_cancel() {
            info!(
                "Mirror of {} cancelled after {} of {} entries",
                source,
                tracker.progress().completed,
                total
            );
            return Ok(TransferOutcome::Cancelled);
        }

        let relative = entry.relative.to_string_lossy();
        let target = contained_path(&root, &relative).ok_or_else(|| TransferError::PathTraversal {
            entry: relative.clone().into_owned(),
        })?;
        if entry.is_directory {
            ensure_directory(&target)?;
        } else {
            if target.is_dir() {
                return Err(TransferError::TypeMismatch {
                    path: target,
                    expected: "file",
                });
            }
            stream_to(provider, &entry.handle, &target)?;
        }
        debug!("Mirrored {}", entry.relative.display());
        tracker.advance();
    }

    info!("Mirrored {} entries into {}", total, destination.display());
    Ok(TransferOutcome::Completed)
}

/// Depth-first listing of `directory`, each directory ahead of its contents.
fn plan_directory(
    provider: &dyn StorageProvider,
    directory: &Handle,
    relative: &Path,
    plan: &mut Vec<PlannedEntry>,
) -> Result<(), TransferError> {
    for child in provider.children(directory)? {
        let name = &child.metadata.name;
        if validate_name(name).is_err() {
            return Err(TransferError::PathTraversal {
                entry: relative.join(name).to_string_lossy().into_owned(),
            });
        }
        let child_relative = relative.join(name);
        let is_directory = child.metadata.is_directory();
        plan.push(PlannedEntry {
            handle: child.handle.clone(),
            relative: child_relative.clone(),
            is_directory,
        });
        if is_directory {
            plan_directory(provider, &child.handle, &child_relative, plan)?;
        }
    }
    Ok(())
}

fn stream_to(
    provider: &dyn StorageProvider,
    handle: &Handle,
    target: &Path,
) -> Result<u64, TransferError> {
    let mut input = provider.open_read(handle)?;
    let mut out = File::create(target).map_err(|e| TransferError::io(target, e))?;
    io::copy(&mut input, &mut out).map_err(|e| TransferError::io(target, e))
}

/// Copy a single document into `destination_dir` and return the new path.
///
/// The file is named `rename` when given, otherwise after the document's
/// display name. An existing file of that name is deleted first.
pub fn copy_document(
    provider: &dyn StorageProvider,
    handle: &Handle,
    destination_dir: &Path,
    rename: Option<&str>,
) -> Result<PathBuf, TransferError> {
    let metadata = provider.metadata(handle)?;
    if metadata.is_directory() {
        return Err(TransferError::TypeMismatch {
            path: PathBuf::from(handle.as_str()),
            expected: "file",
        });
    }
    let name = rename.unwrap_or(&metadata.name);
    validate_name(name)?;

    ensure_directory(destination_dir)?;
    let target = destination_dir.join(name);
    if target.is_dir() {
        return Err(TransferError::TypeMismatch {
            path: target,
            expected: "file",
        });
    }
    if target.exists() {
        fs::remove_file(&target).map_err(|e| TransferError::io(&target, e))?;
    }

    let bytes = stream_to(provider, handle, &target)?;
    debug!("Copied {} ({} bytes) to {}", handle, bytes, target.display());
    Ok(target)
}

impl DocumentTree {
    /// Mirror the directory at `path` into `destination`.
    pub fn mirror<F>(&self, path: &str, destination: &Path, on_progress: F) -> TransferOutcome
    where
        F: FnMut(u64, u64) -> bool,
    {
        match self.resolve(path).and_then(|node| node.handle) {
            Some(handle) => mirror_tree(self.provider().as_ref(), &handle, destination, on_progress),
            None => TransferOutcome::Failed(TransferError::NotFound {
                path: path.to_string(),
            }),
        }
    }
}
