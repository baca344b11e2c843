//! Zip extraction into local storage.

use super::progress::{ProgressTracker, TransferOutcome};
use crate::error::TransferError;
use std::fs::{self, File};
use std::io::{self, Read, Seek};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};
use zip::ZipArchive;

/// Extract the archive read from `source` into `destination`.
///
/// The entry count is taken up front so every progress call carries the same
/// total. The callback runs before each entry; when it returns `true` the
/// extraction stops and already extracted files stay in place. An entry that
/// would land outside `destination` aborts the whole operation with
/// `TransferError::PathTraversal`.
pub fn extract<R, F>(source: R, destination: &Path, on_progress: F) -> TransferOutcome
where
    R: Read + Seek,
    F: FnMut(u64, u64) -> bool,
{
    let outcome: TransferOutcome = run_extract(source, destination, on_progress).into();
    if let Some(e) = outcome.error() {
        warn!("Extraction into {} failed: {}", destination.display(), e);
    }
    outcome
}

/// Extract a zip file from local storage.
pub fn extract_file<F>(archive: &Path, destination: &Path, on_progress: F) -> TransferOutcome
where
    F: FnMut(u64, u64) -> bool,
{
    match File::open(archive) {
        Ok(file) => extract(file, destination, on_progress),
        Err(e) => TransferOutcome::Failed(TransferError::io(archive, e)),
    }
}

fn run_extract<R, F>(
    source: R,
    destination: &Path,
    on_progress: F,
) -> Result<TransferOutcome, TransferError>
where
    R: Read + Seek,
    F: FnMut(u64, u64) -> bool,
{
    ensure_directory(destination)?;
    let root = dunce::canonicalize(destination).map_err(|e| TransferError::io(destination, e))?;

    let mut archive = ZipArchive::new(source)?;
    let total = archive.len() as u64;
    let mut tracker = ProgressTracker::new(total, on_progress);

    for index in 0..archive.len() {
        if tracker.should_cancel() {
            info!(
                "Extraction into {} cancelled after {} of {} entries",
                root.display(),
                tracker.progress().completed,
                total
            );
            return Ok(TransferOutcome::Cancelled);
        }

        let mut entry = archive.by_index(index)?;
        let name = entry.name().to_string();
        let target = contained_path(&root, &name)
            .ok_or_else(|| TransferError::PathTraversal { entry: name.clone() })?;

        if entry.is_dir() {
            ensure_directory(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                ensure_directory(parent)?;
            }
            if target.is_dir() {
                return Err(TransferError::TypeMismatch {
                    path: target,
                    expected: "file",
                });
            }
            let mut out = File::create(&target).map_err(|e| TransferError::io(&target, e))?;
            io::copy(&mut entry, &mut out).map_err(|e| TransferError::io(&target, e))?;
        }
        debug!("Extracted {}", name);
        tracker.advance();
    }

    info!("Extracted {} entries into {}", total, root.display());
    Ok(TransferOutcome::Completed)
}

/// Create `path` as a directory, failing if something else is in the way.
pub(crate) fn ensure_directory(path: &Path) -> Result<(), TransferError> {
    if path.exists() && !path.is_dir() {
        return Err(TransferError::TypeMismatch {
            path: path.to_path_buf(),
            expected: "directory",
        });
    }
    fs::create_dir_all(path).map_err(|e| TransferError::io(path, e))
}

/// Where `entry_name` lands under the canonical directory `root`, or `None`
/// when it would not stay strictly inside it.
///
/// Absolute names and names that climb above the root are rejected
/// lexically. The deepest part of the target that already exists is then
/// canonicalized, so a symlink planted inside the root cannot redirect the
/// write elsewhere.
pub(crate) fn contained_path(root: &Path, entry_name: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for component in Path::new(entry_name).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !relative.pop() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if relative.as_os_str().is_empty() {
        return None;
    }

    let candidate = root.join(&relative);
    let mut probe = candidate.as_path();
    loop {
        if fs::symlink_metadata(probe).is_ok() {
            let canonical = dunce::canonicalize(probe).ok()?;
            if !canonical.starts_with(root) {
                return None;
            }
            break;
        }
        probe = probe.parent()?;
    }
    Some(candidate)
}
